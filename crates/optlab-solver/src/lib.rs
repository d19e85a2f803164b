mod big_m;
mod display;
mod problem;
mod simplex;
mod solution;
pub mod transport;

pub use big_m::{BigMBuilder, BigMTableau, ColumnLayout};
pub use display::{AllocationDisplay, TableauDisplay};
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ProblemError};
pub use simplex::{
    Iteration, Pivot, PivotRule, SimplexError, SimplexFailure, SimplexSolution, SimplexStatus, Solver, Tableau,
};
pub use solution::{Solution, SolutionStatus};
pub use transport::{Allocation, Cell, TransportError, TransportProblem, TransportSolution, TransportSolver};
