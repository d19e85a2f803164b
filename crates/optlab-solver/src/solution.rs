use crate::simplex::Pivot;

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each decision variable
    pub values: Vec<f64>,
    /// Optimal objective value, in the problem's own sense
    pub objective_value: f64,
    /// Number of pivots performed
    pub iterations: usize,
    /// Pivot log, oldest first
    pub pivots: Vec<Pivot>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error
    Error,
}

impl Solution {
    fn empty(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            iterations: 0,
            pivots: Vec::new(),
        }
    }

    pub fn infeasible() -> Self {
        Self::empty(SolutionStatus::Infeasible, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::empty(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn error() -> Self {
        Self::empty(SolutionStatus::Error, f64::NAN)
    }
}
