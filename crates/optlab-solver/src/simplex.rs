use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::big_m::BigMBuilder;
use crate::problem::LpProblem;
use crate::solution::{Solution, SolutionStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimplexError {
    #[error("Problem has no solution: every tableau entry is non-positive")]
    Unsolvable,
    #[error("Objective is unbounded: no constraint row has a positive entry in column {column}")]
    Unbounded { column: usize },
    #[error("Pivot element {value:e} at row {row}, column {column} is too close to zero")]
    DegeneratePivot { row: usize, column: usize, value: f64 },
    #[error("Pivot target ({row}, {column}) is not a constraint coefficient")]
    InvalidPivot { row: usize, column: usize },
    #[error("No optimum reached after {0} iterations")]
    IterationLimit(usize),
    #[error("Malformed tableau: {0}")]
    Malformed(String),
}

/// A failed run, with the state the loop stopped in.
#[derive(Error, Debug, Clone)]
#[error("{error} (after {} pivots)", .pivots.len())]
pub struct SimplexFailure {
    pub error: SimplexError,
    /// Tableau at the moment the run was aborted
    pub tableau: Tableau,
    /// Pivots applied before the failure, oldest first
    pub pivots: Vec<Pivot>,
}

/// Simplex tableau: row 0 is the objective row, column 0 holds right-hand sides.
///
/// Columns `1..` are variables in the caller's order (decision, slack,
/// artificial). A pivot never mutates a tableau; it produces the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    rows: Vec<Vec<f64>>,
    /// Column currently basic in each constraint row, when known
    basis: Vec<Option<usize>>,
}

impl Tableau {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, SimplexError> {
        let Some(first) = rows.first() else {
            return Err(SimplexError::Malformed("tableau has no rows".to_string()));
        };
        let width = first.len();
        if width < 2 {
            return Err(SimplexError::Malformed(format!(
                "tableau needs a right-hand side and at least one variable column, got {} columns",
                width
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(SimplexError::Malformed(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                width
            )));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SimplexError::Malformed("tableau contains a non-finite entry".to_string()));
        }

        let basis = detect_basis(&rows);
        Ok(Self { rows, basis })
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.rows[0].len()
    }

    /// Number of variable columns (everything but the right-hand side)
    pub fn num_variables(&self) -> usize {
        self.num_columns() - 1
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len() - 1
    }

    /// # Panics
    /// Panics if `row` or `column` is out of range.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.rows[row][column]
    }

    pub fn objective_row(&self) -> &[f64] {
        &self.rows[0]
    }

    /// Current objective-row right-hand side, `table[0][0]`
    pub fn objective_value(&self) -> f64 {
        self.rows[0][0]
    }

    /// # Panics
    /// Panics if `row` is out of range.
    pub fn rhs(&self, row: usize) -> f64 {
        self.rows[row][0]
    }

    /// Basic column of each constraint row; index 0 is tableau row 1.
    pub fn basis(&self) -> &[Option<usize>] {
        &self.basis
    }
}

/// A column is basic in a row when it is a unit column over the constraint
/// rows with a zero reduced cost.
fn detect_basis(rows: &[Vec<f64>]) -> Vec<Option<usize>> {
    let width = rows[0].len();
    let mut basis = vec![None; rows.len() - 1];
    for column in 1..width {
        if rows[0][column] != 0.0 {
            continue;
        }
        let mut unit_row = None;
        let mut is_unit = true;
        for (i, row) in rows.iter().enumerate().skip(1) {
            let v = row[column];
            if v == 1.0 && unit_row.is_none() {
                unit_row = Some(i);
            } else if v != 0.0 {
                is_unit = false;
                break;
            }
        }
        if let (true, Some(i)) = (is_unit, unit_row) {
            if basis[i - 1].is_none() {
                basis[i - 1] = Some(column);
            }
        }
    }
    basis
}

/// A (leading row, leading column) pair chosen for one iteration
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub row: usize,
    pub column: usize,
}

/// Entering/leaving selection strategy
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotRule {
    /// Most negative reduced cost; first occurrence wins every tie.
    #[default]
    Dantzig,
    /// Bland's smallest-index rule. Never cycles on degenerate problems.
    Bland,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    Iterating,
    Optimal,
    Unsolvable,
}

/// State handed to an observer once per loop step
#[derive(Debug, Clone, Copy)]
pub struct Iteration<'a> {
    /// Pivots applied so far
    pub index: usize,
    pub tableau: &'a Tableau,
    pub status: SimplexStatus,
}

/// Outcome of an optimal run over a raw tableau
#[derive(Debug, Clone)]
pub struct SimplexSolution {
    /// Final `table[0][0]`
    pub objective_value: f64,
    /// One value per decision variable
    pub values: Vec<f64>,
    pub iterations: usize,
    pub pivots: Vec<Pivot>,
    pub tableau: Tableau,
}

/// Big-M simplex solver
pub struct Solver {
    /// Maximum iterations before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    rule: PivotRule,
    /// Penalty used when building tableaus from an `LpProblem`
    big_m: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            rule: PivotRule::Dantzig,
            big_m: BigMBuilder::DEFAULT_BIG_M,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_rule(mut self, rule: PivotRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Build the Big-M tableau for `problem`, run it, and report in the problem's terms
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        self.solve_with(problem, |_| {})
    }

    /// Like [`Solver::solve`], calling `observer` with every intermediate tableau.
    pub fn solve_with<F>(&self, problem: &LpProblem, observer: F) -> Solution
    where
        F: FnMut(&Iteration<'_>),
    {
        let built = match BigMBuilder::new().with_big_m(self.big_m).build(problem) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "cannot build Big-M tableau");
                return Solution::error();
            }
        };

        let run = match self.run_with(built.tableau, problem.num_variables(), observer) {
            Ok(run) => run,
            Err(failure) => {
                return match failure.error {
                    SimplexError::Unsolvable => Solution::infeasible(),
                    SimplexError::Unbounded { .. } => Solution::unbounded(),
                    _ => Solution::error(),
                };
            }
        };

        // An artificial variable still carrying weight means the penalty could not push it out
        let artificial = built.layout.artificial();
        let stuck_artificial = run.tableau.basis().iter().enumerate().any(|(i, basic)| {
            matches!(basic, Some(c) if artificial.contains(c)) && run.tableau.rhs(i + 1) > self.tolerance
        });
        if stuck_artificial {
            debug!("artificial variable remains basic at optimum");
            return Solution::infeasible();
        }

        // Row 0 holds minimisation costs, so its RHS is the negated minimum
        let objective_value = if problem.objective.minimize {
            -run.objective_value
        } else {
            run.objective_value
        };

        Solution {
            status: SolutionStatus::Optimal,
            values: basic_values(&run.tableau, problem.num_variables()),
            objective_value,
            iterations: run.iterations,
            pivots: run.pivots,
        }
    }

    /// Iterate on `tableau` until it is optimal or no pivot can be made.
    ///
    /// The first `decision_variables` columns after the RHS are reported in
    /// the solution vector.
    pub fn run(&self, tableau: Tableau, decision_variables: usize) -> Result<SimplexSolution, SimplexFailure> {
        self.run_with(tableau, decision_variables, |_| {})
    }

    /// Like [`Solver::run`], calling `observer` with every intermediate tableau.
    pub fn run_with<F>(
        &self,
        tableau: Tableau,
        decision_variables: usize,
        mut observer: F,
    ) -> Result<SimplexSolution, SimplexFailure>
    where
        F: FnMut(&Iteration<'_>),
    {
        let mut tableau = tableau;
        let mut pivots: Vec<Pivot> = Vec::new();

        if decision_variables > tableau.num_variables() {
            let error = SimplexError::Malformed(format!(
                "{} decision variables requested but the tableau has {} variable columns",
                decision_variables,
                tableau.num_variables()
            ));
            return Err(SimplexFailure { error, tableau, pivots });
        }

        loop {
            let status = self.status(&tableau);
            observer(&Iteration {
                index: pivots.len(),
                tableau: &tableau,
                status,
            });

            match status {
                SimplexStatus::Optimal => break,
                SimplexStatus::Unsolvable => {
                    warn!(iterations = pivots.len(), "tableau is unsolvable");
                    return Err(SimplexFailure {
                        error: SimplexError::Unsolvable,
                        tableau,
                        pivots,
                    });
                }
                SimplexStatus::Iterating => {}
            }

            if pivots.len() >= self.max_iterations {
                warn!(limit = self.max_iterations, "simplex iteration limit reached");
                return Err(SimplexFailure {
                    error: SimplexError::IterationLimit(self.max_iterations),
                    tableau,
                    pivots,
                });
            }

            match self.pivot(&tableau) {
                Ok((next, pivot)) => {
                    debug!(
                        iteration = pivots.len() + 1,
                        row = pivot.row,
                        column = pivot.column,
                        objective = next.objective_value(),
                        "pivot"
                    );
                    trace!(rows = ?next.rows(), "tableau after pivot");
                    pivots.push(pivot);
                    tableau = next;
                }
                Err(error) => {
                    warn!(error = %error, "pivot failed");
                    return Err(SimplexFailure { error, tableau, pivots });
                }
            }
        }

        let values = reconcile(&tableau, &pivots, decision_variables);
        Ok(SimplexSolution {
            objective_value: tableau.objective_value(),
            values,
            iterations: pivots.len(),
            pivots,
            tableau,
        })
    }

    pub fn status(&self, tableau: &Tableau) -> SimplexStatus {
        if self.is_optimal(tableau) {
            SimplexStatus::Optimal
        } else if self.is_unsolvable(tableau) {
            SimplexStatus::Unsolvable
        } else {
            SimplexStatus::Iterating
        }
    }

    /// True when no reduced cost in the objective row is negative
    pub fn is_optimal(&self, tableau: &Tableau) -> bool {
        tableau.objective_row()[1..].iter().all(|&v| v >= -self.tolerance)
    }

    /// True when every entry of every row is non-positive
    pub fn is_unsolvable(&self, tableau: &Tableau) -> bool {
        tableau.rows().iter().flatten().all(|&v| v <= self.tolerance)
    }

    /// Entering column, in tableau column space (never 0)
    pub fn leading_column(&self, tableau: &Tableau) -> usize {
        let costs = &tableau.objective_row()[1..];

        if self.rule == PivotRule::Bland {
            if let Some(j) = costs.iter().position(|&v| v < -self.tolerance) {
                return j + 1;
            }
        }

        let mut min_col = 0;
        for (j, &v) in costs.iter().enumerate() {
            if v < costs[min_col] {
                min_col = j;
            }
        }
        min_col + 1
    }

    /// Leaving row for the current leading column, by minimum ratio
    pub fn leading_row(&self, tableau: &Tableau) -> Result<usize, SimplexError> {
        let column = self.leading_column(tableau);
        self.leading_row_for(tableau, column)
    }

    fn leading_row_for(&self, tableau: &Tableau, column: usize) -> Result<usize, SimplexError> {
        let ratios: Vec<Option<f64>> = tableau.rows()[1..]
            .iter()
            .map(|row| {
                let entry = row[column];
                (entry > self.tolerance).then(|| row[0] / entry)
            })
            .collect();

        let mut best: Option<(usize, f64)> = None;
        for (i, ratio) in ratios.iter().enumerate() {
            let Some(ratio) = *ratio else {
                continue;
            };
            let replace = match best {
                None => true,
                Some((best_i, best_ratio)) => match self.rule {
                    PivotRule::Dantzig => ratio < best_ratio,
                    PivotRule::Bland => {
                        if (ratio - best_ratio).abs() <= self.tolerance {
                            let rank = |row: usize| tableau.basis()[row].unwrap_or(usize::MAX);
                            rank(i) < rank(best_i)
                        } else {
                            ratio < best_ratio
                        }
                    }
                },
            };
            if replace {
                best = Some((i, ratio));
            }
        }

        best.map(|(i, _)| i + 1).ok_or(SimplexError::Unbounded { column })
    }

    /// Choose the leading pair and eliminate on it
    pub fn pivot(&self, tableau: &Tableau) -> Result<(Tableau, Pivot), SimplexError> {
        let column = self.leading_column(tableau);
        let row = self.leading_row_for(tableau, column)?;
        let next = self.pivot_on(tableau, row, column)?;
        Ok((next, Pivot { row, column }))
    }

    /// Gauss-Jordan elimination on an explicit target
    pub fn pivot_on(&self, tableau: &Tableau, row: usize, column: usize) -> Result<Tableau, SimplexError> {
        if row == 0 || row >= tableau.num_rows() || column == 0 || column >= tableau.num_columns() {
            return Err(SimplexError::InvalidPivot { row, column });
        }

        let pivot_value = tableau.get(row, column);
        if pivot_value.abs() <= self.tolerance {
            return Err(SimplexError::DegeneratePivot {
                row,
                column,
                value: pivot_value,
            });
        }

        let lead = &tableau.rows()[row];
        let rows = tableau
            .rows()
            .iter()
            .enumerate()
            .map(|(i, current)| {
                if i == row {
                    let mut scaled: Vec<f64> = lead.iter().map(|v| v / pivot_value).collect();
                    scaled[column] = 1.0;
                    scaled
                } else {
                    let factor = current[column];
                    current
                        .iter()
                        .zip(lead)
                        .enumerate()
                        .map(|(j, (&v, &l))| if j == column { 0.0 } else { v - (factor * l) / pivot_value })
                        .collect()
                }
            })
            .collect();

        let mut basis = tableau.basis.clone();
        basis[row - 1] = Some(column);
        Ok(Tableau { rows, basis })
    }
}

/// Recover decision-variable values from the pivot log.
///
/// Pivots are replayed oldest first, so a column that became basic more than
/// once takes the right-hand side of its most recent leading row.
fn reconcile(tableau: &Tableau, pivots: &[Pivot], decision_variables: usize) -> Vec<f64> {
    let mut values = vec![0.0; decision_variables];
    for pivot in pivots {
        if (1..=decision_variables).contains(&pivot.column) {
            values[pivot.column - 1] = tableau.rhs(pivot.row);
        }
    }
    values
}

/// Decision-variable values read off the final basis; non-basic columns are 0.
fn basic_values(tableau: &Tableau, decision_variables: usize) -> Vec<f64> {
    let mut values = vec![0.0; decision_variables];
    for (i, basic) in tableau.basis().iter().enumerate() {
        if let Some(column) = *basic {
            if (1..=decision_variables).contains(&column) {
                values[column - 1] = tableau.rhs(i + 1);
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, LpProblem};

    const EPS: f64 = 1e-9;

    fn reference_tableau() -> Tableau {
        Tableau::new(vec![
            vec![-20000.0, -30003.0, -39998.0, 0.0, 0.0, 10000.0, 0.0],
            vec![11.0, 2.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            vec![10.0, -3.0, 2.0, 0.0, 1.0, 0.0, 0.0],
            vec![20.0, 3.0, 4.0, 0.0, 0.0, -1.0, 1.0],
        ])
        .unwrap()
    }

    fn assert_unit_column(tableau: &Tableau, row: usize, column: usize) {
        for i in 0..tableau.num_rows() {
            let expected = if i == row { 1.0 } else { 0.0 };
            let actual = tableau.get(i, column);
            assert!(
                (actual - expected).abs() <= EPS,
                "entry ({}, {}) = {} (expected {})",
                i,
                column,
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_single_constraint() {
        let tableau = Tableau::new(vec![vec![0.0, -3.0, -4.0, 0.0], vec![10.0, 1.0, 1.0, 1.0]]).unwrap();
        let solver = Solver::new();

        assert_eq!(solver.leading_column(&tableau), 2);
        assert_eq!(solver.leading_row(&tableau), Ok(1));

        let (next, pivot) = solver.pivot(&tableau).unwrap();
        assert_eq!(pivot, Pivot { row: 1, column: 2 });
        assert_unit_column(&next, 1, 2);

        let run = solver.run(tableau, 2).unwrap();
        assert!(run.iterations <= 2, "took {} pivots", run.iterations);
        assert!(solver.is_optimal(&run.tableau));
        assert!((run.objective_value - 40.0).abs() < 1e-9);
        assert_eq!(run.values, vec![0.0, 10.0]);
    }

    #[test]
    fn test_reference_problem_converges() {
        let solver = Solver::new();
        let run = solver.run(reference_tableau(), 2).unwrap();

        println!("Pivots: {:?}", run.pivots);
        println!("Values: {:?}", run.values);

        assert!(run.iterations <= 10, "took {} iterations", run.iterations);
        assert!(solver.is_optimal(&run.tableau));
        assert!(run.tableau.objective_value() >= 0.0);
        assert_eq!(run.values.len(), 2);
        assert!((run.values[0] - 4.8).abs() < 1e-6, "x1 = {} (expected 4.8)", run.values[0]);
        assert!((run.values[1] - 1.4).abs() < 1e-6, "x2 = {} (expected 1.4)", run.values[1]);
        assert_eq!(
            run.pivots,
            vec![
                Pivot { row: 2, column: 2 },
                Pivot { row: 3, column: 1 },
                Pivot { row: 1, column: 4 },
            ]
        );
    }

    #[test]
    fn test_pivot_produces_unit_column() {
        let solver = Solver::new();
        let tableau = reference_tableau();

        for row in 1..tableau.num_rows() {
            for column in 1..tableau.num_columns() {
                if tableau.get(row, column).abs() <= EPS {
                    continue;
                }
                let next = solver.pivot_on(&tableau, row, column).unwrap();
                assert_unit_column(&next, row, column);
                assert_eq!(next.basis()[row - 1], Some(column));
            }
        }
    }

    #[test]
    fn test_objective_is_monotonic() {
        let solver = Solver::new();
        let mut objectives = Vec::new();
        solver
            .run_with(reference_tableau(), 2, |step| objectives.push(step.tableau.objective_value()))
            .unwrap();

        assert!(objectives.len() >= 2);
        for pair in objectives.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-6, "objective decreased: {:?}", objectives);
        }
    }

    #[test]
    fn test_optimal_tableau_has_non_negative_costs() {
        let solver = Solver::new();
        let run = solver.run(reference_tableau(), 2).unwrap();
        for &cost in &run.tableau.objective_row()[1..] {
            assert!(cost >= -EPS, "negative reduced cost {}", cost);
        }
    }

    #[test]
    fn test_terminal_checks_do_not_mutate() {
        let solver = Solver::new();
        let tableau = reference_tableau();
        let before = tableau.clone();

        let optimal = solver.is_optimal(&tableau);
        let unsolvable = solver.is_unsolvable(&tableau);
        assert_eq!(solver.is_optimal(&tableau), optimal);
        assert_eq!(solver.is_unsolvable(&tableau), unsolvable);
        assert_eq!(tableau, before);
    }

    #[test]
    fn test_unsolvable_stops_before_pivoting() {
        let tableau = Tableau::new(vec![vec![-1.0, -2.0, 0.0], vec![0.0, -1.0, -3.0]]).unwrap();
        let solver = Solver::new();
        assert!(!solver.is_optimal(&tableau));
        assert!(solver.is_unsolvable(&tableau));

        let mut steps = 0;
        let failure = solver.run_with(tableau.clone(), 1, |_| steps += 1).unwrap_err();
        assert_eq!(failure.error, SimplexError::Unsolvable);
        assert!(failure.pivots.is_empty());
        assert_eq!(failure.tableau, tableau);
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_ratio_tie_picks_first_row() {
        let tableau = Tableau::new(vec![
            vec![0.0, -1.0, 0.0, 0.0],
            vec![4.0, 2.0, 1.0, 0.0],
            vec![2.0, 1.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(Solver::new().leading_row(&tableau), Ok(1));
    }

    #[test]
    fn test_column_tie_picks_first_column() {
        let tableau = Tableau::new(vec![vec![0.0, -2.0, -2.0], vec![1.0, 1.0, 1.0]]).unwrap();
        assert_eq!(Solver::new().leading_column(&tableau), 1);
    }

    #[test]
    fn test_unbounded_column() {
        let tableau = Tableau::new(vec![vec![0.0, -1.0, 0.0], vec![1.0, -1.0, 1.0]]).unwrap();
        let solver = Solver::new();
        assert_eq!(solver.leading_row(&tableau), Err(SimplexError::Unbounded { column: 1 }));

        let failure = solver.run(tableau, 1).unwrap_err();
        assert_eq!(failure.error, SimplexError::Unbounded { column: 1 });
    }

    #[test]
    fn test_zero_pivot_is_rejected() {
        let solver = Solver::new();
        let tableau = reference_tableau();
        let err = solver.pivot_on(&tableau, 1, 4).unwrap_err();
        assert!(matches!(err, SimplexError::DegeneratePivot { row: 1, column: 4, .. }));
        assert_eq!(
            solver.pivot_on(&tableau, 0, 1).unwrap_err(),
            SimplexError::InvalidPivot { row: 0, column: 1 }
        );
    }

    #[test]
    fn test_malformed_tableau() {
        assert!(Tableau::new(vec![]).is_err());
        assert!(Tableau::new(vec![vec![1.0]]).is_err());
        assert!(Tableau::new(vec![vec![0.0, 1.0], vec![1.0]]).is_err());
        assert!(Tableau::new(vec![vec![0.0, f64::NAN]]).is_err());
    }

    #[test]
    fn test_basis_detection() {
        let tableau = reference_tableau();
        assert_eq!(tableau.basis(), &[Some(3), Some(4), Some(6)]);
    }

    #[test]
    fn test_latest_pivot_wins() {
        let tableau = Tableau::new(vec![
            vec![0.0, 0.0, 0.0],
            vec![5.0, 0.0, 1.0],
            vec![7.0, 1.0, 0.0],
        ])
        .unwrap();
        let pivots = [Pivot { row: 1, column: 1 }, Pivot { row: 2, column: 1 }];
        assert_eq!(reconcile(&tableau, &pivots, 1), vec![7.0]);

        let reversed = [Pivot { row: 2, column: 1 }, Pivot { row: 1, column: 1 }];
        assert_eq!(reconcile(&tableau, &reversed, 1), vec![5.0]);
    }

    #[test]
    fn test_iteration_limit() {
        let solver = Solver::new().with_max_iterations(1);
        let failure = solver.run(reference_tableau(), 2).unwrap_err();
        assert_eq!(failure.error, SimplexError::IterationLimit(1));
        assert_eq!(failure.pivots.len(), 1);
    }

    #[test]
    fn test_bland_rule_reaches_same_optimum() {
        let solver = Solver::new().with_rule(PivotRule::Bland);
        let run = solver.run(reference_tableau(), 2).unwrap();
        assert!(solver.is_optimal(&run.tableau));
        assert!((run.values[0] - 4.8).abs() < 1e-6, "x1 = {}", run.values[0]);
        assert!((run.values[1] - 1.4).abs() < 1e-6, "x2 = {}", run.values[1]);
    }

    // Beale's degenerate example, which cycles under the most-negative-cost rule
    fn cycling_tableau() -> Tableau {
        Tableau::new(vec![
            vec![0.0, -0.75, 20.0, -0.5, 6.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.25, -8.0, -1.0, 9.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.5, -12.0, -0.5, 3.0, 0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_bland_rule_escapes_cycling() {
        let dantzig = Solver::new().with_max_iterations(50);
        let failure = dantzig.run(cycling_tableau(), 4).unwrap_err();
        assert_eq!(failure.error, SimplexError::IterationLimit(50));
        // the sixth pivot restores the starting basis
        assert_eq!(failure.pivots[0], failure.pivots[6]);

        let bland = Solver::new().with_max_iterations(50).with_rule(PivotRule::Bland);
        let run = bland.run(cycling_tableau(), 4).unwrap();
        assert!(bland.is_optimal(&run.tableau));
        assert_eq!(run.iterations, 6);
        assert!((run.objective_value - 1.25).abs() < 1e-9, "obj = {}", run.objective_value);
    }

    #[test]
    fn test_basis_ignores_columns_with_cost() {
        let tableau = Tableau::new(vec![
            vec![0.0, -1.0, 0.0, 0.0],
            vec![4.0, 1.0, 1.0, 0.0],
            vec![6.0, 0.0, 2.0, 1.0],
        ])
        .unwrap();
        // column 1 is a unit column but carries a reduced cost
        assert_eq!(tableau.basis(), &[None, Some(3)]);
    }

    #[test]
    fn test_too_many_decision_variables() {
        let failure = Solver::new().run(reference_tableau(), 7).unwrap_err();
        assert!(matches!(failure.error, SimplexError::Malformed(_)));
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {} (expected 9)", solution.objective_value);
    }

    #[test]
    fn test_equality_constraint() {
        // Minimize x + 2y with x + y = 5, x <= 4: x=4, y=1, obj=6
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 2.0], true);
        problem.add_constraint("total", vec![1.0, 1.0], ConstraintOp::Eq, 5.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 4.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 4.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!((solution.objective_value - 6.0).abs() < 1e-6, "obj = {}", solution.objective_value);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_unbounded() {
        // Maximize x + y with x - y <= 1
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("spread", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_solve_reports_final_basis_values() {
        // x1 enters and later leaves the basis in favour of x3
        let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string(), "x3".to_string()]);
        problem.set_objective(vec![8.0, 2.0, 8.0], false);
        problem.add_constraint("c1", vec![5.0, 8.0, 4.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("c2", vec![2.0, 9.0, 5.0], ConstraintOp::Le, 27.0);
        problem.add_constraint("c3", vec![9.0, 3.0, 6.0], ConstraintOp::Le, 6.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(
            solution.pivots,
            vec![Pivot { row: 1, column: 1 }, Pivot { row: 1, column: 3 }]
        );
        let expected = [0.0, 0.0, 0.75];
        for (value, want) in solution.values.iter().zip(expected) {
            assert!((value - want).abs() < 1e-9, "values = {:?}", solution.values);
        }
        assert!((solution.objective_value - 6.0).abs() < 1e-9, "obj = {}", solution.objective_value);

        let recomputed: f64 = problem
            .objective
            .coefficients
            .iter()
            .zip(&solution.values)
            .map(|(c, x)| c * x)
            .sum();
        assert!((recomputed - solution.objective_value).abs() < 1e-9);
        for constraint in &problem.constraints {
            let lhs: f64 = constraint.coefficients.iter().zip(&solution.values).map(|(a, x)| a * x).sum();
            assert!(lhs <= constraint.rhs + 1e-9, "{} violated: {} > {}", constraint.name, lhs, constraint.rhs);
        }
    }

    #[test]
    fn test_solve_observes_every_step() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let mut statuses = Vec::new();
        let solution = Solver::new().solve_with(&problem, |step| statuses.push((step.index, step.status)));

        assert_eq!(solution.iterations + 1, statuses.len());
        assert_eq!(statuses.last(), Some(&(solution.iterations, SimplexStatus::Optimal)));
        assert!(statuses[..statuses.len() - 1]
            .iter()
            .all(|(_, s)| *s == SimplexStatus::Iterating));
    }

    #[test]
    fn test_invalid_problem_reports_error() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);

        assert_eq!(Solver::new().solve(&problem).status, SolutionStatus::Error);
    }
}
