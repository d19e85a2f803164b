use std::ops::Range;

use tracing::debug;

use crate::problem::{ConstraintOp, LpProblem, ProblemError};
use crate::simplex::Tableau;

/// Column ranges of a built tableau, in tableau column space (RHS is column 0)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub decision: usize,
    pub slack: usize,
    pub artificial: usize,
}

impl ColumnLayout {
    pub fn decision(&self) -> Range<usize> {
        1..1 + self.decision
    }

    pub fn slack(&self) -> Range<usize> {
        let start = 1 + self.decision;
        start..start + self.slack
    }

    pub fn artificial(&self) -> Range<usize> {
        let start = 1 + self.decision + self.slack;
        start..start + self.artificial
    }

    /// Total column count including the RHS column
    pub fn width(&self) -> usize {
        1 + self.decision + self.slack + self.artificial
    }
}

/// A Big-M tableau together with the meaning of its columns
#[derive(Debug, Clone)]
pub struct BigMTableau {
    pub tableau: Tableau,
    pub layout: ColumnLayout,
    /// Column captions: `Z`, the variable names, `s1..`, `a1..`
    pub headers: Vec<String>,
}

/// Turns an [`LpProblem`] into an initial Big-M simplex tableau.
///
/// Every `<=` and `>=` constraint gets a slack (surplus) column, every `>=`
/// and `=` constraint an artificial column. The objective row holds
/// minimisation costs, so a maximisation objective is negated, and each
/// artificial row is subtracted `M` times so the artificial columns start
/// with zero reduced cost.
#[derive(Debug, Clone)]
pub struct BigMBuilder {
    big_m: f64,
}

impl Default for BigMBuilder {
    fn default() -> Self {
        Self {
            big_m: Self::DEFAULT_BIG_M,
        }
    }
}

impl BigMBuilder {
    pub const DEFAULT_BIG_M: f64 = 1e4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn build(&self, problem: &LpProblem) -> Result<BigMTableau, ProblemError> {
        problem.validate()?;
        if !(self.big_m.is_finite() && self.big_m > 0.0) {
            return Err(ProblemError::InvalidBigM(self.big_m));
        }

        let constraints: Vec<_> = problem.constraints.iter().map(|c| c.normalized()).collect();
        let layout = ColumnLayout {
            decision: problem.num_variables(),
            slack: constraints.iter().filter(|c| c.op.needs_slack()).count(),
            artificial: constraints.iter().filter(|c| c.op.needs_artificial()).count(),
        };
        let width = layout.width();

        let mut rows = vec![vec![0.0; width]; constraints.len() + 1];
        let mut headers = vec!["Z".to_string()];
        headers.extend(problem.variables.iter().cloned());

        let mut slack_col = layout.slack().start;
        let mut artificial_col = layout.artificial().start;
        let mut artificial_rows = Vec::new();

        for (i, c) in constraints.iter().enumerate() {
            let row = &mut rows[i + 1];
            row[0] = c.rhs;
            row[1..=layout.decision].copy_from_slice(&c.coefficients);

            if c.op.needs_slack() {
                row[slack_col] = match c.op {
                    ConstraintOp::Ge => -1.0,
                    _ => 1.0,
                };
                headers.push(format!("s{}", slack_col - layout.decision));
                slack_col += 1;
            }
            if c.op.needs_artificial() {
                row[artificial_col] = 1.0;
                artificial_rows.push(i + 1);
                artificial_col += 1;
            }
        }
        headers.extend((1..=layout.artificial).map(|k| format!("a{}", k)));

        let sign = if problem.objective.minimize { 1.0 } else { -1.0 };
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            rows[0][j + 1] = sign * coef;
        }

        // Penalise artificials: c_j - M * (sum of artificial rows) outside the artificial block
        let artificial_start = layout.artificial().start;
        for j in 0..artificial_start {
            let column_sum: f64 = artificial_rows.iter().map(|&r| rows[r][j]).sum();
            rows[0][j] -= self.big_m * column_sum;
        }

        debug!(
            rows = rows.len(),
            columns = width,
            artificial = layout.artificial,
            "built Big-M tableau"
        );

        let tableau = Tableau::new(rows).map_err(|e| ProblemError::NonFinite(e.to_string()))?;
        Ok(BigMTableau {
            tableau,
            layout,
            headers,
        })
    }
}
