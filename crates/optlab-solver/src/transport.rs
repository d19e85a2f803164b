//! Balanced transportation problem: northwest-corner start, then the
//! potentials (MODI) method with stepping-stone cycles until no cell improves.

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport problem needs at least one source and one destination")]
    Empty,
    #[error("Cost matrix row {row} has {found} entries, expected {expected}")]
    RaggedCosts { row: usize, expected: usize, found: usize },
    #[error("Cost matrix has {found} rows, expected {expected} (one per source)")]
    CostRows { expected: usize, found: usize },
    #[error("Invalid quantity {value} in {context}")]
    InvalidQuantity { value: f64, context: String },
    #[error("Unbalanced problem: total supply {supply} != total demand {demand}")]
    Unbalanced { supply: f64, demand: f64 },
    #[error("Basis does not connect every source and destination")]
    DegenerateBasis,
    #[error("No stepping-stone cycle through cell ({row}, {column})")]
    NoCycle { row: usize, column: usize },
    #[error("No optimal plan after {0} iterations")]
    IterationLimit(usize),
}

/// One cell of the plan: source `row`, destination `column`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
}

impl Cell {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TransportProblem {
    /// Unit shipping cost, one row per source
    pub costs: Vec<Vec<f64>>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
}

impl TransportProblem {
    pub fn new(costs: Vec<Vec<f64>>, supply: Vec<f64>, demand: Vec<f64>) -> Self {
        Self { costs, supply, demand }
    }

    pub fn num_sources(&self) -> usize {
        self.supply.len()
    }

    pub fn num_destinations(&self) -> usize {
        self.demand.len()
    }

    pub fn validate(&self, tolerance: f64) -> Result<(), TransportError> {
        let (m, n) = (self.num_sources(), self.num_destinations());
        if m == 0 || n == 0 {
            return Err(TransportError::Empty);
        }
        if self.costs.len() != m {
            return Err(TransportError::CostRows {
                expected: m,
                found: self.costs.len(),
            });
        }
        for (row, costs) in self.costs.iter().enumerate() {
            if costs.len() != n {
                return Err(TransportError::RaggedCosts {
                    row,
                    expected: n,
                    found: costs.len(),
                });
            }
            if let Some(&value) = costs.iter().find(|c| !c.is_finite()) {
                return Err(TransportError::InvalidQuantity {
                    value,
                    context: format!("costs row {}", row),
                });
            }
        }
        for (name, quantities) in [("supply", &self.supply), ("demand", &self.demand)] {
            if let Some(&value) = quantities.iter().find(|q| !q.is_finite() || **q < 0.0) {
                return Err(TransportError::InvalidQuantity {
                    value,
                    context: name.to_string(),
                });
            }
        }

        let supply: f64 = self.supply.iter().sum();
        let demand: f64 = self.demand.iter().sum();
        if (supply - demand).abs() > tolerance * supply.max(demand).max(1.0) {
            return Err(TransportError::Unbalanced { supply, demand });
        }
        Ok(())
    }
}

/// A shipping plan and the set of basic cells that produced it
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    amounts: Vec<Vec<f64>>,
    basis: Vec<Vec<bool>>,
}

impl Allocation {
    fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            amounts: vec![vec![0.0; columns]; rows],
            basis: vec![vec![false; columns]; rows],
        }
    }

    pub fn amounts(&self) -> &[Vec<f64>] {
        &self.amounts
    }

    /// # Panics
    /// Panics if `cell` lies outside the plan.
    pub fn get(&self, cell: Cell) -> f64 {
        self.amounts[cell.row][cell.column]
    }

    pub fn is_basic(&self, cell: Cell) -> bool {
        self.basis[cell.row][cell.column]
    }

    pub fn num_sources(&self) -> usize {
        self.amounts.len()
    }

    pub fn num_destinations(&self) -> usize {
        self.amounts.first().map_or(0, |r| r.len())
    }

    /// Basic cells in row-major order
    pub fn basic_cells(&self) -> Vec<Cell> {
        self.basis
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, basic)| **basic)
                    .map(move |(j, _)| Cell::new(i, j))
            })
            .collect()
    }

    pub fn total_cost(&self, costs: &[Vec<f64>]) -> f64 {
        self.amounts
            .iter()
            .zip(costs)
            .flat_map(|(amounts, costs)| amounts.iter().zip(costs).map(|(a, c)| a * c))
            .sum()
    }
}

/// Initial plan by the northwest-corner rule.
///
/// Every visited cell becomes basic, including zero shipments forced when a
/// source and a destination run out at the same time. The walk only moves
/// right along the last row and only down the last column, so it always ends
/// on the bottom-right cell with `m + n - 1` basic cells.
pub fn northwest_corner(supply: &[f64], demand: &[f64]) -> Allocation {
    let (rows, columns) = (supply.len(), demand.len());
    let mut allocation = Allocation::zeros(rows, columns);
    let mut supply = supply.to_vec();
    let mut demand = demand.to_vec();

    let (mut i, mut j) = (0, 0);
    while i < rows && j < columns {
        let amount = supply[i].min(demand[j]);
        allocation.amounts[i][j] = amount;
        allocation.basis[i][j] = true;
        supply[i] -= amount;
        demand[j] -= amount;

        if i + 1 == rows {
            j += 1;
        } else if j + 1 == columns || supply[i] == 0.0 {
            i += 1;
        } else {
            j += 1;
        }
    }
    allocation
}

/// Dual potentials with `u[0] = 0` and `u[i] + v[j] = c[i][j]` on every basic cell
///
/// # Panics
/// Panics if `costs` is smaller than the allocation.
pub fn potentials(costs: &[Vec<f64>], allocation: &Allocation) -> Result<(Vec<f64>, Vec<f64>), TransportError> {
    if allocation.num_sources() == 0 || allocation.num_destinations() == 0 {
        return Err(TransportError::Empty);
    }
    let mut u: Vec<Option<f64>> = vec![None; allocation.num_sources()];
    let mut v: Vec<Option<f64>> = vec![None; allocation.num_destinations()];
    u[0] = Some(0.0);

    let cells = allocation.basic_cells();
    let mut changed = true;
    while changed {
        changed = false;
        for cell in &cells {
            let cost = costs[cell.row][cell.column];
            match (u[cell.row], v[cell.column]) {
                (Some(ui), None) => {
                    v[cell.column] = Some(cost - ui);
                    changed = true;
                }
                (None, Some(vj)) => {
                    u[cell.row] = Some(cost - vj);
                    changed = true;
                }
                _ => {}
            }
        }
    }

    let u: Option<Vec<f64>> = u.into_iter().collect();
    let v: Option<Vec<f64>> = v.into_iter().collect();
    match (u, v) {
        (Some(u), Some(v)) => Ok((u, v)),
        _ => Err(TransportError::DegenerateBasis),
    }
}

/// Non-basic cell with the largest positive `u[i] + v[j] - c[i][j]`
///
/// # Panics
/// Panics if `u` or `v` is shorter than the cost matrix.
pub fn entering_cell(costs: &[Vec<f64>], allocation: &Allocation, u: &[f64], v: &[f64], tolerance: f64) -> Option<Cell> {
    let mut best: Option<(Cell, f64)> = None;
    for (i, row) in costs.iter().enumerate() {
        for (j, &cost) in row.iter().enumerate() {
            let cell = Cell::new(i, j);
            if allocation.is_basic(cell) {
                continue;
            }
            let delta = u[i] + v[j] - cost;
            if delta > tolerance && best.is_none_or(|(_, d)| delta > d) {
                best = Some((cell, delta));
            }
        }
    }
    best.map(|(cell, _)| cell)
}

/// Closed stepping-stone path starting at `entering`.
///
/// The returned cells alternate row and column moves; even positions receive
/// the shipment, odd positions give it up.
pub fn find_cycle(allocation: &Allocation, entering: Cell) -> Result<Vec<Cell>, TransportError> {
    let no_cycle = TransportError::NoCycle {
        row: entering.row,
        column: entering.column,
    };

    let mut cells = allocation.basic_cells();
    cells.push(entering);

    // A cell alone in its row or column cannot lie on a cycle
    loop {
        let mut row_count = vec![0usize; allocation.num_sources()];
        let mut column_count = vec![0usize; allocation.num_destinations()];
        for cell in &cells {
            row_count[cell.row] += 1;
            column_count[cell.column] += 1;
        }
        let before = cells.len();
        cells.retain(|c| row_count[c.row] >= 2 && column_count[c.column] >= 2);
        if cells.len() == before {
            break;
        }
    }
    if !cells.contains(&entering) {
        return Err(no_cycle);
    }

    let mut path = vec![entering];
    let mut current = entering;
    let mut along_row = true;
    loop {
        let next = cells
            .iter()
            .copied()
            .find(|c| *c != current && if along_row { c.row == current.row } else { c.column == current.column });
        match next {
            Some(cell) if cell == entering => break,
            Some(cell) => {
                if path.len() > cells.len() {
                    return Err(no_cycle);
                }
                path.push(cell);
                current = cell;
                along_row = !along_row;
            }
            None => return Err(no_cycle),
        }
    }

    if path.len() < 4 || path.len() % 2 != 0 {
        return Err(no_cycle);
    }
    Ok(path)
}

/// Shift the largest feasible amount around `cycle`; returns the cell that left the basis.
fn adjust(allocation: &mut Allocation, cycle: &[Cell]) -> Cell {
    let (leaving, theta) = cycle
        .iter()
        .skip(1)
        .step_by(2)
        .map(|&c| (c, allocation.get(c)))
        .fold(None, |best: Option<(Cell, f64)>, (c, amount)| match best {
            Some((_, b)) if b <= amount => best,
            _ => Some((c, amount)),
        })
        .unwrap_or((cycle[0], 0.0));

    for (k, cell) in cycle.iter().enumerate() {
        let amount = &mut allocation.amounts[cell.row][cell.column];
        if k % 2 == 0 {
            *amount += theta;
        } else {
            *amount -= theta;
        }
    }

    allocation.amounts[leaving.row][leaving.column] = 0.0;
    allocation.basis[leaving.row][leaving.column] = false;
    allocation.basis[cycle[0].row][cycle[0].column] = true;
    leaving
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TransportSolution {
    /// Northwest-corner plan
    pub initial: Allocation,
    pub initial_cost: f64,
    /// Optimal plan
    pub allocation: Allocation,
    pub cost: f64,
    /// Improvement steps taken
    pub iterations: usize,
}

pub struct TransportSolver {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for TransportSolver {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-9,
        }
    }
}

impl TransportSolver {
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

    pub fn solve(&self, problem: &TransportProblem) -> Result<TransportSolution, TransportError> {
        problem.validate(self.tolerance)?;

        let initial = northwest_corner(&problem.supply, &problem.demand);
        let initial_cost = initial.total_cost(&problem.costs);
        debug!(cost = initial_cost, "northwest corner plan");

        let mut allocation = initial.clone();
        let mut iterations = 0;
        loop {
            let (u, v) = potentials(&problem.costs, &allocation)?;
            let Some(entering) = entering_cell(&problem.costs, &allocation, &u, &v, self.tolerance) else {
                break;
            };
            if iterations >= self.max_iterations {
                warn!(limit = self.max_iterations, "transport iteration limit reached");
                return Err(TransportError::IterationLimit(self.max_iterations));
            }

            let cycle = find_cycle(&allocation, entering)?;
            let leaving = adjust(&mut allocation, &cycle);
            iterations += 1;
            debug!(
                iteration = iterations,
                entering = ?entering,
                leaving = ?leaving,
                cost = allocation.total_cost(&problem.costs),
                "stepping-stone move"
            );
        }

        let cost = allocation.total_cost(&problem.costs);
        Ok(TransportSolution {
            initial,
            initial_cost,
            allocation,
            cost,
            iterations,
        })
    }
}
