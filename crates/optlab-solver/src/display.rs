//! Plain-text grids for tableaus and transport plans.

use std::fmt;

use crate::simplex::Tableau;
use crate::transport::Allocation;

const CELL_WIDTH: usize = 10;

fn rounded(value: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0
    (value * 1e4).round() / 1e4 + 0.0
}

fn border(f: &mut fmt::Formatter<'_>, cells: usize) -> fmt::Result {
    write!(f, "+")?;
    for _ in 0..cells {
        write!(f, "{}+", "-".repeat(CELL_WIDTH + 2))?;
    }
    writeln!(f)
}

fn line<I, T>(f: &mut fmt::Formatter<'_>, cells: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    write!(f, "|")?;
    for cell in cells {
        write!(f, " {:<width$} |", cell.to_string(), width = CELL_WIDTH)?;
    }
    writeln!(f)
}

/// Renders a tableau with one caption per column
pub struct TableauDisplay<'a> {
    tableau: &'a Tableau,
    headers: Vec<String>,
}

impl<'a> TableauDisplay<'a> {
    /// Captions default to `Z`, `x1`, `x2`, ...
    pub fn new(tableau: &'a Tableau) -> Self {
        let headers = std::iter::once("Z".to_string())
            .chain((1..tableau.num_columns()).map(|j| format!("x{}", j)))
            .collect();
        Self { tableau, headers }
    }

    /// Missing captions are left blank, extra ones are ignored.
    pub fn with_headers(mut self, headers: &[String]) -> Self {
        self.headers = (0..self.tableau.num_columns())
            .map(|j| headers.get(j).cloned().unwrap_or_default())
            .collect();
        self
    }
}

impl fmt::Display for TableauDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.tableau.num_columns();
        border(f, cells)?;
        line(f, &self.headers)?;
        border(f, cells)?;
        for row in self.tableau.rows() {
            line(f, row.iter().map(|&v| rounded(v)))?;
            border(f, cells)?;
        }
        Ok(())
    }
}

/// Renders a transport plan with `D1..Dn` destination captions
pub struct AllocationDisplay<'a> {
    allocation: &'a Allocation,
}

impl<'a> AllocationDisplay<'a> {
    pub fn new(allocation: &'a Allocation) -> Self {
        Self { allocation }
    }
}

impl fmt::Display for AllocationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.allocation.num_destinations();
        border(f, columns + 1)?;
        line(
            f,
            std::iter::once(String::new()).chain((1..=columns).map(|j| format!("D{}", j))),
        )?;
        border(f, columns + 1)?;
        for (i, row) in self.allocation.amounts().iter().enumerate() {
            line(
                f,
                std::iter::once(format!("S{}", i + 1)).chain(row.iter().map(|&v| rounded(v).to_string())),
            )?;
            border(f, columns + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tableau_grid() {
        let tableau = Tableau::new(vec![vec![-0.0, 1.23456], vec![2.0, 1.0]]).unwrap();
        let headers = vec!["Z".to_string(), "x1".to_string()];
        let text = TableauDisplay::new(&tableau).with_headers(&headers).to_string();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "+------------+------------+");
        assert_eq!(lines[1], "| Z          | x1         |");
        assert_eq!(lines[3], "| 0          | 1.2346     |");
        assert_eq!(lines[5], "| 2          | 1          |");
    }

    #[test]
    fn test_default_headers() {
        let tableau = Tableau::new(vec![vec![0.0, 1.0, 2.0]]).unwrap();
        let text = TableauDisplay::new(&tableau).to_string();
        assert!(text.contains("| Z          | x1         | x2         |"), "{}", text);
    }
}
