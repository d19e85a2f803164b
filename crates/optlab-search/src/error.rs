use thiserror::Error;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("{context}: did not converge after {iterations} iterations (tolerance: {tolerance})")]
    DidNotConverge {
        iterations: usize,
        tolerance: f64,
        context: &'static str,
    },
    #[error("Invalid interval [{a}, {b}] in {context}: bounds must satisfy a < b")]
    InvalidInterval { a: f64, b: f64, context: &'static str },
    #[error("Second derivative is zero at x = {x}")]
    ZeroCurvature { x: f64 },
    #[error("Tangents at {a} and {b} are parallel")]
    ParallelTangents { a: f64, b: f64 },
    #[error("Invalid parameter {parameter}: {message}")]
    InvalidParameter { parameter: &'static str, message: String },
    #[error("Starting point is empty")]
    EmptyPoint,
    #[error("Gradient has {found} components, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Objective is not finite at {0:?}")]
    NonFinite(Vec<f64>),
}
