//! One-dimensional minimization of a unimodal function.
//!
//! Bracketing methods work on an interval `[a, b]`; Newton's method starts
//! from a single point and needs the first two derivatives.

use tracing::debug;

use crate::error::{SearchError, SearchResult};

/// Below this magnitude a second derivative or slope difference counts as zero
const SINGULAR_THRESHOLD: f64 = 1e-14;

/// Options for scalar minimization.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ScalarOptions {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Interval width (or step length) at which to stop
    pub tol: f64,
}

impl Default for ScalarOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

impl ScalarOptions {
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn check(&self, context: &'static str) -> SearchResult<()> {
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(SearchError::InvalidParameter {
                parameter: "tol",
                message: format!("{} needs a positive tolerance, got {}", context, self.tol),
            });
        }
        Ok(())
    }
}

/// Result from a scalar minimization method.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ScalarMinimum {
    /// The minimum point found
    pub x: f64,
    /// Function value at minimum
    pub f_min: f64,
    /// Number of iterations used
    pub iterations: usize,
    /// Successive estimates of the minimizer
    pub trajectory: Vec<f64>,
}

fn check_interval(a: f64, b: f64, context: &'static str) -> SearchResult<()> {
    if a.is_finite() && b.is_finite() && a < b {
        Ok(())
    } else {
        Err(SearchError::InvalidInterval { a, b, context })
    }
}

/// Golden-section search on `[a, b]`.
///
/// Each iteration keeps the sub-interval around the smaller of the two
/// interior values and reuses the surviving interior point, so `f` is
/// evaluated once per iteration. The trajectory holds interval midpoints.
///
/// # Errors
/// * `InvalidInterval` if a >= b
/// * `DidNotConverge` if iterations exceed max_iter
pub fn golden_section<F>(f: F, a: f64, b: f64, options: &ScalarOptions) -> SearchResult<ScalarMinimum>
where
    F: Fn(f64) -> f64,
{
    check_interval(a, b, "golden_section")?;
    options.check("golden_section")?;

    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    let (mut a, mut b) = (a, b);
    let mut x1 = b - (b - a) / phi;
    let mut x2 = a + (b - a) / phi;
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    let mut trajectory = Vec::new();

    for iter in 0..options.max_iter {
        if (b - a).abs() <= options.tol {
            let x = 0.5 * (a + b);
            debug!(x, iterations = iter, "golden section converged");
            return Ok(ScalarMinimum {
                x,
                f_min: f(x),
                iterations: iter,
                trajectory,
            });
        }

        if f1 < f2 {
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = b - (b - a) / phi;
            f1 = f(x1);
        } else {
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = a + (b - a) / phi;
            f2 = f(x2);
        }
        trajectory.push(0.5 * (a + b));
    }

    Err(SearchError::DidNotConverge {
        iterations: options.max_iter,
        tolerance: options.tol,
        context: "golden_section",
    })
}

/// Tangent-intersection method on `[a, b]`.
///
/// The next estimate is where the tangents at both end points cross. The
/// end point on the same side of the minimum as that estimate (judged by the
/// sign of `df`) moves there. Stops when the interval or the slope at the
/// estimate drops below the tolerance.
///
/// # Errors
/// * `InvalidInterval` if a >= b
/// * `ParallelTangents` if `df(a) == df(b)`
/// * `DidNotConverge` if iterations exceed max_iter
pub fn tangent_intersection<F, DF>(f: F, df: DF, a: f64, b: f64, options: &ScalarOptions) -> SearchResult<ScalarMinimum>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    check_interval(a, b, "tangent_intersection")?;
    options.check("tangent_intersection")?;

    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));
    let (mut da, mut db) = (df(a), df(b));
    let mut trajectory = Vec::new();

    for iter in 0..options.max_iter {
        let slope_gap = da - db;
        if slope_gap.abs() < SINGULAR_THRESHOLD {
            return Err(SearchError::ParallelTangents { a, b });
        }

        let x = (a * da - b * db - fa + fb) / slope_gap;
        let (fx, dx) = (f(x), df(x));
        trajectory.push(x);

        if dx > 0.0 {
            b = x;
            fb = fx;
            db = dx;
        } else {
            a = x;
            fa = fx;
            da = dx;
        }

        if (b - a).abs() <= options.tol || dx.abs() <= options.tol {
            debug!(x, iterations = iter + 1, "tangent intersection converged");
            return Ok(ScalarMinimum {
                x,
                f_min: fx,
                iterations: iter + 1,
                trajectory,
            });
        }
    }

    Err(SearchError::DidNotConverge {
        iterations: options.max_iter,
        tolerance: options.tol,
        context: "tangent_intersection",
    })
}

/// Newton's method for a stationary point: `x <- x - f'(x) / f''(x)`.
///
/// Converges quadratically near a minimum with positive curvature but may
/// wander off from a poor starting point.
///
/// # Errors
/// * `ZeroCurvature` if the second derivative vanishes
/// * `DidNotConverge` if iterations exceed max_iter
pub fn newton<F, DF, D2F>(f: F, df: DF, d2f: D2F, x0: f64, options: &ScalarOptions) -> SearchResult<ScalarMinimum>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
    D2F: Fn(f64) -> f64,
{
    options.check("newton")?;

    let mut x = x0;
    let mut trajectory = vec![x0];

    for iter in 0..options.max_iter {
        let curvature = d2f(x);
        if curvature.abs() < SINGULAR_THRESHOLD {
            return Err(SearchError::ZeroCurvature { x });
        }

        let x_new = x - df(x) / curvature;
        trajectory.push(x_new);

        if (x_new - x).abs() < options.tol {
            debug!(x = x_new, iterations = iter + 1, "newton converged");
            return Ok(ScalarMinimum {
                x: x_new,
                f_min: f(x_new),
                iterations: iter + 1,
                trajectory,
            });
        }

        x = x_new;
    }

    Err(SearchError::DidNotConverge {
        iterations: options.max_iter,
        tolerance: options.tol,
        context: "newton",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // f(x) = e^x + 1/x has its minimum where e^x = 1/x^2
    const X_MIN: f64 = 0.703467422498391;

    fn f(x: f64) -> f64 {
        x.exp() + 1.0 / x
    }

    fn df(x: f64) -> f64 {
        x.exp() - 1.0 / (x * x)
    }

    fn d2f(x: f64) -> f64 {
        x.exp() + 2.0 / (x * x * x)
    }

    #[test]
    fn test_golden_section() {
        let result = golden_section(f, 0.1, 1.0, &ScalarOptions::default()).unwrap();
        assert!((result.x - X_MIN).abs() < 1e-5, "x = {}", result.x);
        assert!((result.f_min - f(X_MIN)).abs() < 1e-9);
        assert_eq!(result.trajectory.len(), result.iterations);
        assert!(result.iterations > 20 && result.iterations < 40, "iterations = {}", result.iterations);
    }

    #[test]
    fn test_tangent_intersection() {
        let result = tangent_intersection(f, df, 0.1, 1.0, &ScalarOptions::default()).unwrap();
        assert!((result.x - X_MIN).abs() < 1e-5, "x = {}", result.x);
        assert_eq!(result.trajectory.len(), result.iterations);
    }

    #[test]
    fn test_newton() {
        let result = newton(f, df, d2f, 0.5, &ScalarOptions::default()).unwrap();
        assert!((result.x - X_MIN).abs() < 1e-9, "x = {}", result.x);
        assert!(result.iterations < 10, "iterations = {}", result.iterations);
        assert_eq!(result.trajectory[0], 0.5);
    }

    #[test]
    fn test_newton_zero_curvature() {
        let err = newton(|x| x, |_| 1.0, |_| 0.0, 2.0, &ScalarOptions::default()).unwrap_err();
        assert_eq!(err, SearchError::ZeroCurvature { x: 2.0 });
    }

    #[test]
    fn test_invalid_interval() {
        let err = golden_section(f, 1.0, 0.1, &ScalarOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInterval { context: "golden_section", .. }));

        let err = tangent_intersection(f, df, 0.5, 0.5, &ScalarOptions::default()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInterval { .. }));
    }

    #[test]
    fn test_iteration_limit() {
        let options = ScalarOptions::default().with_max_iter(3);
        let err = golden_section(f, 0.1, 1.0, &options).unwrap_err();
        assert!(matches!(err, SearchError::DidNotConverge { iterations: 3, .. }));
    }

    #[test]
    fn test_parallel_tangents() {
        // A linear function has the same slope everywhere
        let err = tangent_intersection(|x| 2.0 * x, |_| 2.0, 0.0, 1.0, &ScalarOptions::default()).unwrap_err();
        assert_eq!(err, SearchError::ParallelTangents { a: 0.0, b: 1.0 });
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let options = ScalarOptions::default().with_tol(0.0);
        assert!(matches!(
            newton(f, df, d2f, 0.5, &options),
            Err(SearchError::InvalidParameter { parameter: "tol", .. })
        ));
    }
}
