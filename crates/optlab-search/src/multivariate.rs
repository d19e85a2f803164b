//! Unconstrained minimization of `f: R^n -> R`.

use tracing::{debug, trace};

use crate::error::{SearchError, SearchResult};

/// Result from a multivariate minimization method.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct VectorMinimum {
    /// The minimum point found
    pub x: Vec<f64>,
    /// Function value at minimum
    pub f_min: f64,
    /// Number of iterations used
    pub iterations: usize,
    /// Accepted points, starting with `x0`
    pub trajectory: Vec<Vec<f64>>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct HookeJeevesOptions {
    /// Initial exploratory step
    pub step: f64,
    /// Factor applied to the step after a failed exploration
    pub shrink: f64,
    /// Pattern move length relative to the last improvement
    pub acceleration: f64,
    /// Stop once the step falls below this
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for HookeJeevesOptions {
    fn default() -> Self {
        Self {
            step: 0.5,
            shrink: 0.5,
            acceleration: 1.0,
            tol: 1e-6,
            max_iter: 10_000,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct GradientOptions {
    /// Initial step length; halved whenever a move fails to decrease `f`
    pub step: f64,
    /// Stop once a move changes `f` by less than this
    pub tol: f64,
    /// Move along the unit gradient direction instead of the raw gradient
    pub normalize: bool,
    pub max_iter: usize,
}

impl Default for GradientOptions {
    fn default() -> Self {
        Self {
            step: 0.5,
            tol: 1e-6,
            normalize: true,
            max_iter: 10_000,
        }
    }
}

fn positive(value: f64, parameter: &'static str) -> SearchResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SearchError::InvalidParameter {
            parameter,
            message: format!("must be positive, got {}", value),
        })
    }
}

fn evaluate<F>(f: &F, x: &[f64]) -> SearchResult<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SearchError::NonFinite(x.to_vec()))
    }
}

/// Probe `±step` along each coordinate in turn, keeping any improvement.
fn explore<F>(f: &F, point: &[f64], f_point: f64, step: f64) -> (Vec<f64>, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let mut x = point.to_vec();
    let mut fx = f_point;
    for i in 0..x.len() {
        let origin = x[i];
        for delta in [step, -step] {
            x[i] = origin + delta;
            let trial = f(&x);
            if trial < fx {
                fx = trial;
                break;
            }
            x[i] = origin;
        }
    }
    (x, fx)
}

/// Hooke-Jeeves pattern search.
///
/// After a successful exploration the search jumps ahead along the
/// improving direction (`x + acceleration * (x - base)`) and explores from
/// there. When exploration around a pattern point fails it falls back to the
/// base point; when exploration around the base fails the step shrinks.
///
/// # Errors
/// * `EmptyPoint` if `x0` is empty
/// * `InvalidParameter` for non-positive step, shrink outside (0, 1), or tol
/// * `NonFinite` if `f(x0)` is not finite
/// * `DidNotConverge` if iterations exceed max_iter
pub fn hooke_jeeves<F>(f: F, x0: &[f64], options: &HookeJeevesOptions) -> SearchResult<VectorMinimum>
where
    F: Fn(&[f64]) -> f64,
{
    if x0.is_empty() {
        return Err(SearchError::EmptyPoint);
    }
    positive(options.step, "step")?;
    positive(options.tol, "tol")?;
    positive(options.acceleration, "acceleration")?;
    if !(options.shrink > 0.0 && options.shrink < 1.0) {
        return Err(SearchError::InvalidParameter {
            parameter: "shrink",
            message: format!("must lie in (0, 1), got {}", options.shrink),
        });
    }

    let mut base = x0.to_vec();
    let mut f_base = evaluate(&f, &base)?;
    let mut probe = base.clone();
    let mut f_probe = f_base;
    let mut on_pattern = false;
    let mut step = options.step;
    let mut trajectory = vec![base.clone()];

    for iter in 0..options.max_iter {
        if step < options.tol {
            debug!(iterations = iter, f_min = f_base, "hooke-jeeves converged");
            return Ok(VectorMinimum {
                x: base,
                f_min: f_base,
                iterations: iter,
                trajectory,
            });
        }

        let (x, fx) = explore(&f, &probe, f_probe, step);
        if fx < f_base {
            probe = x
                .iter()
                .zip(&base)
                .map(|(xi, bi)| xi + options.acceleration * (xi - bi))
                .collect();
            f_probe = f(&probe);
            base = x;
            f_base = fx;
            on_pattern = true;
            trace!(x = ?base, f = f_base, step, "hooke-jeeves move");
            trajectory.push(base.clone());
        } else if on_pattern {
            probe = base.clone();
            f_probe = f_base;
            on_pattern = false;
        } else {
            step *= options.shrink;
        }
    }

    Err(SearchError::DidNotConverge {
        iterations: options.max_iter,
        tolerance: options.tol,
        context: "hooke_jeeves",
    })
}

/// Gradient descent with a constant step that halves on failure.
///
/// A move that does not lower `f` is rejected and the step is halved. The
/// search ends when a move changes `f` by less than `tol`, which includes
/// reaching a point where the gradient vanishes.
///
/// # Errors
/// * `EmptyPoint` if `x0` is empty
/// * `DimensionMismatch` if `grad` returns the wrong number of components
/// * `NonFinite` if `f(x0)` is not finite
/// * `DidNotConverge` if iterations exceed max_iter
pub fn gradient_descent<F, G>(f: F, grad: G, x0: &[f64], options: &GradientOptions) -> SearchResult<VectorMinimum>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
{
    if x0.is_empty() {
        return Err(SearchError::EmptyPoint);
    }
    positive(options.step, "step")?;
    positive(options.tol, "tol")?;

    let mut x = x0.to_vec();
    let mut fx = evaluate(&f, &x)?;
    let mut step = options.step;
    let mut trajectory = vec![x.clone()];

    for iter in 0..options.max_iter {
        let mut direction = grad(&x);
        if direction.len() != x.len() {
            return Err(SearchError::DimensionMismatch {
                expected: x.len(),
                found: direction.len(),
            });
        }
        if options.normalize {
            let norm = direction.iter().map(|g| g * g).sum::<f64>().sqrt();
            if norm > 1e-10 {
                direction.iter_mut().for_each(|g| *g /= norm);
            }
        }

        let candidate: Vec<f64> = x.iter().zip(&direction).map(|(xi, gi)| xi - step * gi).collect();
        let f_candidate = f(&candidate);
        let change = (f_candidate - fx).abs();

        if f_candidate < fx {
            x = candidate;
            fx = f_candidate;
            trace!(x = ?x, f = fx, step, "gradient step");
            trajectory.push(x.clone());
        } else {
            step /= 2.0;
        }

        if change < options.tol {
            debug!(iterations = iter + 1, f_min = fx, "gradient descent converged");
            return Ok(VectorMinimum {
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
        context: "gradient_descent",
    })
}
