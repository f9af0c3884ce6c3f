//! # Nonlinear Least-Squares Curve Fitting
//!
//! Levenberg-Marquardt fit of `(x, y)` points against a [`CurveModel`].
//!
//! ## Algorithm
//! Each step solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr        r = y - f(x; p)
//! ```
//!
//! for the two parameters in closed form. A step that lowers the residual
//! sum of squares is accepted and λ shrinks tenfold; otherwise λ grows
//! tenfold and the step is retried. Convergence follows the MINPACK tests:
//! relative cost reduction (`ftol`), relative step size (`xtol`) and the
//! cosine between the residual and each Jacobian column (`gtol`).
//!
//! Pan-genome fits start at `(k, alpha) = (0, 0)`, where the `alpha` column
//! of the Jacobian is identically zero; the diagonal scaling falls back to 1
//! for such columns so the first step only moves `k`.

use thiserror::Error;
use tracing::trace;

use crate::model::curve::{CurveModel, HeapsLaw, Params};

/// Failure modes of a single curve fit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Two parameters need at least two distinct covariate values
    #[error("need at least 2 distinct x values to fit, found {distinct_x}")]
    InsufficientPoints { distinct_x: usize },

    /// Point outside the model's domain, or not finite
    #[error("point {index} (x = {x}, y = {y}) is invalid for {model}")]
    InvalidPoint {
        index: usize,
        x: f64,
        y: f64,
        model: &'static str,
    },

    /// x and y have different lengths
    #[error("x has {n_x} values but y has {n_y}")]
    LengthMismatch { n_x: usize, n_y: usize },

    /// Damping grew without finding a downhill step, or parameters blew up
    #[error("{model} fit became singular after {iterations} iterations")]
    Singular {
        model: &'static str,
        iterations: usize,
    },

    /// Iteration cap reached before any convergence test passed
    #[error("{model} fit did not converge within {max_iterations} iterations")]
    MaxIterations {
        model: &'static str,
        max_iterations: usize,
    },
}

/// Solver tolerances
#[derive(Clone, Debug)]
pub struct FitOptions {
    /// Relative reduction of the residual sum of squares
    pub ftol: f64,
    /// Relative change of the parameter vector
    pub xtol: f64,
    /// Cosine between residual vector and Jacobian columns
    pub gtol: f64,
    /// Maximum number of damped steps tried (accepted or rejected)
    pub max_iterations: usize,
    /// Starting damping factor
    pub initial_damping: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1e-10,
            max_iterations: 2_000,
            initial_damping: 1e-3,
        }
    }
}

/// Damping above this means no downhill direction exists at machine precision
const MAX_DAMPING: f64 = 1e20;
const MIN_DAMPING: f64 = 1e-15;

/// Result of a converged fit
#[derive(Clone, Debug)]
pub struct Fit {
    /// Fitted parameters in model order
    pub params: Params,
    /// Damped steps taken
    pub iterations: usize,
    /// Residual sum of squares at `params`
    pub residual_sum_squares: f64,
}

/// Fitted Heaps' law parameters `y = k * x^alpha`.
///
/// Reports call `alpha` "gamma"; [`FitParams::gamma`] is the same value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParams {
    pub k: f64,
    pub alpha: f64,
}

impl FitParams {
    pub fn new(k: f64, alpha: f64) -> Self {
        Self { k, alpha }
    }

    /// Exponent under its reporting name
    pub fn gamma(&self) -> f64 {
        self.alpha
    }

    /// Fitted curve value at `x`
    pub fn predict(&self, x: f64) -> f64 {
        crate::model::curve::heaps_law(x, self.k, self.alpha)
    }
}

/// Fit Heaps' law to `(xs, ys)` from the origin guess `(0, 0)`.
pub fn fit_heaps_law(xs: &[f64], ys: &[f64]) -> Result<FitParams, FitError> {
    fit_heaps_law_with(xs, ys, &FitOptions::default())
}

/// [`fit_heaps_law`] with explicit solver tolerances
pub fn fit_heaps_law_with(xs: &[f64], ys: &[f64], opts: &FitOptions) -> Result<FitParams, FitError> {
    let fit = fit_curve(&HeapsLaw, xs, ys, [0.0, 0.0], opts)?;
    Ok(FitParams::new(fit.params[0], fit.params[1]))
}

/// Levenberg-Marquardt fit of `model` to `(xs, ys)` starting from `initial`.
pub fn fit_curve<M: CurveModel>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    initial: Params,
    opts: &FitOptions,
) -> Result<Fit, FitError> {
    validate_points(model, xs, ys)?;

    let mut p = initial;
    let mut cost = residual_sum_squares(model, xs, ys, &p);
    if !cost.is_finite() {
        return Err(FitError::Singular {
            model: M::NAME,
            iterations: 0,
        });
    }
    let mut lambda = opts.initial_damping;
    let mut iterations = 0;

    while iterations < opts.max_iterations {
        if cost == 0.0 {
            return Ok(converged(p, iterations, cost));
        }

        let (jtj, jtr) = normal_equations(model, xs, ys, &p);
        if gradient_cosine(&jtj, &jtr, cost) <= opts.gtol {
            return Ok(converged(p, iterations, cost));
        }

        let scale = [diag_scale(jtj[0][0]), diag_scale(jtj[1][1])];

        // Inner loop: raise damping until a step goes downhill
        loop {
            iterations += 1;
            if iterations > opts.max_iterations {
                break;
            }

            let Some(delta) = solve_damped(&jtj, &jtr, lambda, &scale) else {
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    return Err(FitError::Singular {
                        model: M::NAME,
                        iterations,
                    });
                }
                continue;
            };

            let candidate = [p[0] + delta[0], p[1] + delta[1]];
            let new_cost = residual_sum_squares(model, xs, ys, &candidate);
            let step_small = norm(&delta) <= opts.xtol * (norm(&p) + opts.xtol);

            if new_cost.is_finite() && new_cost < cost {
                let reduction = cost - new_cost;
                p = candidate;
                trace!(iterations, lambda, cost = new_cost, "accepted step");
                let old_cost = cost;
                cost = new_cost;
                lambda = (lambda / 10.0).max(MIN_DAMPING);
                if reduction <= opts.ftol * old_cost || step_small {
                    return Ok(converged(p, iterations, cost));
                }
                break;
            }

            if step_small {
                return Ok(converged(p, iterations, cost));
            }

            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                return Err(FitError::Singular {
                    model: M::NAME,
                    iterations,
                });
            }
        }
    }

    Err(FitError::MaxIterations {
        model: M::NAME,
        max_iterations: opts.max_iterations,
    })
}

fn converged(params: Params, iterations: usize, residual_sum_squares: f64) -> Fit {
    Fit {
        params,
        iterations,
        residual_sum_squares,
    }
}

fn validate_points<M: CurveModel>(model: &M, xs: &[f64], ys: &[f64]) -> Result<(), FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::LengthMismatch {
            n_x: xs.len(),
            n_y: ys.len(),
        });
    }
    for (index, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if !model.accepts(x) || !y.is_finite() {
            return Err(FitError::InvalidPoint {
                index,
                x,
                y,
                model: M::NAME,
            });
        }
    }

    let mut distinct = xs.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(FitError::InsufficientPoints {
            distinct_x: distinct.len(),
        });
    }
    Ok(())
}

fn residual_sum_squares<M: CurveModel>(model: &M, xs: &[f64], ys: &[f64], p: &Params) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - model.value(x, p);
            r * r
        })
        .sum()
}

/// Accumulate `JᵀJ` and `Jᵀr` at `p`
fn normal_equations<M: CurveModel>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    p: &Params,
) -> ([[f64; 2]; 2], [f64; 2]) {
    let mut jtj = [[0.0; 2]; 2];
    let mut jtr = [0.0; 2];
    for (&x, &y) in xs.iter().zip(ys) {
        let g = model.gradient(x, p);
        let r = y - model.value(x, p);
        jtj[0][0] += g[0] * g[0];
        jtj[0][1] += g[0] * g[1];
        jtj[1][1] += g[1] * g[1];
        jtr[0] += g[0] * r;
        jtr[1] += g[1] * r;
    }
    jtj[1][0] = jtj[0][1];
    (jtj, jtr)
}

/// Largest cosine between the residual vector and a Jacobian column
fn gradient_cosine(jtj: &[[f64; 2]; 2], jtr: &[f64; 2], cost: f64) -> f64 {
    let r_norm = cost.sqrt();
    (0..2)
        .filter(|&j| jtj[j][j] > 0.0)
        .map(|j| jtr[j].abs() / (jtj[j][j].sqrt() * r_norm))
        .fold(0.0, f64::max)
}

#[inline]
fn diag_scale(d: f64) -> f64 {
    if d > 0.0 && d.is_finite() {
        d
    } else {
        1.0
    }
}

/// Solve `(JᵀJ + λ·D) δ = Jᵀr` for two unknowns
fn solve_damped(
    jtj: &[[f64; 2]; 2],
    jtr: &[f64; 2],
    lambda: f64,
    scale: &[f64; 2],
) -> Option<[f64; 2]> {
    let a = jtj[0][0] + lambda * scale[0];
    let b = jtj[0][1];
    let c = jtj[1][1] + lambda * scale[1];
    let det = a * c - b * b;
    if !det.is_finite() || det <= 0.0 {
        return None;
    }
    let delta = [
        (c * jtr[0] - b * jtr[1]) / det,
        (a * jtr[1] - b * jtr[0]) / det,
    ];
    delta.iter().all(|d| d.is_finite()).then_some(delta)
}

#[inline]
fn norm(v: &[f64; 2]) -> f64 {
    v[0].hypot(v[1])
}
