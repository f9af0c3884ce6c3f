//! # Curve Models
//!
//! Two-parameter response curves used to summarise accumulation data:
//!
//! ```text
//! heaps_law(x; k, alpha)       = k * x^alpha
//! exponential_decay(x; a, b)   = a * exp(-b * x)
//! ```
//!
//! Only Heaps' law drives the open/closed call. The decay model is kept for
//! fitting core-genome curves by hand and for comparing against the power law.

/// Parameter vector of a two-parameter curve
pub type Params = [f64; 2];

/// Heaps' law: `k * x^alpha`.
///
/// Undefined for `x <= 0` with negative `alpha`; callers only pass genome
/// counts, which start at 1.
#[inline]
pub fn heaps_law(x: f64, k: f64, alpha: f64) -> f64 {
    k * x.powf(alpha)
}

/// Exponential decay: `a * exp(-b * x)`
#[inline]
pub fn exponential_decay(x: f64, a: f64, b: f64) -> f64 {
    a * (-b * x).exp()
}

/// A smooth two-parameter model that can be fitted by least squares.
pub trait CurveModel {
    /// Model name for logs and error messages
    const NAME: &'static str;

    /// Model value at `x`
    fn value(&self, x: f64, p: &Params) -> f64;

    /// Partial derivatives of the value with respect to each parameter
    fn gradient(&self, x: f64, p: &Params) -> Params;

    /// Whether the model is defined at `x`
    fn accepts(&self, x: f64) -> bool {
        x.is_finite()
    }
}

/// Power law `y = k * x^alpha`, parameters `[k, alpha]`
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapsLaw;

impl CurveModel for HeapsLaw {
    const NAME: &'static str = "heaps_law";

    #[inline]
    fn value(&self, x: f64, p: &Params) -> f64 {
        heaps_law(x, p[0], p[1])
    }

    #[inline]
    fn gradient(&self, x: f64, p: &Params) -> Params {
        let pow = x.powf(p[1]);
        [pow, p[0] * pow * x.ln()]
    }

    fn accepts(&self, x: f64) -> bool {
        x.is_finite() && x > 0.0
    }
}

/// Exponential decay `y = a * exp(-b * x)`, parameters `[a, b]`
#[derive(Clone, Copy, Debug, Default)]
pub struct ExponentialDecay;

impl CurveModel for ExponentialDecay {
    const NAME: &'static str = "exponential_decay";

    #[inline]
    fn value(&self, x: f64, p: &Params) -> f64 {
        exponential_decay(x, p[0], p[1])
    }

    #[inline]
    fn gradient(&self, x: f64, p: &Params) -> Params {
        let e = (-p[1] * x).exp();
        [e, -p[0] * x * e]
    }
}
