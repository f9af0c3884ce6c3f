//! # Aggregation and Open/Closed Classification
//!
//! Averages per-iteration Heaps' law fits and calls the pan-genome open
//! (mean exponent > 0) or closed (mean exponent <= 0). The call is made once,
//! from the mean, never from an individual iteration.

use std::fmt;

use crate::error::{PangrowthError, Result};
use crate::model::fit::FitParams;

/// Openness of a pan-genome
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanGenomeStatus {
    /// Mean exponent > 0: new genomes keep adding genes
    Open,
    /// Mean exponent <= 0: gene content saturates
    Closed,
}

impl PanGenomeStatus {
    /// Classify from a mean exponent. Zero is closed.
    pub fn from_exponent(alpha: f64) -> Self {
        if alpha > 0.0 {
            PanGenomeStatus::Open
        } else {
            PanGenomeStatus::Closed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanGenomeStatus::Open => "open",
            PanGenomeStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for PanGenomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Averaged fit over all iterations that produced one
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregate {
    /// Mean of the per-iteration `k`
    pub avg_k: f64,
    /// Mean of the per-iteration exponents
    pub avg_alpha: f64,
    /// Number of fits averaged
    pub n_fits: usize,
    pub status: PanGenomeStatus,
}

impl Aggregate {
    /// Mean parameters as a fit, for drawing the average curve
    pub fn mean_fit(&self) -> FitParams {
        FitParams::new(self.avg_k, self.avg_alpha)
    }
}

/// Average the fits and classify.
///
/// An empty slice is an error: there is nothing to average.
pub fn aggregate(fits: &[FitParams]) -> Result<Aggregate> {
    if fits.is_empty() {
        return Err(PangrowthError::degenerate(
            "no successful fits to aggregate",
        ));
    }
    let n = fits.len() as f64;
    let avg_k = fits.iter().map(|f| f.k).sum::<f64>() / n;
    let avg_alpha = fits.iter().map(|f| f.alpha).sum::<f64>() / n;

    Ok(Aggregate {
        avg_k,
        avg_alpha,
        n_fits: fits.len(),
        status: PanGenomeStatus::from_exponent(avg_alpha),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::curve::heaps_law;
    use crate::model::fit::fit_heaps_law;

    #[test]
    fn test_mean_of_fits() {
        let fits = [
            FitParams::new(10.0, 0.2),
            FitParams::new(20.0, -0.1),
            FitParams::new(30.0, 0.5),
        ];
        let agg = aggregate(&fits).unwrap();
        assert!((agg.avg_k - 20.0).abs() < 1e-12);
        assert!((agg.avg_alpha - 0.2).abs() < 1e-12);
        assert_eq!(agg.n_fits, 3);
        assert_eq!(agg.status, PanGenomeStatus::Open);
    }

    #[test]
    fn test_zero_exponent_is_closed() {
        assert_eq!(PanGenomeStatus::from_exponent(0.0), PanGenomeStatus::Closed);
        assert_eq!(PanGenomeStatus::from_exponent(-1e-9), PanGenomeStatus::Closed);
        assert_eq!(PanGenomeStatus::from_exponent(1e-9), PanGenomeStatus::Open);

        let agg = aggregate(&[FitParams::new(1.0, 0.3), FitParams::new(1.0, -0.3)]).unwrap();
        assert_eq!(agg.status, PanGenomeStatus::Closed);
    }

    #[test]
    fn test_mean_not_single_iteration() {
        // One strongly open iteration does not make the mean open
        let fits = [
            FitParams::new(5.0, 0.9),
            FitParams::new(5.0, -0.5),
            FitParams::new(5.0, -0.5),
        ];
        assert_eq!(aggregate(&fits).unwrap().status, PanGenomeStatus::Closed);
    }

    #[test]
    fn test_empty_is_degenerate() {
        assert!(matches!(
            aggregate(&[]),
            Err(PangrowthError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_synthetic_curves_classify_by_exponent() {
        let xs: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        for (alpha, expected) in [(0.4, PanGenomeStatus::Open), (-0.25, PanGenomeStatus::Closed)] {
            let fits: Vec<FitParams> = (0..5)
                .map(|i| {
                    let ys: Vec<f64> = xs
                        .iter()
                        .map(|&x| heaps_law(x, 800.0 + i as f64, alpha) + 1e-6 * (x % 2.0))
                        .collect();
                    fit_heaps_law(&xs, &ys).unwrap()
                })
                .collect();
            let agg = aggregate(&fits).unwrap();
            assert_eq!(agg.status, expected, "alpha = {alpha}");
            assert!((agg.avg_alpha - alpha).abs() < 1e-3);
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PanGenomeStatus::Open.to_string(), "open");
        assert_eq!(PanGenomeStatus::Closed.to_string(), "closed");
    }
}
