//! Discretized productivity process and the entrant distribution over it.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{Continuous, ContinuousCDF, LogNormal, Normal};

use crate::error::{HopenhaynError, Result};
use crate::params::Parameters;

/// Finite-state approximation of the AR(1) log productivity process.
///
/// States are stored in increasing order; `transition` is a row-stochastic
/// matrix whose `(i, j)` entry is the probability of moving from state `i`
/// to state `j`.
#[derive(Clone, Debug)]
pub struct ProductivityGrid {
    log_levels: DVector<f64>,
    levels: DVector<f64>,
    transition: DMatrix<f64>,
}

impl ProductivityGrid {
    /// Discretize the log productivity process by Tauchen's method.
    ///
    /// The grid spans `grid_span` stationary standard deviations on each side
    /// of the stationary mean, and transition probabilities integrate the
    /// innovation density over the midpoint partition of the grid.
    pub fn tauchen(params: &Parameters) -> Result<Self> {
        params.validate()?;
        let n = params.grid_size;
        let rho = params.persistence;
        let sigma = params.volatility;
        let std_y = (sigma * sigma / (1.0 - rho * rho)).sqrt();
        let x_max = params.grid_span * std_y;
        let x_min = -x_max;
        let step = (x_max - x_min) / (n as f64 - 1.0);
        let half_step = 0.5 * step;
        let x = DVector::from_fn(n, |i, _| x_min + step * i as f64);

        let normal = Normal::new(0.0, 1.0).expect("unit normal");
        let mut transition = DMatrix::zeros(n, n);
        for i in 0..n {
            let shift = rho * x[i];
            transition[(i, 0)] = normal.cdf((x[0] - shift + half_step) / sigma);
            transition[(i, n - 1)] = 1.0 - normal.cdf((x[n - 1] - shift - half_step) / sigma);
            for j in 1..n - 1 {
                let z = x[j] - shift;
                transition[(i, j)] =
                    normal.cdf((z + half_step) / sigma) - normal.cdf((z - half_step) / sigma);
            }
        }

        let log_levels = x.add_scalar(params.drift / (1.0 - rho));
        let levels = log_levels.map(f64::exp);
        Ok(Self {
            log_levels,
            levels,
            transition,
        })
    }

    /// Number of grid points.
    pub fn size(&self) -> usize {
        self.levels.len()
    }

    /// Productivity levels in increasing order.
    pub fn levels(&self) -> &DVector<f64> {
        &self.levels
    }

    /// Log productivity levels in increasing order.
    pub fn log_levels(&self) -> &DVector<f64> {
        &self.log_levels
    }

    /// Row-stochastic transition matrix.
    pub fn transition(&self) -> &DMatrix<f64> {
        &self.transition
    }

    /// Probability mass function of entrant productivity on the grid.
    ///
    /// A lognormal density is evaluated at the grid levels and renormalized.
    /// When the grid and the entrant distribution barely overlap the weights
    /// underflow and no usable mass remains, which is reported as a
    /// configuration problem rather than silently renormalized.
    pub fn entrant_distribution(&self, log_mean: f64, log_std: f64) -> Result<DVector<f64>> {
        let density = LogNormal::new(log_mean, log_std).map_err(|_| {
            HopenhaynError::invalid_parameter("entrant_log_std", "must be positive", log_std)
        })?;
        let weights = self.levels.map(|s| density.pdf(s));
        let total = weights.sum();
        if !total.is_finite() || total < f64::MIN_POSITIVE {
            return Err(HopenhaynError::DegenerateEntrantDistribution { total });
        }
        Ok(weights / total)
    }
}
