//! Perfect-foresight transition paths for the balanced-growth economy.

use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{HopenhaynError, Result};
use crate::params::{EquilibriumMode, ExitTiming, FixedCostUnit};
use crate::results::Equilibrium;

/// One period of a transition path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodStat {
    /// Labor supply level, normalized to one in the starting steady state.
    pub labor_supply: f64,
    /// Total mass of active firms.
    pub firm_mass: f64,
    /// Mass of entrants absorbed this period.
    pub entrant_mass: f64,
    /// Entrants relative to last period's firm mass, in percent.
    pub entry_rate: f64,
    /// Share of firms exiting, in percent.
    pub exit_rate: f64,
    /// Workers per firm including overhead labor.
    pub average_size: f64,
}

impl Equilibrium {
    /// Walk the economy along a path of labor supply growth rates.
    ///
    /// Labor supply grows by `growth[t]` between periods `t` and `t + 1`,
    /// starting from this steady state. Incumbents keep their steady-state
    /// employment and exit policies; each period the entrant mass absorbs
    /// whatever labor the arriving incumbents leave over. The returned path
    /// has `growth.len() + 1` periods, the first being the steady state
    /// itself.
    ///
    /// Only defined for the balanced-growth closure with a labor-denominated
    /// fixed cost and the before-shock exit timing, where labor demand is
    /// linear in the entrant mass period by period.
    pub fn transition_path(&self, growth: &[f64]) -> Result<Vec<PeriodStat>> {
        if self.params.mode != EquilibriumMode::BalancedGrowth {
            return Err(HopenhaynError::inconsistent(
                "transition paths require the balanced-growth closure",
            ));
        }
        if self.params.fixed_cost_unit != FixedCostUnit::Labor {
            return Err(HopenhaynError::inconsistent(
                "transition paths require the fixed cost denominated in labor",
            ));
        }
        if self.params.timing != ExitTiming::BeforeShock {
            return Err(HopenhaynError::inconsistent(
                "transition paths require the before-shock exit timing",
            ));
        }

        let n = self.levels.len();
        let hazard = self.params.exogenous_exit;
        // flow of surviving incumbents between two consecutive periods
        let mut flow = self.transition.transpose();
        for j in 0..n {
            let keep = (1.0 - hazard) * (1.0 - self.core.exit_indicator[j]);
            flow.column_mut(j).scale_mut(keep);
        }
        let sizes = self.core.employment.add_scalar(self.params.fixed_cost);
        let entrant_size = self.entrant_weights.dot(&sizes);

        let exit_share = |distribution: &DVector<f64>, mass: f64| -> f64 {
            let endogenous = self.core.exit_indicator.dot(distribution) / mass * 100.0;
            endogenous + (100.0 - endogenous) * hazard
        };

        let mut distribution = self.core.distribution.clone();
        let mut mass = distribution.sum();
        let mut supply = 1.0;
        let mut path = Vec::with_capacity(growth.len() + 1);
        path.push(PeriodStat {
            labor_supply: supply,
            firm_mass: mass,
            entrant_mass: self.core.entrant_mass,
            entry_rate: self.stats.entry_rate,
            exit_rate: exit_share(&distribution, mass),
            average_size: distribution.dot(&sizes) / mass,
        });

        for rate in growth {
            supply *= 1.0 + rate;
            let incumbents = &flow * &distribution;
            let entrant_mass = (supply - incumbents.dot(&sizes)) / entrant_size;
            let next = incumbents + &self.entrant_weights * entrant_mass;
            let next_mass = next.sum();
            path.push(PeriodStat {
                labor_supply: supply,
                firm_mass: next_mass,
                entrant_mass,
                entry_rate: entrant_mass / mass * 100.0,
                exit_rate: exit_share(&next, next_mass),
                average_size: next.dot(&sizes) / next_mass,
            });
            distribution = next;
            mass = next_mass;
        }
        debug!(
            "walked {} transition periods: final supply {:.6}, firm mass {:.6e}",
            growth.len(),
            supply,
            mass
        );
        Ok(path)
    }
}
