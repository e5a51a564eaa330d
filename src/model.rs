//! Frictionless firm dynamics model and its steady-state solver.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};

use crate::error::{HopenhaynError, Result};
use crate::grid::ProductivityGrid;
use crate::options::SolveOptions;
use crate::params::{EquilibriumMode, ExitTiming, FixedCostUnit, Parameters};
use crate::results::{Equilibrium, EquilibriumCore};
use crate::solving::{find_root, IterationOptions, IterationSummary};

/// Static per-state choices implied by a candidate wage.
struct StaticChoices {
    employment: DVector<f64>,
    output: DVector<f64>,
    profits: DVector<f64>,
}

/// Firm dynamics model with free entry and endogenous exit.
///
/// Incumbents draw productivity from a discretized AR(1), choose employment
/// each period, and exit when continuation falls below the scrap value.
/// Entrants pay a sunk cost and draw their initial state from a lognormal.
/// The steady state pins down the wage through free entry and the entrant
/// mass through labor market clearing.
#[derive(Clone, Debug)]
pub struct Model {
    params: Parameters,
    grid: ProductivityGrid,
    entrants: DVector<f64>,
}

impl Model {
    /// Validate the primitives and precompute the grid objects.
    pub fn new(params: Parameters) -> Result<Self> {
        let grid = ProductivityGrid::tauchen(&params)?;
        let entrants =
            grid.entrant_distribution(params.entrant_log_mean, params.entrant_log_std)?;
        Ok(Self {
            params,
            grid,
            entrants,
        })
    }

    /// The validated primitives.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// The discretized productivity process.
    pub fn grid(&self) -> &ProductivityGrid {
        &self.grid
    }

    /// Entrant probability mass over the grid.
    pub fn entrant_weights(&self) -> &DVector<f64> {
        &self.entrants
    }

    /// Wage each state actually faces, including the distortion.
    fn effective_wages(&self, wage: f64) -> DVector<f64> {
        let tax = self.params.wage_tax;
        let curve = self.params.wage_tax_curvature;
        self.grid.levels().map(|s| wage * tax * s.powf(curve))
    }

    /// Employment, output, and profit at every state for a candidate wage.
    fn static_choices(&self, wage: f64) -> StaticChoices {
        let n = self.grid.size();
        let theta = self.params.curvature;
        let levels = self.grid.levels();
        let effective_wages = self.effective_wages(wage);
        let employment = DVector::from_fn(n, |i, _| {
            (theta * levels[i] / effective_wages[i]).powf(1.0 / (1.0 - theta))
        });
        let output = DVector::from_fn(n, |i, _| levels[i] * employment[i].powf(theta));
        let profits = DVector::from_fn(n, |i, _| {
            let overhead = match self.params.fixed_cost_unit {
                FixedCostUnit::Labor => effective_wages[i] * self.params.fixed_cost,
                FixedCostUnit::Goods => self.params.fixed_cost,
            };
            output[i] - effective_wages[i] * employment[i] - overhead
        });
        StaticChoices {
            employment,
            output,
            profits,
        }
    }

    /// One application of the Bellman operator.
    fn bellman(&self, value: &DVector<f64>, profits: &DVector<f64>) -> DVector<f64> {
        let p = &self.params;
        let continuation = self.grid.transition() * value;
        let n = self.grid.size();
        DVector::from_fn(n, |i, _| {
            let blended =
                continuation[i] * (1.0 - p.exogenous_exit) + p.exogenous_exit * p.exit_value;
            match p.timing {
                ExitTiming::BeforeShock => profits[i] + p.discount * blended.max(p.exit_value),
                ExitTiming::AfterShock => (profits[i] + p.discount * blended).max(p.exit_value),
            }
        })
    }

    /// Iterate the Bellman operator to its fixed point.
    fn value_iteration(
        &self,
        profits: &DVector<f64>,
        options: &IterationOptions,
    ) -> Result<(DVector<f64>, IterationSummary)> {
        let mut value = DVector::from_element(self.grid.size(), 1.0);
        let mut max_gap = f64::INFINITY;
        let mut iteration = 0usize;

        while iteration < options.max_iterations {
            let update = self.bellman(&value, profits);
            max_gap = (&update - &value).amax();
            value = update;
            iteration += 1;
            if max_gap < options.tolerance {
                return Ok((
                    value,
                    IterationSummary {
                        iterations: iteration,
                        max_gap,
                    },
                ));
            }
            if iteration % 200 == 0 {
                trace!("value iteration {iteration}: max gap {max_gap:.3e}");
            }
        }

        Err(HopenhaynError::IterationDidNotConverge {
            context: "value function iteration",
            iterations: iteration,
            max_gap,
        })
    }

    /// Expected value of entry net of the entry cost at a candidate wage.
    fn entry_gap(&self, wage: f64, options: &SolveOptions) -> Result<f64> {
        let choices = self.static_choices(wage);
        let (value, summary) = self.value_iteration(&choices.profits, &options.value_iteration)?;
        let expected = self.entrants.dot(&value);
        debug!(
            "wage {:.6}: entrant value {:.6} after {} Bellman iterations",
            wage, expected, summary.iterations
        );
        Ok(expected - self.params.entry_cost)
    }

    /// Solve the free-entry condition for the wage.
    fn solve_wage(&self, options: &SolveOptions) -> Result<(f64, DVector<f64>, StaticChoices)> {
        let wage = find_root(
            |w| self.entry_gap(w, options),
            options.wage_method,
            options.wage_bracket,
            options.wage_guess,
            &options.wage_root,
            "the free-entry wage",
        )?;
        if !(wage > 0.0) {
            return Err(HopenhaynError::non_positive("wage", wage));
        }
        let choices = self.static_choices(wage);
        let (value, _) = self.value_iteration(&choices.profits, &options.value_iteration)?;
        Ok((wage, value, choices))
    }

    /// Exit indicator implied by the converged value function.
    ///
    /// Firms below the threshold state exit. Under the before-shock timing
    /// the decision compares expected continuation against the scrap value;
    /// under the after-shock timing the realized value itself is compared.
    fn exit_rule(
        &self,
        value: &DVector<f64>,
        choices: &StaticChoices,
    ) -> Result<(usize, DVector<f64>)> {
        let p = &self.params;
        let n = self.grid.size();
        let criterion = match p.timing {
            ExitTiming::BeforeShock => self.grid.transition() * value,
            ExitTiming::AfterShock => {
                DVector::from_fn(n, |i, _| choices.profits[i] + p.discount * value[i])
            }
        };
        let threshold_index = criterion
            .iter()
            .position(|&c| c >= p.exit_value)
            .ok_or(HopenhaynError::ExitPayoffAboveContinuation {
                exit_value: p.exit_value,
            })?;
        if threshold_index == 0 {
            return Err(HopenhaynError::NoExit);
        }
        let indicator =
            DVector::from_fn(n, |i, _| if i < threshold_index { 1.0 } else { 0.0 });
        Ok((threshold_index, indicator))
    }

    /// Transposed flow of surviving incumbents, scaled for the exogenous
    /// hazard and population growth.
    fn survivor_operator(&self, indicator: &DVector<f64>) -> DMatrix<f64> {
        let p = &self.params;
        let scale = (1.0 - p.exogenous_exit) / (1.0 + p.labor_growth);
        let mut flow = self.grid.transition().transpose();
        for j in 0..self.grid.size() {
            let keep = scale * (1.0 - indicator[j]);
            flow.column_mut(j).scale_mut(keep);
        }
        flow
    }

    /// Stationary distribution per unit of entry.
    fn unit_distribution(&self, indicator: &DVector<f64>) -> Result<DVector<f64>> {
        let n = self.grid.size();
        let system = DMatrix::identity(n, n) - self.survivor_operator(indicator);
        let solution = nalgebra::linalg::LU::new(system)
            .solve(&self.entrants)
            .ok_or_else(|| HopenhaynError::singular("the stationary distribution"))?;
        let masked = match self.params.timing {
            ExitTiming::BeforeShock => solution,
            // firms that exit on arrival never produce, so they carry no mass
            ExitTiming::AfterShock => {
                solution.component_mul(&indicator.map(|x| 1.0 - x))
            }
        };
        if masked.iter().any(|&m| !m.is_finite()) || masked.min() < -1e-10 {
            return Err(HopenhaynError::numerical("the stationary distribution"));
        }
        Ok(masked)
    }

    /// Labor market clearing error at entrant mass `mass`.
    fn clearing_gap(
        &self,
        mass: f64,
        wage: f64,
        choices: &StaticChoices,
        unit_distribution: &DVector<f64>,
    ) -> f64 {
        let p = &self.params;
        let firm_mass = mass * unit_distribution.sum();
        let production_labor = mass * unit_distribution.dot(&choices.employment);
        let overhead_labor = match p.fixed_cost_unit {
            FixedCostUnit::Labor => p.fixed_cost * firm_mass,
            FixedCostUnit::Goods => 0.0,
        };
        let demand = production_labor + overhead_labor;
        let supply = match p.mode {
            EquilibriumMode::Partial => wage.powf(p.supply_elasticity),
            EquilibriumMode::BalancedGrowth => 1.0,
            EquilibriumMode::General => {
                let production = mass * unit_distribution.dot(&choices.output);
                let overhead_cost = match p.fixed_cost_unit {
                    FixedCostUnit::Labor => wage * p.fixed_cost * firm_mass,
                    FixedCostUnit::Goods => p.fixed_cost * firm_mass,
                };
                let profits =
                    production - wage * demand - overhead_cost - p.entry_cost * mass;
                1.0 / p.labor_disutility - profits / wage
            }
        };
        supply - demand
    }

    /// Solve the clearing condition for the entrant mass.
    fn solve_mass(
        &self,
        wage: f64,
        choices: &StaticChoices,
        unit_distribution: &DVector<f64>,
        options: &SolveOptions,
    ) -> Result<f64> {
        let mass = find_root(
            |m| Ok(self.clearing_gap(m, wage, choices, unit_distribution)),
            options.mass_method,
            options.mass_bracket,
            options.mass_guess,
            &options.mass_root,
            "labor market clearing",
        )?;
        if !(mass > 0.0) {
            return Err(HopenhaynError::non_positive("entrant mass", mass));
        }
        Ok(mass)
    }

    /// Compute the steady-state equilibrium with default solver settings.
    pub fn solve(&self) -> Result<Equilibrium> {
        self.solve_with(&SolveOptions::default())
    }

    /// Compute the steady-state equilibrium.
    ///
    /// The wage comes first from free entry, then the exit rule and the
    /// stationary distribution it implies, and finally the entrant mass from
    /// labor market clearing.
    pub fn solve_with(&self, options: &SolveOptions) -> Result<Equilibrium> {
        let (wage, value, choices) = self.solve_wage(options)?;
        let (threshold_index, indicator) = self.exit_rule(&value, &choices)?;
        let unit_distribution = self.unit_distribution(&indicator)?;
        let gross_mass = self.solve_mass(wage, &choices, &unit_distribution, options)?;

        // under the after-shock timing only surviving entrants are counted
        let entrant_mass = match self.params.timing {
            ExitTiming::BeforeShock => gross_mass,
            ExitTiming::AfterShock => {
                gross_mass
                    * self
                        .entrants
                        .iter()
                        .zip(indicator.iter())
                        .map(|(weight, x)| weight * (1.0 - x))
                        .sum::<f64>()
            }
        };
        debug!(
            "solved: wage {:.6}, entrant mass {:.6e}, exit threshold index {}",
            wage, entrant_mass, threshold_index
        );

        let core = EquilibriumCore {
            wage,
            value,
            exit_threshold: self.grid.levels()[threshold_index],
            exit_indicator: indicator,
            distribution: unit_distribution * gross_mass,
            entrant_mass,
            employment: choices.employment,
            output: choices.output,
            profits: choices.profits,
        };
        Ok(Equilibrium::new(
            self.params.clone(),
            self.grid.levels(),
            self.grid.transition(),
            self.entrants.clone(),
            core,
        ))
    }

    /// Like [`Model::solve_with`], but maps any failure to `None` after
    /// logging it. Convenient inside calibration sweeps where individual
    /// draws are allowed to fail.
    pub fn solve_or_none(&self, options: &SolveOptions) -> Option<Equilibrium> {
        match self.solve_with(options) {
            Ok(equilibrium) => Some(equilibrium),
            Err(error) => {
                debug!("equilibrium solve failed: {error}");
                None
            }
        }
    }
}
