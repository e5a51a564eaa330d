//! Firm dynamics with employment adjustment costs.
//!
//! Extends the frictionless model with a second state variable, last
//! period's employment, and a tax on changing it. Firms arrive at a cell
//! `(productivity, previous employment)`, pick this period's employment from
//! a fixed grid, produce, and then either continue or exit paying the cost
//! of firing their whole workforce.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{HopenhaynError, Result};
use crate::grid::ProductivityGrid;
use crate::options::SolveOptions;
use crate::params::{AdjustmentMode, AdjustmentParameters, EquilibriumMode, FixedCostUnit};
use crate::results::{SizeDistribution, SurvivalStat};
use crate::solving::{find_root, IterationOptions, IterationSummary};

/// Exponent of the change of variables that concentrates employment grid
/// points near zero.
const GRID_CURVE: f64 = 0.3;

/// Firm dynamics model with a tax on employment adjustment.
#[derive(Clone, Debug)]
pub struct AdjustmentModel {
    params: AdjustmentParameters,
    grid: ProductivityGrid,
    employment_grid: DVector<f64>,
    entrants: DVector<f64>,
    /// Cost of moving from employment state `j` to choice `k`.
    choice_costs: DMatrix<f64>,
    /// Cost of firing the whole workforce from choice `k`.
    exit_costs: DVector<f64>,
}

impl AdjustmentModel {
    /// Validate the primitives and precompute the grids and cost tables.
    pub fn new(params: AdjustmentParameters) -> Result<Self> {
        params.validate()?;
        let grid = ProductivityGrid::tauchen(&params.base)?;
        let entrants = grid
            .entrant_distribution(params.base.entrant_log_mean, params.base.entrant_log_std)?;
        let employment_grid =
            Self::build_employment_grid(params.employment_grid_size, params.employment_max);

        let n = params.employment_grid_size;
        let choice_costs = DMatrix::from_fn(n, n, |j, k| {
            adjustment_cost(&params, employment_grid[k], employment_grid[j])
        });
        let exit_costs = DVector::from_fn(n, |k, _| {
            adjustment_cost(&params, 0.0, employment_grid[k])
        });
        Ok(Self {
            params,
            grid,
            employment_grid,
            entrants,
            choice_costs,
            exit_costs,
        })
    }

    /// Employment grid concentrated near zero, so entrants start from an
    /// effectively empty firm.
    fn build_employment_grid(size: usize, max: f64) -> DVector<f64> {
        let lower = 1e-8;
        let upper = max.powf(GRID_CURVE);
        let step = (upper - lower) / (size as f64 - 1.0);
        DVector::from_fn(size, |k, _| {
            (lower + step * k as f64).powf(1.0 / GRID_CURVE)
        })
    }

    /// The validated primitives.
    pub fn params(&self) -> &AdjustmentParameters {
        &self.params
    }

    /// The discretized productivity process.
    pub fn grid(&self) -> &ProductivityGrid {
        &self.grid
    }

    /// Employment levels firms can choose from.
    pub fn employment_grid(&self) -> &DVector<f64> {
        &self.employment_grid
    }

    /// Entrant probability mass over the productivity grid.
    pub fn entrant_weights(&self) -> &DVector<f64> {
        &self.entrants
    }

    /// Output and profit at every `(productivity, employment choice)` cell.
    fn profit_table(&self, wage: f64) -> (DMatrix<f64>, DMatrix<f64>) {
        let p = &self.params.base;
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let overhead = match p.fixed_cost_unit {
            FixedCostUnit::Labor => wage * p.fixed_cost,
            FixedCostUnit::Goods => p.fixed_cost,
        };
        let mut output = DMatrix::zeros(s, n);
        let mut profits = DMatrix::zeros(s, n);
        for k in 0..n {
            let employment = self.employment_grid[k];
            let scaled = employment.powf(p.curvature);
            for i in 0..s {
                let produced = self.grid.levels()[i] * scaled;
                output[(i, k)] = produced;
                profits[(i, k)] = produced - wage * employment - overhead;
            }
        }
        (output, profits)
    }

    /// One application of the Bellman operator, returning the updated value
    /// and the employment choice behind it.
    fn bellman(
        &self,
        value: &DMatrix<f64>,
        profits: &DMatrix<f64>,
    ) -> (DMatrix<f64>, DMatrix<usize>) {
        let p = &self.params.base;
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let integral = self.grid.transition() * value;

        // payoff of choosing k before the adjustment cost is charged
        let mut candidate = DMatrix::zeros(s, n);
        for k in 0..n {
            let severance = -self.exit_costs[k];
            for i in 0..s {
                let continuation = (1.0 - p.exogenous_exit) * integral[(i, k)];
                candidate[(i, k)] =
                    profits[(i, k)] + p.discount * continuation.max(severance);
            }
        }

        let mut update = DMatrix::zeros(s, n);
        let mut policy = DMatrix::<usize>::zeros(s, n);
        for j in 0..n {
            for i in 0..s {
                let mut best = f64::NEG_INFINITY;
                let mut best_choice = 0;
                for k in 0..n {
                    let trial = candidate[(i, k)] - self.choice_costs[(j, k)];
                    if trial > best {
                        best = trial;
                        best_choice = k;
                    }
                }
                update[(i, j)] = best;
                policy[(i, j)] = best_choice;
            }
        }
        (update, policy)
    }

    /// Iterate the Bellman operator to its fixed point.
    fn value_iteration(
        &self,
        profits: &DMatrix<f64>,
        options: &IterationOptions,
    ) -> Result<(DMatrix<f64>, DMatrix<usize>, IterationSummary)> {
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let mut value = DMatrix::from_element(s, n, 1.0);
        let mut policy = DMatrix::<usize>::zeros(s, n);
        let mut max_gap = f64::INFINITY;
        let mut iteration = 0usize;

        while iteration < options.max_iterations {
            let (update, new_policy) = self.bellman(&value, profits);
            max_gap = (&update - &value).amax();
            value = update;
            policy = new_policy;
            iteration += 1;
            if max_gap < options.tolerance {
                return Ok((
                    value,
                    policy,
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
    /// Entrants start from the lowest employment state.
    fn entry_gap(&self, wage: f64, options: &SolveOptions) -> Result<f64> {
        let (_, profits) = self.profit_table(wage);
        let (value, _, summary) = self.value_iteration(&profits, &options.value_iteration)?;
        let expected = (0..self.grid.size())
            .map(|i| self.entrants[i] * value[(i, 0)])
            .sum::<f64>();
        debug!(
            "wage {:.6}: entrant value {:.6} after {} Bellman iterations",
            wage, expected, summary.iterations
        );
        Ok(expected - self.params.base.entry_cost)
    }

    /// Exit indicator per cell and the productivity threshold per employment
    /// state.
    ///
    /// A firm exits when the severance payment beats the expected value of
    /// carrying its chosen workforce into the next period.
    fn exit_rule(
        &self,
        value: &DMatrix<f64>,
        policy: &DMatrix<usize>,
    ) -> Result<(DVector<f64>, DMatrix<f64>)> {
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let integral = self.grid.transition() * value;
        let indicator = DMatrix::from_fn(s, n, |i, j| {
            let k = policy[(i, j)];
            if -self.exit_costs[k] > integral[(i, k)] {
                1.0
            } else {
                0.0
            }
        });

        let total = indicator.sum();
        if total == 0.0 {
            return Err(HopenhaynError::NoExit);
        }
        if total == (s * n) as f64 {
            return Err(HopenhaynError::CompleteExit);
        }

        let thresholds = DVector::from_fn(n, |j, _| {
            let first_staying = indicator
                .column(j)
                .iter()
                .position(|&x| x == 0.0)
                .unwrap_or(0);
            self.grid.levels()[first_staying]
        });
        Ok((thresholds, indicator))
    }

    /// Stationary distribution over cells per unit of entry, by forward
    /// iteration from an empty economy.
    fn unit_distribution(
        &self,
        indicator: &DMatrix<f64>,
        policy: &DMatrix<usize>,
        options: &IterationOptions,
    ) -> Result<DMatrix<f64>> {
        let p = &self.params.base;
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let scale = (1.0 - p.exogenous_exit) / (1.0 + p.labor_growth);
        let transition = self.grid.transition();

        let mut distribution = DMatrix::zeros(s, n);
        let mut max_gap = f64::INFINITY;
        let mut iteration = 0usize;

        while iteration < options.max_iterations {
            let mut next = DMatrix::zeros(s, n);
            for i in 0..s {
                next[(i, 0)] += self.entrants[i];
            }
            for j in 0..n {
                for i in 0..s {
                    let outflow = distribution[(i, j)] * (1.0 - indicator[(i, j)]) * scale;
                    if outflow != 0.0 {
                        let k = policy[(i, j)];
                        for destination in 0..s {
                            next[(destination, k)] += outflow * transition[(i, destination)];
                        }
                    }
                }
            }
            max_gap = (&next - &distribution).amax();
            distribution = next;
            iteration += 1;
            if max_gap < options.tolerance {
                return Ok(distribution);
            }
            if iteration % 200 == 0 {
                trace!("distribution iteration {iteration}: max gap {max_gap:.3e}");
            }
        }

        Err(HopenhaynError::IterationDidNotConverge {
            context: "distribution iteration",
            iterations: iteration,
            max_gap,
        })
    }

    /// Adjustment costs paid per unit of entry: reshuffling toward the
    /// chosen workforce plus severance for exiting cells.
    fn unit_adjustment_cost(
        &self,
        distribution: &DMatrix<f64>,
        indicator: &DMatrix<f64>,
        policy: &DMatrix<usize>,
    ) -> f64 {
        let s = self.grid.size();
        let n = self.params.employment_grid_size;
        let mut total = 0.0;
        for j in 0..n {
            for i in 0..s {
                let mass = distribution[(i, j)];
                if mass != 0.0 {
                    let k = policy[(i, j)];
                    total += mass * self.choice_costs[(j, k)];
                    if indicator[(i, j)] == 1.0 {
                        total += mass * self.exit_costs[k];
                    }
                }
            }
        }
        total
    }

    /// Compute the steady-state equilibrium with default solver settings.
    pub fn solve(&self) -> Result<AdjustmentEquilibrium> {
        self.solve_with(&SolveOptions::default())
    }

    /// Compute the steady-state equilibrium.
    pub fn solve_with(&self, options: &SolveOptions) -> Result<AdjustmentEquilibrium> {
        let p = &self.params.base;
        let s = self.grid.size();
        let n = self.params.employment_grid_size;

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

        let (output_table, profit_table) = self.profit_table(wage);
        let (value, policy, _) = self.value_iteration(&profit_table, &options.value_iteration)?;
        let (exit_thresholds, exit_indicator) = self.exit_rule(&value, &policy)?;
        let unit_distribution =
            self.unit_distribution(&exit_indicator, &policy, &options.distribution_iteration)?;

        let employment = DMatrix::from_fn(s, n, |i, j| self.employment_grid[policy[(i, j)]]);
        let output = DMatrix::from_fn(s, n, |i, j| output_table[(i, policy[(i, j)])]);
        let profits = DMatrix::from_fn(s, n, |i, j| profit_table[(i, policy[(i, j)])]);

        let unit_mass = unit_distribution.sum();
        let unit_labor = unit_distribution.dot(&employment);
        let unit_overhead_labor = match p.fixed_cost_unit {
            FixedCostUnit::Labor => p.fixed_cost * unit_mass,
            FixedCostUnit::Goods => 0.0,
        };
        let unit_demand = unit_labor + unit_overhead_labor;
        let unit_output = unit_distribution.dot(&output);
        let unit_adjustment =
            self.unit_adjustment_cost(&unit_distribution, &exit_indicator, &policy);
        let unit_overhead_cost = match p.fixed_cost_unit {
            FixedCostUnit::Labor => wage * p.fixed_cost * unit_mass,
            FixedCostUnit::Goods => p.fixed_cost * unit_mass,
        };
        let unit_profit = unit_output - wage * unit_demand - unit_overhead_cost
            - p.entry_cost
            - unit_adjustment;

        let mass = find_root(
            |m| {
                let supply = match p.mode {
                    EquilibriumMode::Partial => wage.powf(p.supply_elasticity),
                    EquilibriumMode::BalancedGrowth => 1.0,
                    EquilibriumMode::General => {
                        1.0 / p.labor_disutility - m * unit_profit / wage
                    }
                };
                Ok(supply - m * unit_demand)
            },
            options.mass_method,
            options.mass_bracket,
            options.mass_guess,
            &options.mass_root,
            "labor market clearing",
        )?;
        if !(mass > 0.0) {
            return Err(HopenhaynError::non_positive("entrant mass", mass));
        }
        debug!(
            "solved: wage {:.6}, entrant mass {:.6e}, adjustment bill {:.6e}",
            wage,
            mass,
            mass * unit_adjustment
        );

        let core = AdjustmentCore {
            wage,
            value,
            exit_thresholds,
            exit_indicator,
            distribution: unit_distribution * mass,
            entrant_mass: mass,
            policy,
            employment,
            output,
            profits,
        };
        Ok(AdjustmentEquilibrium::new(
            self.params.clone(),
            self.grid.levels().clone(),
            self.grid.transition().clone(),
            self.employment_grid.clone(),
            self.entrants.clone(),
            core,
            mass * unit_adjustment,
        ))
    }

    /// Like [`AdjustmentModel::solve_with`], but maps any failure to `None`
    /// after logging it.
    pub fn solve_or_none(&self, options: &SolveOptions) -> Option<AdjustmentEquilibrium> {
        match self.solve_with(options) {
            Ok(equilibrium) => Some(equilibrium),
            Err(error) => {
                debug!("equilibrium solve failed: {error}");
                None
            }
        }
    }
}

/// Cost of moving from `previous` to `next` employment.
fn adjustment_cost(params: &AdjustmentParameters, next: f64, previous: f64) -> f64 {
    let tax = params.adjustment_cost;
    match params.adjustment_mode {
        AdjustmentMode::Firing => tax * (previous - next).max(0.0),
        AdjustmentMode::Full => tax * (next - previous).abs(),
        AdjustmentMode::Hiring => tax * (next - previous).max(0.0),
    }
}

/// Raw fixed point of the adjustment-cost solver.
///
/// Matrices are indexed by `(productivity state, previous employment state)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentCore {
    /// Market-clearing wage from the free-entry condition.
    pub wage: f64,
    /// Converged value function of an incumbent.
    pub value: DMatrix<f64>,
    /// Lowest staying productivity level per employment state.
    pub exit_thresholds: DVector<f64>,
    /// One for cells that exit, zero for cells that stay.
    pub exit_indicator: DMatrix<f64>,
    /// Stationary mass of firms at each cell.
    pub distribution: DMatrix<f64>,
    /// Mass of entrants per period.
    pub entrant_mass: f64,
    /// Index of the chosen employment grid point at each cell.
    pub policy: DMatrix<usize>,
    /// Employment chosen at each cell.
    pub employment: DMatrix<f64>,
    /// Output produced at each cell.
    pub output: DMatrix<f64>,
    /// Profit at each cell before adjustment costs.
    pub profits: DMatrix<f64>,
}

/// Cross-sectional and turnover statistics of an adjustment-cost steady
/// state. Rates are in percent except for the job turnover rate, which is a
/// share of production employment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentStats {
    /// Total mass of active firms.
    pub firm_mass: f64,
    /// Entrants per period relative to the firm mass, in percent.
    pub entry_rate: f64,
    /// Share of firms choosing to exit, in percent.
    pub endogenous_exit_rate: f64,
    /// Total exit rate including the exogenous hazard, in percent.
    pub exit_rate: f64,
    /// Entry rate plus exit rate, in percent.
    pub gross_turnover: f64,
    /// Production workers per firm.
    pub average_firm_size: f64,
    /// Workers per firm including overhead labor.
    pub average_firm_size_include_cf: Option<f64>,
    /// Production workers per entrant.
    pub average_entrant_size: f64,
    /// Workers per entrant including overhead labor.
    pub average_entrant_size_include_cf: Option<f64>,
    /// Production workers per entrant that survives its first exit decision.
    pub average_survivor_size: f64,
    /// Surviving entrant size including overhead labor.
    pub average_survivor_size_include_cf: Option<f64>,
    /// Production workers per exiting firm; `None` when no mass exits.
    pub average_exitor_size: Option<f64>,
    /// Exiting firm size including overhead labor.
    pub average_exitor_size_include_cf: Option<f64>,
    /// Total production labor demanded.
    pub aggregate_employment: f64,
    /// Production labor hired by the entering cohort.
    pub aggregate_employment_entrant: f64,
    /// Overhead workers across all firms.
    pub aggregate_employment_overhead: Option<f64>,
    /// Total employment including overhead workers.
    pub aggregate_employment_include_cf: Option<f64>,
    /// Overhead workers hired by the entering cohort.
    pub aggregate_employment_overhead_entrant: Option<f64>,
    /// Entrant employment including overhead workers.
    pub aggregate_employment_include_cf_entrant: Option<f64>,
    /// Total output produced.
    pub aggregate_output: f64,
    /// Output per firm.
    pub average_output: f64,
    /// Total profits net of fixed and adjustment costs.
    pub aggregate_profit: f64,
    /// Profit per firm.
    pub average_profit: f64,
    /// Firm-mass weighted productivity.
    pub aggregate_productivity: f64,
    /// Aggregate productivity per unit of firm mass.
    pub average_productivity: f64,
    /// Firm-mass weighted incumbent value.
    pub aggregate_value: f64,
    /// Aggregate value per unit of firm mass.
    pub average_value: f64,
    /// Output over production labor raised to the curvature.
    pub productivity_residual: f64,
    /// Total adjustment costs paid, severance included.
    pub aggregate_adjustment_cost: f64,
    /// Jobs created or destroyed per unit of production employment.
    pub job_turnover_rate: f64,
    /// Share of a cohort still active after ten periods, in percent.
    pub survival_rate_10: f64,
    /// Size growth of ten-period survivors relative to entrants, in percent.
    pub growth_rate_10: f64,
    /// Share of a cohort still active after twenty periods, in percent.
    pub survival_rate_20: f64,
    /// Size growth of twenty-period survivors relative to entrants, in percent.
    pub growth_rate_20: f64,
}

/// A solved adjustment-cost steady state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentEquilibrium {
    pub(crate) params: AdjustmentParameters,
    pub(crate) levels: DVector<f64>,
    pub(crate) transition: DMatrix<f64>,
    pub(crate) employment_grid: DVector<f64>,
    pub(crate) entrant_weights: DVector<f64>,
    pub(crate) core: AdjustmentCore,
    pub(crate) stats: AdjustmentStats,
    pub(crate) size_distribution: SizeDistribution,
}

impl AdjustmentEquilibrium {
    fn new(
        params: AdjustmentParameters,
        levels: DVector<f64>,
        transition: DMatrix<f64>,
        employment_grid: DVector<f64>,
        entrant_weights: DVector<f64>,
        core: AdjustmentCore,
        aggregate_adjustment_cost: f64,
    ) -> Self {
        let stats = AdjustmentStats::derive(
            &params,
            &levels,
            &transition,
            &employment_grid,
            &entrant_weights,
            &core,
            aggregate_adjustment_cost,
        );

        let s = levels.len();
        let n = employment_grid.len();
        let flat_distribution = DVector::from_column_slice(core.distribution.as_slice());
        let flat_employment = DVector::from_column_slice(core.employment.as_slice());
        let flat_entrants = DVector::from_fn(s * n, |index, _| {
            if index < s {
                entrant_weights[index]
            } else {
                0.0
            }
        });
        let size_distribution = SizeDistribution::derive(
            &params.base.size_thresholds,
            &flat_distribution,
            &flat_entrants,
            &flat_employment,
            params.base.fixed_cost,
            params.base.fixed_cost_unit,
        );

        Self {
            params,
            levels,
            transition,
            employment_grid,
            entrant_weights,
            core,
            stats,
            size_distribution,
        }
    }

    /// Primitives the equilibrium was solved under.
    pub fn params(&self) -> &AdjustmentParameters {
        &self.params
    }

    /// Productivity levels of the underlying grid.
    pub fn levels(&self) -> &DVector<f64> {
        &self.levels
    }

    /// Transition matrix of the underlying grid.
    pub fn transition(&self) -> &DMatrix<f64> {
        &self.transition
    }

    /// Employment levels firms can choose from.
    pub fn employment_grid(&self) -> &DVector<f64> {
        &self.employment_grid
    }

    /// Entrant probability mass over the productivity grid.
    pub fn entrant_weights(&self) -> &DVector<f64> {
        &self.entrant_weights
    }

    /// Market-clearing wage.
    pub fn wage(&self) -> f64 {
        self.core.wage
    }

    /// Converged incumbent value function.
    pub fn value(&self) -> &DMatrix<f64> {
        &self.core.value
    }

    /// Lowest staying productivity level per employment state.
    pub fn exit_thresholds(&self) -> &DVector<f64> {
        &self.core.exit_thresholds
    }

    /// One for cells that exit, zero for cells that stay.
    pub fn exit_indicator(&self) -> &DMatrix<f64> {
        &self.core.exit_indicator
    }

    /// Stationary mass of firms at each cell.
    pub fn distribution(&self) -> &DMatrix<f64> {
        &self.core.distribution
    }

    /// Mass of entrants per period.
    pub fn entrant_mass(&self) -> f64 {
        self.core.entrant_mass
    }

    /// Index of the chosen employment grid point at each cell.
    pub fn policy(&self) -> &DMatrix<usize> {
        &self.core.policy
    }

    /// Employment chosen at each cell.
    pub fn employment(&self) -> &DMatrix<f64> {
        &self.core.employment
    }

    /// Output produced at each cell.
    pub fn output(&self) -> &DMatrix<f64> {
        &self.core.output
    }

    /// Derived cross-sectional statistics.
    pub fn stats(&self) -> &AdjustmentStats {
        &self.stats
    }

    /// Firm and employment shares across size classes.
    pub fn size_distribution(&self) -> &SizeDistribution {
        &self.size_distribution
    }

    /// Survival and size growth of an entering cohort after `age` periods.
    pub fn survival_stat(&self, age: usize) -> SurvivalStat {
        let sizes = self.growth_sizes();
        let (survival_rate, growth_rate) = cohort_survival_cells(
            &self.transition,
            &self.core.exit_indicator,
            &self.core.policy,
            &self.entrant_weights,
            self.params.base.exogenous_exit,
            &sizes,
            age,
        );
        SurvivalStat {
            age,
            survival_rate,
            growth_rate,
        }
    }

    /// Per-cell firm size used for growth comparisons.
    fn growth_sizes(&self) -> DMatrix<f64> {
        match self.params.base.fixed_cost_unit {
            FixedCostUnit::Labor => self.core.employment.add_scalar(self.params.base.fixed_cost),
            FixedCostUnit::Goods => self.core.employment.clone(),
        }
    }
}

impl AdjustmentStats {
    fn derive(
        params: &AdjustmentParameters,
        levels: &DVector<f64>,
        transition: &DMatrix<f64>,
        employment_grid: &DVector<f64>,
        entrant_weights: &DVector<f64>,
        core: &AdjustmentCore,
        aggregate_adjustment_cost: f64,
    ) -> Self {
        let p = &params.base;
        let s = transition.nrows();
        let distribution = &core.distribution;
        let firm_mass = distribution.sum();

        let entry_rate = core.entrant_mass / firm_mass * 100.0 * (1.0 + p.labor_growth);
        let exit_mass = distribution.component_mul(&core.exit_indicator);
        let exit_total = exit_mass.sum();
        let endogenous_exit_rate = exit_total / firm_mass * 100.0;
        let exit_rate = endogenous_exit_rate + (100.0 - endogenous_exit_rate) * p.exogenous_exit;

        let aggregate_employment = distribution.dot(&core.employment);
        let aggregate_output = distribution.dot(&core.output);
        let aggregate_profit = distribution.dot(&core.profits) - aggregate_adjustment_cost;
        let aggregate_productivity = (0..s)
            .map(|i| levels[i] * distribution.row(i).sum())
            .sum::<f64>()
            / firm_mass;
        let aggregate_value = distribution.dot(&core.value) / firm_mass;

        let include_cf = p.fixed_cost_unit == FixedCostUnit::Labor;
        let sizes_cf = core.employment.add_scalar(p.fixed_cost);
        let entrant_size = (0..s)
            .map(|i| entrant_weights[i] * core.employment[(i, 0)])
            .sum::<f64>();
        let entrant_size_cf = (0..s)
            .map(|i| entrant_weights[i] * sizes_cf[(i, 0)])
            .sum::<f64>();

        // entrants face the exit decision of the lowest employment state
        let survivors = DVector::from_fn(s, |i, _| {
            entrant_weights[i] * (1.0 - core.exit_indicator[(i, 0)])
        });
        let survivor_total = survivors.sum();
        let survivor_size = (0..s)
            .map(|i| survivors[i] * core.employment[(i, 0)])
            .sum::<f64>()
            / survivor_total;
        let survivor_size_cf = (0..s)
            .map(|i| survivors[i] * sizes_cf[(i, 0)])
            .sum::<f64>()
            / survivor_total;

        // jobs reshuffled by incumbents plus jobs created by entrants
        let mut reshuffled = 0.0;
        for j in 0..employment_grid.len() {
            let previous = employment_grid[j];
            for i in 0..s {
                let kept = core.employment[(i, j)] * (1.0 - core.exit_indicator[(i, j)]);
                reshuffled += distribution[(i, j)] * (kept - previous).abs();
            }
        }
        let created = core.entrant_mass * entrant_size;
        let job_turnover_rate = (reshuffled + created) / aggregate_employment;

        let growth_sizes = if include_cf {
            sizes_cf.clone()
        } else {
            core.employment.clone()
        };
        let (survival_rate_10, growth_rate_10) = cohort_survival_cells(
            transition,
            &core.exit_indicator,
            &core.policy,
            entrant_weights,
            p.exogenous_exit,
            &growth_sizes,
            10,
        );
        let (survival_rate_20, growth_rate_20) = cohort_survival_cells(
            transition,
            &core.exit_indicator,
            &core.policy,
            entrant_weights,
            p.exogenous_exit,
            &growth_sizes,
            20,
        );

        Self {
            firm_mass,
            entry_rate,
            endogenous_exit_rate,
            exit_rate,
            gross_turnover: entry_rate + exit_rate,
            average_firm_size: aggregate_employment / firm_mass,
            average_firm_size_include_cf: include_cf
                .then(|| distribution.dot(&sizes_cf) / firm_mass),
            average_entrant_size: entrant_size,
            average_entrant_size_include_cf: include_cf.then_some(entrant_size_cf),
            average_survivor_size: survivor_size,
            average_survivor_size_include_cf: include_cf.then_some(survivor_size_cf),
            average_exitor_size: (exit_total > 0.0)
                .then(|| exit_mass.dot(&core.employment) / exit_total),
            average_exitor_size_include_cf: (include_cf && exit_total > 0.0)
                .then(|| exit_mass.dot(&sizes_cf) / exit_total),
            aggregate_employment,
            aggregate_employment_entrant: core.entrant_mass * entrant_size,
            aggregate_employment_overhead: include_cf.then(|| p.fixed_cost * firm_mass),
            aggregate_employment_include_cf: include_cf.then(|| distribution.dot(&sizes_cf)),
            aggregate_employment_overhead_entrant: include_cf
                .then(|| p.fixed_cost * core.entrant_mass),
            aggregate_employment_include_cf_entrant: include_cf
                .then(|| core.entrant_mass * entrant_size_cf),
            aggregate_output,
            average_output: aggregate_output / firm_mass,
            aggregate_profit,
            average_profit: aggregate_profit / firm_mass,
            aggregate_productivity,
            average_productivity: aggregate_productivity / firm_mass,
            aggregate_value,
            average_value: aggregate_value / firm_mass,
            productivity_residual: aggregate_output / aggregate_employment.powf(p.curvature),
            aggregate_adjustment_cost,
            job_turnover_rate,
            survival_rate_10,
            growth_rate_10,
            survival_rate_20,
            growth_rate_20,
        }
    }
}

/// Push an entering cohort through `age` rounds of exit, reshuffling, and
/// employment choices. The cohort starts at the lowest employment state.
fn cohort_survival_cells(
    transition: &DMatrix<f64>,
    exit_indicator: &DMatrix<f64>,
    policy: &DMatrix<usize>,
    entrant_weights: &DVector<f64>,
    exogenous_exit: f64,
    sizes: &DMatrix<f64>,
    age: usize,
) -> (f64, f64) {
    let s = exit_indicator.nrows();
    let n = exit_indicator.ncols();
    let mut pdf = DMatrix::zeros(s, n);
    for i in 0..s {
        pdf[(i, 0)] = entrant_weights[i];
    }
    for _ in 0..age {
        let mut next = DMatrix::zeros(s, n);
        for j in 0..n {
            for i in 0..s {
                let outflow =
                    pdf[(i, j)] * (1.0 - exit_indicator[(i, j)]) * (1.0 - exogenous_exit);
                if outflow != 0.0 {
                    let k = policy[(i, j)];
                    for destination in 0..s {
                        next[(destination, k)] += outflow * transition[(i, destination)];
                    }
                }
            }
        }
        pdf = next;
    }
    let survival = pdf.sum();
    let survivor_size = pdf.dot(sizes) / survival;
    let entrant_size = (0..s)
        .map(|i| entrant_weights[i] * sizes[(i, 0)])
        .sum::<f64>();
    (
        survival * 100.0,
        (survivor_size / entrant_size - 1.0) * 100.0,
    )
}
