//! Equilibrium objects and the cross-sectional statistics derived from them.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::params::{FixedCostUnit, Parameters};

/// Raw fixed point of the steady-state solver.
///
/// Everything here is indexed by the productivity grid; derived statistics
/// live in [`AggregateStats`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquilibriumCore {
    /// Market-clearing wage from the free-entry condition.
    pub wage: f64,
    /// Converged value function of an incumbent.
    pub value: DVector<f64>,
    /// Lowest productivity level at which firms stay.
    pub exit_threshold: f64,
    /// One for states that exit, zero for states that stay.
    pub exit_indicator: DVector<f64>,
    /// Stationary mass of firms at each state.
    pub distribution: DVector<f64>,
    /// Mass of entrants per period.
    pub entrant_mass: f64,
    /// Employment chosen at each state.
    pub employment: DVector<f64>,
    /// Output produced at each state.
    pub output: DVector<f64>,
    /// Per-period profit at each state, net of the fixed cost.
    pub profits: DVector<f64>,
}

/// Cross-sectional and turnover statistics of a steady state.
///
/// Rates are reported in percent. The `*_include_cf` fields treat the fixed
/// cost as overhead workers and are only available when the fixed cost is
/// denominated in labor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateStats {
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
    /// Total profits net of fixed costs.
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
    /// Share of a cohort still active after ten periods, in percent.
    pub survival_rate_10: f64,
    /// Size growth of ten-period survivors relative to entrants, in percent.
    pub growth_rate_10: f64,
    /// Share of a cohort still active after twenty periods, in percent.
    pub survival_rate_20: f64,
    /// Size growth of twenty-period survivors relative to entrants, in percent.
    pub growth_rate_20: f64,
}

impl AggregateStats {
    pub(crate) fn derive(
        params: &Parameters,
        levels: &DVector<f64>,
        transition: &DMatrix<f64>,
        entrant_weights: &DVector<f64>,
        core: &EquilibriumCore,
    ) -> Self {
        let distribution = &core.distribution;
        let firm_mass = distribution.sum();
        let pmf = distribution / firm_mass;

        let entry_rate = core.entrant_mass / firm_mass * 100.0 * (1.0 + params.labor_growth);
        let endogenous_exit_rate = core.exit_indicator.dot(&pmf) * 100.0;
        let exit_rate =
            endogenous_exit_rate + (100.0 - endogenous_exit_rate) * params.exogenous_exit;

        let aggregate_employment = distribution.dot(&core.employment);
        let aggregate_output = distribution.dot(&core.output);
        let aggregate_profit = distribution.dot(&core.profits);
        let aggregate_productivity = pmf.dot(levels);
        let aggregate_value = pmf.dot(&core.value);

        let survive_mask = core.exit_indicator.map(|x| 1.0 - x);
        let survivors = entrant_weights.component_mul(&survive_mask);
        let survivor_pdf = &survivors / survivors.sum();

        let exit_mass = distribution.component_mul(&core.exit_indicator);
        let exit_total = exit_mass.sum();

        let include_cf = params.fixed_cost_unit == FixedCostUnit::Labor;
        let sizes_cf = core.employment.add_scalar(params.fixed_cost);
        let entrant_production = entrant_weights.dot(&core.employment);
        let growth_sizes = if include_cf {
            &sizes_cf
        } else {
            &core.employment
        };
        let (survival_rate_10, growth_rate_10) = cohort_survival(
            transition,
            &core.exit_indicator,
            entrant_weights,
            params.exogenous_exit,
            growth_sizes,
            10,
        );
        let (survival_rate_20, growth_rate_20) = cohort_survival(
            transition,
            &core.exit_indicator,
            entrant_weights,
            params.exogenous_exit,
            growth_sizes,
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
            average_entrant_size: entrant_production,
            average_entrant_size_include_cf: include_cf.then(|| entrant_weights.dot(&sizes_cf)),
            average_survivor_size: survivor_pdf.dot(&core.employment),
            average_survivor_size_include_cf: include_cf.then(|| survivor_pdf.dot(&sizes_cf)),
            average_exitor_size: (exit_total > 0.0)
                .then(|| exit_mass.dot(&core.employment) / exit_total),
            average_exitor_size_include_cf: (include_cf && exit_total > 0.0)
                .then(|| exit_mass.dot(&sizes_cf) / exit_total),
            aggregate_employment,
            aggregate_employment_entrant: core.entrant_mass * entrant_production,
            aggregate_employment_overhead: include_cf.then(|| params.fixed_cost * firm_mass),
            aggregate_employment_include_cf: include_cf.then(|| distribution.dot(&sizes_cf)),
            aggregate_employment_overhead_entrant: include_cf
                .then(|| params.fixed_cost * core.entrant_mass),
            aggregate_employment_include_cf_entrant: include_cf
                .then(|| core.entrant_mass * entrant_weights.dot(&sizes_cf)),
            aggregate_output,
            average_output: aggregate_output / firm_mass,
            aggregate_profit,
            average_profit: aggregate_profit / firm_mass,
            aggregate_productivity,
            average_productivity: aggregate_productivity / firm_mass,
            aggregate_value,
            average_value: aggregate_value / firm_mass,
            productivity_residual: aggregate_output / aggregate_employment.powf(params.curvature),
            survival_rate_10,
            growth_rate_10,
            survival_rate_20,
            growth_rate_20,
        }
    }
}

/// Survival and relative size of an entering cohort at a given age.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SurvivalStat {
    /// Periods elapsed since entry.
    pub age: usize,
    /// Share of the cohort still active, in percent.
    pub survival_rate: f64,
    /// Average survivor size relative to the average entrant, in percent.
    pub growth_rate: f64,
}

/// Push an entering cohort through `age` rounds of exit and reshuffling.
///
/// Returns the surviving share and the survivors' size growth, both in
/// percent. `sizes` fixes the notion of firm size used for growth.
pub(crate) fn cohort_survival(
    transition: &DMatrix<f64>,
    exit_indicator: &DVector<f64>,
    entrant_weights: &DVector<f64>,
    exogenous_exit: f64,
    sizes: &DVector<f64>,
    age: usize,
) -> (f64, f64) {
    let flow = transition.transpose();
    let keep = exit_indicator.map(|x| (1.0 - x) * (1.0 - exogenous_exit));
    let mut pdf = entrant_weights.clone();
    for _ in 0..age {
        pdf = &flow * pdf.component_mul(&keep);
    }
    let survival = pdf.sum();
    let survivor_size = pdf.dot(sizes) / survival;
    let entrant_size = entrant_weights.dot(sizes);
    (
        survival * 100.0,
        (survivor_size / entrant_size - 1.0) * 100.0,
    )
}

/// Firm and employment shares across employment size classes.
///
/// `thresholds` splits the employment line into `thresholds.len() + 1`
/// classes; a firm whose employment equals a cutoff lands in the class above
/// it. All shares are in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeDistribution {
    /// Employment cutoffs between adjacent size classes.
    pub thresholds: Vec<f64>,
    /// Share of firms in each class.
    pub firm_shares: Vec<f64>,
    /// Share of production employment in each class.
    pub employment_shares: Vec<f64>,
    /// Share of entrants in each class.
    pub entrant_firm_shares: Vec<f64>,
    /// Share of entrant employment in each class.
    pub entrant_employment_shares: Vec<f64>,
    /// Firm shares with overhead workers counted toward size.
    pub firm_shares_include_cf: Option<Vec<f64>>,
    /// Employment shares with overhead workers counted toward size.
    pub employment_shares_include_cf: Option<Vec<f64>>,
    /// Entrant shares with overhead workers counted toward size.
    pub entrant_firm_shares_include_cf: Option<Vec<f64>>,
    /// Entrant employment shares with overhead workers counted toward size.
    pub entrant_employment_shares_include_cf: Option<Vec<f64>>,
}

impl SizeDistribution {
    /// Index of the size class that `employment` falls into.
    pub fn bin_of(thresholds: &[f64], employment: f64) -> usize {
        thresholds.iter().filter(|&&cutoff| cutoff <= employment).count()
    }

    /// Tabulate firm and employment shares over the size classes.
    ///
    /// `distribution` weighs the population rows and `entrant_weights` the
    /// entrant rows; both may be flattened views of a two-dimensional state
    /// space as long as they align with `employment`.
    pub fn derive(
        thresholds: &[f64],
        distribution: &DVector<f64>,
        entrant_weights: &DVector<f64>,
        employment: &DVector<f64>,
        fixed_cost: f64,
        unit: FixedCostUnit,
    ) -> Self {
        let (firm_shares, employment_shares) = tabulate(thresholds, distribution, employment);
        let (entrant_firm_shares, entrant_employment_shares) =
            tabulate(thresholds, entrant_weights, employment);

        let include_cf = unit == FixedCostUnit::Labor;
        let sizes_cf = employment.add_scalar(fixed_cost);
        let (firm_cf, employment_cf) = if include_cf {
            let (f, e) = tabulate(thresholds, distribution, &sizes_cf);
            (Some(f), Some(e))
        } else {
            (None, None)
        };
        let (entrant_firm_cf, entrant_employment_cf) = if include_cf {
            let (f, e) = tabulate(thresholds, entrant_weights, &sizes_cf);
            (Some(f), Some(e))
        } else {
            (None, None)
        };

        Self {
            thresholds: thresholds.to_vec(),
            firm_shares,
            employment_shares,
            entrant_firm_shares,
            entrant_employment_shares,
            firm_shares_include_cf: firm_cf,
            employment_shares_include_cf: employment_cf,
            entrant_firm_shares_include_cf: entrant_firm_cf,
            entrant_employment_shares_include_cf: entrant_employment_cf,
        }
    }
}

/// Firm and size-weighted shares per class, in percent.
fn tabulate(
    thresholds: &[f64],
    weights: &DVector<f64>,
    sizes: &DVector<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let classes = thresholds.len() + 1;
    let mut firms = vec![0.0; classes];
    let mut labor = vec![0.0; classes];
    for (weight, size) in weights.iter().zip(sizes.iter()) {
        let class = SizeDistribution::bin_of(thresholds, *size);
        firms[class] += weight;
        labor[class] += weight * size;
    }
    let firm_total: f64 = firms.iter().sum();
    let labor_total: f64 = labor.iter().sum();
    (
        firms.iter().map(|f| f / firm_total * 100.0).collect(),
        labor.iter().map(|l| l / labor_total * 100.0).collect(),
    )
}

/// A solved steady state together with everything needed to interrogate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Equilibrium {
    pub(crate) params: Parameters,
    pub(crate) levels: DVector<f64>,
    pub(crate) transition: DMatrix<f64>,
    pub(crate) entrant_weights: DVector<f64>,
    pub(crate) core: EquilibriumCore,
    pub(crate) stats: AggregateStats,
    pub(crate) size_distribution: SizeDistribution,
}

impl Equilibrium {
    pub(crate) fn new(
        params: Parameters,
        levels: &DVector<f64>,
        transition: &DMatrix<f64>,
        entrant_weights: DVector<f64>,
        core: EquilibriumCore,
    ) -> Self {
        let stats = AggregateStats::derive(&params, levels, transition, &entrant_weights, &core);
        let size_distribution = SizeDistribution::derive(
            &params.size_thresholds,
            &core.distribution,
            &entrant_weights,
            &core.employment,
            params.fixed_cost,
            params.fixed_cost_unit,
        );
        Self {
            params,
            levels: levels.clone(),
            transition: transition.clone(),
            entrant_weights,
            core,
            stats,
            size_distribution,
        }
    }

    /// Primitives the equilibrium was solved under.
    pub fn params(&self) -> &Parameters {
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

    /// Entrant probability mass over the grid.
    pub fn entrant_weights(&self) -> &DVector<f64> {
        &self.entrant_weights
    }

    /// Market-clearing wage.
    pub fn wage(&self) -> f64 {
        self.core.wage
    }

    /// Converged incumbent value function.
    pub fn value(&self) -> &DVector<f64> {
        &self.core.value
    }

    /// Lowest productivity level at which firms stay.
    pub fn exit_threshold(&self) -> f64 {
        self.core.exit_threshold
    }

    /// One for states that exit, zero for states that stay.
    pub fn exit_indicator(&self) -> &DVector<f64> {
        &self.core.exit_indicator
    }

    /// Stationary mass of firms at each state.
    pub fn distribution(&self) -> &DVector<f64> {
        &self.core.distribution
    }

    /// Mass of entrants per period.
    pub fn entrant_mass(&self) -> f64 {
        self.core.entrant_mass
    }

    /// Employment chosen at each state.
    pub fn employment(&self) -> &DVector<f64> {
        &self.core.employment
    }

    /// Output produced at each state.
    pub fn output(&self) -> &DVector<f64> {
        &self.core.output
    }

    /// Per-period profit at each state.
    pub fn profits(&self) -> &DVector<f64> {
        &self.core.profits
    }

    /// Derived cross-sectional statistics.
    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Firm and employment shares across size classes.
    pub fn size_distribution(&self) -> &SizeDistribution {
        &self.size_distribution
    }

    /// Survival and size growth of an entering cohort after `age` periods.
    pub fn survival_stat(&self, age: usize) -> SurvivalStat {
        let sizes = match self.params.fixed_cost_unit {
            FixedCostUnit::Labor => self.core.employment.add_scalar(self.params.fixed_cost),
            FixedCostUnit::Goods => self.core.employment.clone(),
        };
        let (survival_rate, growth_rate) = cohort_survival(
            &self.transition,
            &self.core.exit_indicator,
            &self.entrant_weights,
            self.params.exogenous_exit,
            &sizes,
            age,
        );
        SurvivalStat {
            age,
            survival_rate,
            growth_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn bin_of_respects_left_closed_classes() {
        let thresholds = [10.0, 30.0, 100.0];
        assert_eq!(SizeDistribution::bin_of(&thresholds, 0.5), 0);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 9.99), 0);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 10.0), 1);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 29.9), 1);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 30.0), 2);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 100.0), 3);
        assert_eq!(SizeDistribution::bin_of(&thresholds, 5_000.0), 3);
    }

    #[test]
    fn size_distribution_shares_sum_to_one_hundred() {
        let distribution = DVector::from_vec(vec![0.4, 0.3, 0.2, 0.1]);
        let entrants = DVector::from_vec(vec![0.7, 0.2, 0.1, 0.0]);
        let employment = DVector::from_vec(vec![6.0, 15.0, 40.0, 200.0]);
        let table = SizeDistribution::derive(
            &[10.0, 30.0, 100.0],
            &distribution,
            &entrants,
            &employment,
            5.0,
            FixedCostUnit::Labor,
        );
        for shares in [
            &table.firm_shares,
            &table.employment_shares,
            &table.entrant_firm_shares,
            &table.entrant_employment_shares,
            table.firm_shares_include_cf.as_ref().unwrap(),
            table.employment_shares_include_cf.as_ref().unwrap(),
        ] {
            assert_relative_eq!(shares.iter().sum::<f64>(), 100.0, max_relative = 1e-12);
        }
        // each firm sits in exactly one class
        assert_relative_eq!(table.firm_shares[0], 40.0, max_relative = 1e-12);
        assert_relative_eq!(table.firm_shares[3], 10.0, max_relative = 1e-12);
        // counting overhead workers moves the smallest firms up a class
        assert_relative_eq!(
            table.firm_shares_include_cf.as_ref().unwrap()[0],
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn goods_denominated_fixed_cost_has_no_overhead_rows() {
        let distribution = DVector::from_vec(vec![0.5, 0.5]);
        let entrants = DVector::from_vec(vec![0.5, 0.5]);
        let employment = DVector::from_vec(vec![5.0, 50.0]);
        let table = SizeDistribution::derive(
            &[10.0],
            &distribution,
            &entrants,
            &employment,
            5.0,
            FixedCostUnit::Goods,
        );
        assert!(table.firm_shares_include_cf.is_none());
        assert!(table.entrant_employment_shares_include_cf.is_none());
    }

    #[test]
    fn cohort_survival_matches_a_two_state_hand_calculation() {
        let transition = DMatrix::from_row_slice(2, 2, &[0.7, 0.3, 0.4, 0.6]);
        let exit = DVector::from_vec(vec![1.0, 0.0]);
        let entrants = DVector::from_vec(vec![0.5, 0.5]);
        let sizes = DVector::from_vec(vec![1.0, 2.0]);

        let (survival, growth) = cohort_survival(&transition, &exit, &entrants, 0.0, &sizes, 1);
        assert_abs_diff_eq!(survival, 50.0, epsilon = 1e-12);
        // survivors: [0.2, 0.3] -> mean size 1.6 against entrant mean 1.5
        assert_abs_diff_eq!(growth, (1.6 / 1.5 - 1.0) * 100.0, epsilon = 1e-12);

        let (survival, _) = cohort_survival(&transition, &exit, &entrants, 0.0, &sizes, 2);
        assert_abs_diff_eq!(survival, 30.0, epsilon = 1e-12);

        // an exogenous hazard halves each cohort on top of selection
        let (survival, _) = cohort_survival(&transition, &exit, &entrants, 0.5, &sizes, 1);
        assert_abs_diff_eq!(survival, 25.0, epsilon = 1e-12);
    }

    #[test]
    fn aggregate_stats_reproduce_hand_computed_rates() {
        let params = Parameters::new(10.0, 5.0, 2, 0.0, 0.5, 0.2, 1.0, 0.4);
        let levels = DVector::from_vec(vec![1.0, 2.0]);
        let transition = DMatrix::from_row_slice(2, 2, &[0.5, 0.5, 0.5, 0.5]);
        let entrants = DVector::from_vec(vec![0.5, 0.5]);
        let core = EquilibriumCore {
            wage: 1.0,
            value: DVector::from_vec(vec![5.0, 15.0]),
            exit_threshold: 2.0,
            exit_indicator: DVector::from_vec(vec![1.0, 0.0]),
            distribution: DVector::from_vec(vec![0.3, 0.7]),
            entrant_mass: 0.1,
            employment: DVector::from_vec(vec![1.0, 2.0]),
            output: DVector::from_vec(vec![1.0, 3.0]),
            profits: DVector::from_vec(vec![-0.5, 0.5]),
        };
        let stats = AggregateStats::derive(&params, &levels, &transition, &entrants, &core);

        assert_relative_eq!(stats.firm_mass, 1.0, max_relative = 1e-12);
        assert_relative_eq!(stats.entry_rate, 10.0, max_relative = 1e-12);
        assert_relative_eq!(stats.endogenous_exit_rate, 30.0, max_relative = 1e-12);
        assert_relative_eq!(stats.exit_rate, 30.0, max_relative = 1e-12);
        assert_relative_eq!(stats.gross_turnover, 40.0, max_relative = 1e-12);
        assert_relative_eq!(stats.average_firm_size, 1.7, max_relative = 1e-12);
        assert_relative_eq!(
            stats.average_firm_size_include_cf.unwrap(),
            6.7,
            max_relative = 1e-12
        );
        assert_relative_eq!(stats.average_entrant_size, 1.5, max_relative = 1e-12);
        // only the high state's entrants survive the first decision
        assert_relative_eq!(stats.average_survivor_size, 2.0, max_relative = 1e-12);
        assert_relative_eq!(stats.average_exitor_size.unwrap(), 1.0, max_relative = 1e-12);
        assert_relative_eq!(stats.aggregate_output, 2.4, max_relative = 1e-12);
        assert_relative_eq!(stats.average_output, 2.4, max_relative = 1e-12);
        assert_relative_eq!(stats.aggregate_profit, 0.2, max_relative = 1e-12);
        assert_relative_eq!(stats.average_profit, 0.2, max_relative = 1e-12);
    }

    #[test]
    fn employment_aggregates_split_into_production_overhead_and_entrants() {
        let params = Parameters::new(10.0, 5.0, 2, 0.0, 0.5, 0.2, 1.0, 0.4);
        let levels = DVector::from_vec(vec![1.0, 2.0]);
        let transition = DMatrix::from_row_slice(2, 2, &[0.5, 0.5, 0.5, 0.5]);
        let entrants = DVector::from_vec(vec![0.5, 0.5]);
        let core = EquilibriumCore {
            wage: 1.0,
            value: DVector::from_vec(vec![5.0, 15.0]),
            exit_threshold: 2.0,
            exit_indicator: DVector::from_vec(vec![1.0, 0.0]),
            distribution: DVector::from_vec(vec![0.3, 0.7]),
            entrant_mass: 0.1,
            employment: DVector::from_vec(vec![1.0, 2.0]),
            output: DVector::from_vec(vec![1.0, 3.0]),
            profits: DVector::from_vec(vec![-0.5, 0.5]),
        };
        let stats = AggregateStats::derive(&params, &levels, &transition, &entrants, &core);

        assert_relative_eq!(stats.aggregate_employment, 1.7, max_relative = 1e-12);
        assert_relative_eq!(stats.aggregate_employment_entrant, 0.15, max_relative = 1e-12);
        assert_relative_eq!(
            stats.aggregate_employment_overhead.unwrap(),
            5.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            stats.aggregate_employment_include_cf.unwrap(),
            6.7,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            stats.aggregate_employment_overhead_entrant.unwrap(),
            0.5,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            stats.aggregate_employment_include_cf_entrant.unwrap(),
            0.65,
            max_relative = 1e-12
        );
    }
}
