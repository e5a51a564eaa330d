use approx::{assert_abs_diff_eq, assert_relative_eq};
use hopenhayn::{
    EquilibriumMode, ExitTiming, FailureKind, HopenhaynError, Model, Parameters, SizeDistribution,
};

/// Canonical calibration: a fifty-point grid for a persistent log AR(1) with
/// lognormal entrant draws, solved on a balanced growth path with a constant
/// labor force.
fn baseline() -> Parameters {
    Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
        .with_mode(EquilibriumMode::BalancedGrowth)
        .with_labor_disutility(0.0)
}

/// Regression values for the baseline calibration.
#[test]
fn baseline_balanced_growth_matches_reference_values() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();

    assert_relative_eq!(eq.wage(), 1.402434, max_relative = 1e-4);
    assert_abs_diff_eq!(eq.stats().entry_rate, 3.193799, epsilon = 1e-2);
    assert_relative_eq!(eq.stats().firm_mass, 0.053478, max_relative = 1e-3);
    assert_relative_eq!(eq.entrant_mass(), 0.001708, max_relative = 1e-3);
    assert_relative_eq!(
        eq.stats().average_firm_size_include_cf.unwrap(),
        18.699391,
        max_relative = 1e-3
    );
    assert_relative_eq!(
        eq.stats().average_entrant_size_include_cf.unwrap(),
        7.164008,
        max_relative = 1e-3
    );

    // the threshold is a grid level, so its position is exact
    let index = eq
        .levels()
        .iter()
        .position(|&level| level == eq.exit_threshold())
        .unwrap();
    assert_eq!(index, 16);
}

/// Without labor force growth or an exogenous hazard, a stationary
/// distribution forces entry and exit to balance exactly.
#[test]
fn entry_balances_exit_without_growth_or_hazards() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let stats = eq.stats();

    assert_abs_diff_eq!(stats.entry_rate, stats.exit_rate, epsilon = 1e-9);
    assert_abs_diff_eq!(stats.exit_rate, stats.endogenous_exit_rate, epsilon = 1e-12);
    assert_abs_diff_eq!(
        stats.gross_turnover,
        stats.entry_rate + stats.exit_rate,
        epsilon = 1e-12
    );
}

/// Total employment splits into production and overhead workers, for the
/// whole industry and for the entering cohort, and each per-firm average
/// scales back up to its aggregate.
#[test]
fn employment_output_and_profit_aggregates_decompose() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let stats = eq.stats();

    assert_relative_eq!(stats.aggregate_output, 1.605374, max_relative = 1e-3);
    assert_relative_eq!(stats.aggregate_profit, 0.202940, max_relative = 1e-2);
    assert_relative_eq!(stats.aggregate_employment_entrant, 0.003696, max_relative = 1e-3);

    // productivity and value averages divide the pmf-weighted means by the
    // firm mass again
    assert_relative_eq!(stats.aggregate_productivity, 4.742535, max_relative = 1e-3);
    assert_relative_eq!(stats.average_productivity, 88.682516, max_relative = 5e-3);
    assert_relative_eq!(stats.average_value, 1630.704593, max_relative = 5e-3);

    let overhead = stats.aggregate_employment_overhead.unwrap();
    assert_relative_eq!(
        overhead,
        eq.params().fixed_cost * stats.firm_mass,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.aggregate_employment_include_cf.unwrap(),
        stats.aggregate_employment + overhead,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.aggregate_employment_entrant,
        eq.entrant_mass() * stats.average_entrant_size,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.aggregate_employment_include_cf_entrant.unwrap(),
        stats.aggregate_employment_entrant
            + stats.aggregate_employment_overhead_entrant.unwrap(),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.average_output * stats.firm_mass,
        stats.aggregate_output,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.average_profit * stats.firm_mass,
        stats.aggregate_profit,
        max_relative = 1e-12
    );

    // with unit labor supply the market clears counting overhead workers
    assert_abs_diff_eq!(stats.aggregate_employment_include_cf.unwrap(), 1.0, epsilon = 1e-6);
}

/// At the solved wage the expected value of entering just repays the entry
/// ticket, leaving no rents to attract further entrants.
#[test]
fn free_entry_extracts_all_entrant_rents() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();

    let entry_value = eq.entrant_weights().dot(eq.value());
    assert_abs_diff_eq!(entry_value, eq.params().entry_cost, epsilon = 1e-6);
}

/// One period after entry, the surviving share is the complement of the
/// entrant mass that lands below the exit threshold.
#[test]
fn first_year_survival_complements_entrant_exit() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();

    let entrant_exit_share = eq.entrant_weights().dot(eq.exit_indicator()) * 100.0;
    let survival = eq.survival_stat(1);
    assert_abs_diff_eq!(survival.survival_rate, 100.0 - entrant_exit_share, epsilon = 1e-8);
    assert_abs_diff_eq!(survival.survival_rate, 61.284157, epsilon = 1e-2);
}

/// Selection thins cohorts over time while the survivors outgrow the
/// entrants they started among.
#[test]
fn cohort_survival_declines_and_growth_rises_with_age() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let stats = eq.stats();

    assert_abs_diff_eq!(stats.survival_rate_10, 41.9372, epsilon = 5e-2);
    assert_abs_diff_eq!(stats.growth_rate_10, 125.6395, epsilon = 5e-1);
    assert_abs_diff_eq!(stats.survival_rate_20, 34.6154, epsilon = 5e-2);
    assert_abs_diff_eq!(stats.growth_rate_20, 173.3503, epsilon = 5e-1);
    assert!(stats.survival_rate_20 < stats.survival_rate_10);
    assert!(stats.growth_rate_20 > stats.growth_rate_10);

    // the age-10 and age-20 columns are the same statistic at two ages
    let ten = eq.survival_stat(10);
    let twenty = eq.survival_stat(20);
    assert_abs_diff_eq!(ten.survival_rate, stats.survival_rate_10, epsilon = 1e-12);
    assert_abs_diff_eq!(twenty.growth_rate, stats.growth_rate_20, epsilon = 1e-12);
}

/// A costlier entry ticket must be paid for by a more profitable industry,
/// so the free-entry wage falls and turnover slows.
#[test]
fn higher_entry_cost_lowers_the_wage_and_entry() {
    let cheap = Model::new(baseline()).unwrap().solve().unwrap();
    let pricey = Model::new(
        Parameters::new(20.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::BalancedGrowth)
            .with_labor_disutility(0.0),
    )
    .unwrap()
    .solve()
    .unwrap();

    assert_relative_eq!(pricey.wage(), 1.347762, max_relative = 1e-4);
    assert_abs_diff_eq!(pricey.stats().entry_rate, 1.008197, epsilon = 1e-2);
    assert!(pricey.wage() < cheap.wage());
    assert!(pricey.stats().entry_rate < cheap.stats().entry_rate);
}

/// Free entry alone pins down the wage, so switching the closure only
/// rescales the economy; the household's budget then fixes its size.
#[test]
fn general_equilibrium_spends_the_household_budget() {
    let bgp = Model::new(baseline()).unwrap().solve().unwrap();
    let ge = Model::new(
        Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::General)
            .with_labor_disutility(0.6),
    )
    .unwrap()
    .solve()
    .unwrap();

    assert_relative_eq!(ge.wage(), bgp.wage(), max_relative = 1e-9);
    assert_relative_eq!(ge.stats().entry_rate, bgp.stats().entry_rate, max_relative = 1e-6);
    assert_relative_eq!(ge.entrant_mass(), 0.00329, max_relative = 5e-3);

    let overhead = ge.params().fixed_cost * ge.stats().firm_mass;
    let demand = ge.stats().aggregate_employment + overhead;
    assert_relative_eq!(demand, 1.926473, max_relative = 1e-3);
}

/// In partial equilibrium the solved allocation must sit on the isoelastic
/// labor supply curve.
#[test]
fn partial_equilibrium_tracks_the_labor_supply_curve() {
    let eq = Model::new(
        Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::Partial)
            .with_supply_elasticity(2.0),
    )
    .unwrap()
    .solve()
    .unwrap();

    assert_relative_eq!(eq.wage(), 1.402434, max_relative = 1e-4);
    let overhead = eq.params().fixed_cost * eq.stats().firm_mass;
    let demand = eq.stats().aggregate_employment + overhead;
    assert_relative_eq!(demand, eq.wage().powf(2.0), max_relative = 1e-7);
}

/// With the labor force growing at rate eta, entry must outrun exit by
/// exactly 100 * eta percentage points to keep per-capita masses stationary.
#[test]
fn growth_drives_a_wedge_between_entry_and_exit() {
    let eq = Model::new(
        Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::BalancedGrowth)
            .with_labor_disutility(0.0)
            .with_labor_growth(0.02),
    )
    .unwrap()
    .solve()
    .unwrap();

    assert_abs_diff_eq!(eq.stats().entry_rate, 6.989543, epsilon = 1e-2);
    assert_abs_diff_eq!(
        eq.stats().entry_rate - eq.stats().exit_rate,
        2.0,
        epsilon = 1e-8
    );
}

/// When firms exit after observing the shock, every firm below the threshold
/// leaves before the distribution is recorded, so measured endogenous exit
/// is zero and turnover shows up through the entrant discount instead.
#[test]
fn after_shock_timing_has_no_measured_endogenous_exit() {
    let before = Model::new(baseline()).unwrap().solve().unwrap();
    let after = Model::new(
        Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::BalancedGrowth)
            .with_labor_disutility(0.0)
            .with_timing(ExitTiming::AfterShock),
    )
    .unwrap()
    .solve()
    .unwrap();

    assert_eq!(after.stats().endogenous_exit_rate, 0.0);
    assert_relative_eq!(after.wage(), 1.44744, max_relative = 1e-4);
    assert_abs_diff_eq!(after.stats().entry_rate, 5.278371, epsilon = 1e-2);

    let index = |eq: &hopenhayn::Equilibrium| {
        eq.levels()
            .iter()
            .position(|&level| level == eq.exit_threshold())
            .unwrap()
    };
    assert_eq!(index(&after), 20);
    assert!(index(&after) > index(&before));
}

/// A firm with no overhead never operates at a loss, so nothing ever exits
/// and no stationary distribution exists.
#[test]
fn zero_fixed_cost_leaves_no_reason_to_exit() {
    let error = Model::new(
        Parameters::new(10.0, 0.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::BalancedGrowth)
            .with_labor_disutility(0.0),
    )
    .unwrap()
    .solve()
    .unwrap_err();

    assert!(matches!(error, HopenhaynError::NoExit));
    assert_eq!(error.kind(), FailureKind::Degenerate);
}

/// Every share table partitions its population, with and without overhead
/// workers counted toward firm size.
#[test]
fn size_distribution_shares_sum_to_one_hundred() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let table = eq.size_distribution();

    let total = |shares: &[f64]| shares.iter().sum::<f64>();
    assert_abs_diff_eq!(total(&table.firm_shares), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(total(&table.employment_shares), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(total(&table.entrant_firm_shares), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(total(&table.entrant_employment_shares), 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        total(table.firm_shares_include_cf.as_ref().unwrap()),
        100.0,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        total(table.employment_shares_include_cf.as_ref().unwrap()),
        100.0,
        epsilon = 1e-9
    );

    // overhead workers push small firms into higher classes
    let plain_smallest = table.firm_shares[0];
    let padded_smallest = table.firm_shares_include_cf.as_ref().unwrap()[0];
    assert!(padded_smallest <= plain_smallest);
}

/// A solved equilibrium survives a JSON round trip bit for bit.
#[test]
fn equilibrium_serializes_and_round_trips() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let encoded = serde_json::to_string(&eq).unwrap();
    let decoded: hopenhayn::Equilibrium = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.wage(), eq.wage());
    assert_eq!(decoded.exit_threshold(), eq.exit_threshold());
    assert_eq!(decoded.entrant_mass(), eq.entrant_mass());
    assert_eq!(decoded.stats().entry_rate, eq.stats().entry_rate);
    assert_eq!(decoded.distribution(), eq.distribution());

    // the stored share table is a pure function of the decoded state
    let rederived = SizeDistribution::derive(
        &decoded.params().size_thresholds,
        decoded.distribution(),
        decoded.entrant_weights(),
        decoded.employment(),
        decoded.params().fixed_cost,
        decoded.params().fixed_cost_unit,
    );
    assert_eq!(rederived, *decoded.size_distribution());
}

/// Solving the same calibration twice yields bitwise identical equilibria.
#[test]
fn identical_inputs_solve_to_identical_equilibria() {
    let first = Model::new(baseline()).unwrap().solve().unwrap();
    let second = Model::new(baseline()).unwrap().solve().unwrap();

    assert_eq!(first.wage(), second.wage());
    assert_eq!(first.entrant_mass(), second.entrant_mass());
    assert_eq!(first.distribution(), second.distribution());
    assert_eq!(first.value(), second.value());
    assert_eq!(first.stats().aggregate_output, second.stats().aggregate_output);
}

/// Feeding the steady state its own growth rate must reproduce it period
/// after period.
#[test]
fn stationary_transition_path_is_flat_without_growth() {
    let eq = Model::new(baseline()).unwrap().solve().unwrap();
    let path = eq.transition_path(&[0.0, 0.0, 0.0]).unwrap();
    assert_eq!(path.len(), 4);

    let start = &path[0];
    for period in &path[1..] {
        assert_abs_diff_eq!(period.labor_supply, 1.0, epsilon = 1e-12);
        assert_relative_eq!(period.firm_mass, start.firm_mass, max_relative = 1e-6);
        assert_relative_eq!(period.entrant_mass, start.entrant_mass, max_relative = 1e-6);
        assert_relative_eq!(period.entry_rate, start.entry_rate, max_relative = 1e-6);
        assert_relative_eq!(period.exit_rate, start.exit_rate, max_relative = 1e-6);
        assert_relative_eq!(period.average_size, start.average_size, max_relative = 1e-6);
    }
}

/// On a balanced growth path, masses scale with the labor force while rates
/// and average sizes stay put.
#[test]
fn constant_growth_path_scales_masses_by_the_growth_rate() {
    let eq = Model::new(
        Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
            .with_mode(EquilibriumMode::BalancedGrowth)
            .with_labor_disutility(0.0)
            .with_labor_growth(0.02),
    )
    .unwrap()
    .solve()
    .unwrap();
    let path = eq.transition_path(&[0.02, 0.02, 0.02, 0.02]).unwrap();
    assert_eq!(path.len(), 5);

    for window in path.windows(2) {
        let (previous, current) = (&window[0], &window[1]);
        assert_relative_eq!(current.firm_mass / previous.firm_mass, 1.02, max_relative = 1e-6);
        assert_relative_eq!(
            current.entrant_mass / previous.entrant_mass,
            1.02,
            max_relative = 1e-6
        );
        assert_relative_eq!(current.entry_rate, previous.entry_rate, max_relative = 1e-6);
        assert_relative_eq!(current.exit_rate, previous.exit_rate, max_relative = 1e-6);
        assert_relative_eq!(current.average_size, previous.average_size, max_relative = 1e-6);
    }
    assert_abs_diff_eq!(path[0].entry_rate, eq.stats().entry_rate, epsilon = 1e-9);
}
