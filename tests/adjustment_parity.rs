use approx::{assert_abs_diff_eq, assert_relative_eq};
use hopenhayn::{
    AdjustmentModel, AdjustmentParameters, EquilibriumMode, Model, Parameters, RootOptions,
    SolveOptions,
};

/// A lighter calibration for the two-dimensional solver: fewer productivity
/// states and a lower discount factor so the Bellman iteration contracts
/// quickly.
fn base() -> Parameters {
    Parameters::new(10.0, 5.0, 15, 0.14, 0.9, 0.2, 1.0, 0.4)
        .with_discount(0.9)
        .with_mode(EquilibriumMode::BalancedGrowth)
        .with_labor_disutility(0.0)
}

/// The discretized wage root needs less precision than the default; the
/// employment grid quantizes the objective well above that anyway.
fn options() -> SolveOptions {
    SolveOptions::default().with_wage_root(RootOptions {
        tolerance: 1e-9,
        max_iterations: 200,
    })
}

/// With a zero adjustment tax the previous workforce is irrelevant, so the
/// two-dimensional model must collapse to the frictionless one up to the
/// coarseness of the employment grid.
#[test]
fn zero_tax_collapses_to_the_frictionless_model() {
    let frictionless = Model::new(base()).unwrap().solve().unwrap();
    let taxed = AdjustmentModel::new(
        AdjustmentParameters::new(base()).with_employment_grid(120, 5_000.0),
    )
    .unwrap()
    .solve_with(&options())
    .unwrap();

    assert_relative_eq!(taxed.wage(), 1.223876, max_relative = 1e-3);
    assert_relative_eq!(taxed.wage(), frictionless.wage(), max_relative = 2e-3);
    assert_abs_diff_eq!(
        taxed.stats().entry_rate,
        frictionless.stats().entry_rate,
        epsilon = 0.1
    );
    assert_relative_eq!(
        taxed.stats().average_firm_size_include_cf.unwrap(),
        frictionless.stats().average_firm_size_include_cf.unwrap(),
        max_relative = 0.01
    );
    assert_relative_eq!(
        taxed.stats().average_output,
        frictionless.stats().average_output,
        max_relative = 0.05
    );
    assert_relative_eq!(
        taxed.stats().aggregate_productivity,
        frictionless.stats().aggregate_productivity,
        max_relative = 0.05
    );

    // same productivity grid, so matching thresholds are bitwise matches
    for j in 0..taxed.employment_grid().len() {
        assert_abs_diff_eq!(
            taxed.exit_thresholds()[j],
            frictionless.exit_threshold(),
            epsilon = 1e-12
        );
    }

    // nothing is taxed, yet workforces still churn with productivity
    assert_eq!(taxed.stats().aggregate_adjustment_cost, 0.0);
    assert!(taxed.stats().job_turnover_rate > 0.0);
}

/// A firing tax must actually collect revenue, slow job reallocation, and
/// depress the free-entry wage relative to the frictionless benchmark.
#[test]
fn firing_tax_collects_revenue_and_dampens_turnover() {
    let grid = |tax: f64| {
        AdjustmentModel::new(
            AdjustmentParameters::new(base())
                .with_employment_grid(60, 5_000.0)
                .with_adjustment_cost(tax),
        )
        .unwrap()
        .solve_with(&options())
        .unwrap()
    };
    let frictionless = grid(0.0);
    let taxed = grid(0.1);

    assert!(taxed.stats().aggregate_adjustment_cost > 0.0);
    assert!(taxed.stats().job_turnover_rate > 0.0);
    assert!(taxed.stats().job_turnover_rate < frictionless.stats().job_turnover_rate);
    assert!(taxed.wage() < frictionless.wage());
    assert!(taxed.stats().firm_mass > 0.0);
    assert!(taxed.entrant_mass() > 0.0);

    // a stationary distribution without growth still balances entry and exit
    assert_abs_diff_eq!(
        taxed.stats().entry_rate,
        taxed.stats().exit_rate,
        epsilon = 5e-2
    );
}

/// The stats block keeps its accounts straight even when the tax redirects
/// part of output into adjustment payments.
#[test]
fn aggregate_accounts_stay_consistent_under_a_firing_tax() {
    let taxed = AdjustmentModel::new(
        AdjustmentParameters::new(base())
            .with_employment_grid(60, 5_000.0)
            .with_adjustment_cost(0.1),
    )
    .unwrap()
    .solve_with(&options())
    .unwrap();
    let stats = taxed.stats();

    let overhead = stats.aggregate_employment_overhead.unwrap();
    assert_relative_eq!(
        overhead,
        taxed.params().base.fixed_cost * stats.firm_mass,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.aggregate_employment_include_cf.unwrap(),
        stats.aggregate_employment + overhead,
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
    assert_relative_eq!(
        stats.average_value * stats.firm_mass,
        stats.aggregate_value,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        stats.productivity_residual,
        stats.aggregate_output / stats.aggregate_employment.powf(taxed.params().base.curvature),
        max_relative = 1e-12
    );

    // selection works at both ends of the size ladder
    assert!(stats.average_exitor_size.unwrap() < stats.average_firm_size);
    assert!(stats.average_survivor_size > stats.average_entrant_size);

    // free entry holds in the taxed economy too
    let entry_value = (0..taxed.levels().len())
        .map(|i| taxed.entrant_weights()[i] * taxed.value()[(i, 0)])
        .sum::<f64>();
    assert_abs_diff_eq!(entry_value, taxed.params().base.entry_cost, epsilon = 1e-4);
}
