//! Model primitives, policy settings, and their validation.

use serde::{Deserialize, Serialize};

use crate::error::{HopenhaynError, Result};

/// How the outside labor market closes the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquilibriumMode {
    /// Isoelastic labor supply `w^zeta`; the wage does not feed back into demand.
    Partial,
    /// Household labor supply `1/A - Pi/w` with aggregate profits rebated.
    General,
    /// Unit labor supply with the firm population growing at a fixed rate.
    BalancedGrowth,
}

/// When the exit decision is taken relative to the next productivity draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitTiming {
    /// Firms commit to exit before observing next period's productivity.
    BeforeShock,
    /// Firms observe the draw, then decide whether to produce at all.
    AfterShock,
}

/// Denomination of the per-period fixed operating cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedCostUnit {
    /// The fixed cost hires `fixed_cost` units of labor at the effective wage.
    Labor,
    /// The fixed cost is paid in units of output.
    Goods,
}

/// Which employment changes the adjustment-cost model penalizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentMode {
    /// Only reductions in employment are taxed.
    Firing,
    /// Any change in employment is taxed.
    Full,
    /// Only increases in employment are taxed.
    Hiring,
}

/// Primitives of the firm dynamics model.
///
/// The required primitives are set by [`Parameters::new`]; everything else
/// starts from the canonical calibration and can be overridden through the
/// `with_*` builders. Validation is deferred to model construction so that a
/// builder chain never has to handle errors halfway through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Sunk cost of entry, in units of the entrant's expected value.
    pub entry_cost: f64,
    /// Per-period fixed operating cost.
    pub fixed_cost: f64,
    /// Number of productivity grid points.
    pub grid_size: usize,
    /// Drift of log productivity.
    pub drift: f64,
    /// AR(1) persistence of log productivity.
    pub persistence: f64,
    /// Standard deviation of log productivity innovations.
    pub volatility: f64,
    /// Mean of the entrants' log productivity distribution.
    pub entrant_log_mean: f64,
    /// Standard deviation of the entrants' log productivity distribution.
    pub entrant_log_std: f64,
    /// Discount factor.
    pub discount: f64,
    /// Returns-to-scale curvature of the production function.
    pub curvature: f64,
    /// Labor market closure.
    pub mode: EquilibriumMode,
    /// Denomination of the fixed cost.
    pub fixed_cost_unit: FixedCostUnit,
    /// Timing of the exit decision.
    pub timing: ExitTiming,
    /// Labor supply elasticity under [`EquilibriumMode::Partial`].
    pub supply_elasticity: f64,
    /// Marginal disutility of labor under [`EquilibriumMode::General`].
    pub labor_disutility: f64,
    /// Population growth rate under [`EquilibriumMode::BalancedGrowth`].
    pub labor_growth: f64,
    /// Scrap value received upon exit.
    pub exit_value: f64,
    /// Exogenous per-period exit hazard.
    pub exogenous_exit: f64,
    /// Multiplicative wage distortion common to all firms.
    pub wage_tax: f64,
    /// Elasticity of the wage distortion with respect to productivity.
    pub wage_tax_curvature: f64,
    /// Half-width of the productivity grid in stationary standard deviations.
    pub grid_span: f64,
    /// Employment cutoffs splitting firms into size classes.
    pub size_thresholds: Vec<f64>,
}

impl Parameters {
    /// Primitives with the canonical calibration for everything optional.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry_cost: f64,
        fixed_cost: f64,
        grid_size: usize,
        drift: f64,
        persistence: f64,
        volatility: f64,
        entrant_log_mean: f64,
        entrant_log_std: f64,
    ) -> Self {
        Self {
            entry_cost,
            fixed_cost,
            grid_size,
            drift,
            persistence,
            volatility,
            entrant_log_mean,
            entrant_log_std,
            discount: 0.96,
            curvature: 0.64,
            mode: EquilibriumMode::General,
            fixed_cost_unit: FixedCostUnit::Labor,
            timing: ExitTiming::BeforeShock,
            supply_elasticity: 2.0,
            labor_disutility: 0.6,
            labor_growth: 0.0,
            exit_value: 0.0,
            exogenous_exit: 0.0,
            wage_tax: 1.0,
            wage_tax_curvature: 0.0,
            grid_span: 4.0,
            size_thresholds: vec![10.0, 30.0, 100.0],
        }
    }

    /// Override the discount factor.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Override the production curvature.
    pub fn with_curvature(mut self, curvature: f64) -> Self {
        self.curvature = curvature;
        self
    }

    /// Select the labor market closure.
    pub fn with_mode(mut self, mode: EquilibriumMode) -> Self {
        self.mode = mode;
        self
    }

    /// Select the denomination of the fixed cost.
    pub fn with_fixed_cost_unit(mut self, unit: FixedCostUnit) -> Self {
        self.fixed_cost_unit = unit;
        self
    }

    /// Select the timing of the exit decision.
    pub fn with_timing(mut self, timing: ExitTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Override the labor supply elasticity used in partial equilibrium.
    pub fn with_supply_elasticity(mut self, elasticity: f64) -> Self {
        self.supply_elasticity = elasticity;
        self
    }

    /// Override the marginal disutility of labor.
    pub fn with_labor_disutility(mut self, disutility: f64) -> Self {
        self.labor_disutility = disutility;
        self
    }

    /// Override the population growth rate.
    pub fn with_labor_growth(mut self, growth: f64) -> Self {
        self.labor_growth = growth;
        self
    }

    /// Override the scrap value received upon exit.
    pub fn with_exit_value(mut self, value: f64) -> Self {
        self.exit_value = value;
        self
    }

    /// Override the exogenous exit hazard.
    pub fn with_exogenous_exit(mut self, hazard: f64) -> Self {
        self.exogenous_exit = hazard;
        self
    }

    /// Tax the wage bill by `tax * s^curvature` for a firm at productivity `s`.
    pub fn with_wage_distortion(mut self, tax: f64, curvature: f64) -> Self {
        self.wage_tax = tax;
        self.wage_tax_curvature = curvature;
        self
    }

    /// Override the grid half-width in stationary standard deviations.
    pub fn with_grid_span(mut self, span: f64) -> Self {
        self.grid_span = span;
        self
    }

    /// Override the employment cutoffs of the firm size table.
    pub fn with_size_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.size_thresholds = thresholds;
        self
    }

    /// Check every primitive against its admissible range.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("drift", self.drift),
            ("entrant_log_mean", self.entrant_log_mean),
            ("exit_value", self.exit_value),
            ("wage_tax_curvature", self.wage_tax_curvature),
        ] {
            if !value.is_finite() {
                return Err(HopenhaynError::invalid_parameter(
                    name,
                    "must be finite",
                    value,
                ));
            }
        }
        if !(self.entry_cost > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "entry_cost",
                "must be positive",
                self.entry_cost,
            ));
        }
        if !(self.fixed_cost >= 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "fixed_cost",
                "must be nonnegative",
                self.fixed_cost,
            ));
        }
        if self.grid_size < 2 {
            return Err(HopenhaynError::invalid_parameter(
                "grid_size",
                "must be at least 2",
                self.grid_size as f64,
            ));
        }
        if !(self.persistence.abs() < 1.0) {
            return Err(HopenhaynError::invalid_parameter(
                "persistence",
                "must lie strictly inside (-1, 1)",
                self.persistence,
            ));
        }
        if !(self.volatility > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "volatility",
                "must be positive",
                self.volatility,
            ));
        }
        if !(self.entrant_log_std > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "entrant_log_std",
                "must be positive",
                self.entrant_log_std,
            ));
        }
        if !(self.discount > 0.0 && self.discount < 1.0) {
            return Err(HopenhaynError::invalid_parameter(
                "discount",
                "must lie strictly inside (0, 1)",
                self.discount,
            ));
        }
        if !(self.curvature > 0.0 && self.curvature < 1.0) {
            return Err(HopenhaynError::invalid_parameter(
                "curvature",
                "must lie strictly inside (0, 1)",
                self.curvature,
            ));
        }
        if !(self.supply_elasticity > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "supply_elasticity",
                "must be positive",
                self.supply_elasticity,
            ));
        }
        if !(self.exogenous_exit >= 0.0 && self.exogenous_exit < 1.0) {
            return Err(HopenhaynError::invalid_parameter(
                "exogenous_exit",
                "must lie in [0, 1)",
                self.exogenous_exit,
            ));
        }
        if !(self.wage_tax > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "wage_tax",
                "must be positive",
                self.wage_tax,
            ));
        }
        if !(self.grid_span > 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "grid_span",
                "must be positive",
                self.grid_span,
            ));
        }
        for pair in self.size_thresholds.windows(2) {
            if !(pair[1] > pair[0]) {
                return Err(HopenhaynError::invalid_parameter(
                    "size_thresholds",
                    "must be strictly increasing",
                    pair[1],
                ));
            }
        }
        match self.mode {
            EquilibriumMode::Partial => {}
            EquilibriumMode::General => {
                if !(self.labor_disutility > 0.0) || self.labor_growth != 0.0 {
                    return Err(HopenhaynError::inconsistent(
                        "general equilibrium requires positive labor disutility \
                         and zero labor growth",
                    ));
                }
            }
            EquilibriumMode::BalancedGrowth => {
                if self.labor_disutility != 0.0 || !(self.labor_growth >= 0.0) {
                    return Err(HopenhaynError::inconsistent(
                        "balanced growth requires zero labor disutility \
                         and a nonnegative growth rate",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Primitives of the employment adjustment-cost extension.
///
/// Wraps a [`Parameters`] with the employment grid and the adjustment tax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentParameters {
    /// Primitives shared with the frictionless model.
    pub base: Parameters,
    /// Number of employment grid points.
    pub employment_grid_size: usize,
    /// Largest employment level on the grid.
    pub employment_max: f64,
    /// Tax per unit of adjusted employment.
    pub adjustment_cost: f64,
    /// Which adjustments are taxed.
    pub adjustment_mode: AdjustmentMode,
}

impl AdjustmentParameters {
    /// Wrap shared primitives with the canonical employment grid.
    pub fn new(base: Parameters) -> Self {
        Self {
            base,
            employment_grid_size: 250,
            employment_max: 5_000.0,
            adjustment_cost: 0.0,
            adjustment_mode: AdjustmentMode::Firing,
        }
    }

    /// Override the employment grid resolution and upper bound.
    pub fn with_employment_grid(mut self, size: usize, max: f64) -> Self {
        self.employment_grid_size = size;
        self.employment_max = max;
        self
    }

    /// Override the adjustment tax.
    pub fn with_adjustment_cost(mut self, cost: f64) -> Self {
        self.adjustment_cost = cost;
        self
    }

    /// Select which employment changes are taxed.
    pub fn with_adjustment_mode(mut self, mode: AdjustmentMode) -> Self {
        self.adjustment_mode = mode;
        self
    }

    /// Check the extension primitives and everything they inherit.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if self.base.mode == EquilibriumMode::Partial {
            return Err(HopenhaynError::inconsistent(
                "the adjustment-cost model closes the labor market in general \
                 equilibrium or on a balanced growth path",
            ));
        }
        if self.base.timing != ExitTiming::BeforeShock {
            return Err(HopenhaynError::inconsistent(
                "the adjustment-cost model requires the before-shock exit timing",
            ));
        }
        if self.base.exit_value != 0.0 {
            return Err(HopenhaynError::inconsistent(
                "the adjustment-cost model replaces the scrap value with the \
                 severance cost of firing the whole workforce",
            ));
        }
        if self.base.wage_tax != 1.0 || self.base.wage_tax_curvature != 0.0 {
            return Err(HopenhaynError::inconsistent(
                "the adjustment-cost model does not support wage distortions",
            ));
        }
        if self.employment_grid_size < 2 {
            return Err(HopenhaynError::invalid_parameter(
                "employment_grid_size",
                "must be at least 2",
                self.employment_grid_size as f64,
            ));
        }
        if !(self.employment_max > 1.0) {
            return Err(HopenhaynError::invalid_parameter(
                "employment_max",
                "must exceed 1",
                self.employment_max,
            ));
        }
        if !(self.adjustment_cost >= 0.0) {
            return Err(HopenhaynError::invalid_parameter(
                "adjustment_cost",
                "must be nonnegative",
                self.adjustment_cost,
            ));
        }
        Ok(())
    }
}
