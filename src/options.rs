//! Aggregated solver configuration for one equilibrium computation.

use crate::solving::{IterationOptions, RootMethod, RootOptions};

/// Solver configuration used when computing an equilibrium.
///
/// The defaults reproduce the canonical setup: a bracketed Brent search for
/// the free-entry wage and a secant iteration for the entrant mass, whose
/// clearing condition is linear in the mass.
#[derive(Clone, Debug)]
pub struct SolveOptions {
    /// Controls for the Bellman operator iteration.
    pub value_iteration: IterationOptions,
    /// Controls for the distribution iteration in the adjustment-cost model.
    pub distribution_iteration: IterationOptions,
    /// Root finder applied to the free-entry condition.
    pub wage_method: RootMethod,
    /// Wage bracket handed to the bracketed root finder.
    pub wage_bracket: (f64, f64),
    /// Wage starting point handed to the secant root finder.
    pub wage_guess: f64,
    /// Tolerances for the wage root.
    pub wage_root: RootOptions,
    /// Root finder applied to the labor market clearing condition.
    pub mass_method: RootMethod,
    /// Entrant mass bracket handed to the bracketed root finder.
    pub mass_bracket: (f64, f64),
    /// Entrant mass starting point handed to the secant root finder.
    pub mass_guess: f64,
    /// Tolerances for the mass root.
    pub mass_root: RootOptions,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            value_iteration: IterationOptions::default(),
            distribution_iteration: IterationOptions::default(),
            wage_method: RootMethod::Brent,
            wage_bracket: (0.1, 10.0),
            wage_guess: 1.0,
            wage_root: RootOptions::default(),
            mass_method: RootMethod::Secant,
            mass_bracket: (1e-7, 10.0),
            mass_guess: 0.1,
            mass_root: RootOptions::default(),
        }
    }
}

impl SolveOptions {
    /// Override the Bellman iteration settings while preserving other defaults.
    pub fn with_value_iteration(mut self, options: IterationOptions) -> Self {
        self.value_iteration = options;
        self
    }

    /// Override the distribution iteration settings while preserving other defaults.
    pub fn with_distribution_iteration(mut self, options: IterationOptions) -> Self {
        self.distribution_iteration = options;
        self
    }

    /// Select the root finder for the free-entry wage.
    pub fn with_wage_method(mut self, method: RootMethod) -> Self {
        self.wage_method = method;
        self
    }

    /// Override the wage bracket.
    pub fn with_wage_bracket(mut self, lower: f64, upper: f64) -> Self {
        self.wage_bracket = (lower, upper);
        self
    }

    /// Override the wage starting point for the secant method.
    pub fn with_wage_guess(mut self, guess: f64) -> Self {
        self.wage_guess = guess;
        self
    }

    /// Override the wage root tolerances.
    pub fn with_wage_root(mut self, options: RootOptions) -> Self {
        self.wage_root = options;
        self
    }

    /// Select the root finder for the entrant mass.
    pub fn with_mass_method(mut self, method: RootMethod) -> Self {
        self.mass_method = method;
        self
    }

    /// Override the entrant mass bracket.
    pub fn with_mass_bracket(mut self, lower: f64, upper: f64) -> Self {
        self.mass_bracket = (lower, upper);
        self
    }

    /// Override the entrant mass starting point for the secant method.
    pub fn with_mass_guess(mut self, guess: f64) -> Self {
        self.mass_guess = guess;
        self
    }

    /// Override the entrant mass root tolerances.
    pub fn with_mass_root(mut self, options: RootOptions) -> Self {
        self.mass_root = options;
        self
    }
}
