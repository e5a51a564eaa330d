//! Stationary equilibrium firm dynamics with endogenous entry and exit.
//!
//! This crate solves industry equilibria in the tradition of Hopenhayn
//! (*Econometrica*, 1992) and Hopenhayn and Rogerson (*JPE*, 1993) while
//! embracing idiomatic Rust. It offers tools to
//!
//! - validate calibrations and discretize the productivity process
//!   (`params` and `grid` modules),
//! - solve the incumbent's Bellman equation, the free-entry wage, and the
//!   stationary firm distribution (`model` module),
//! - summarize the cross section with entry, exit, size, and survival
//!   statistics (`results` module),
//! - trace aggregates along a perfect-foresight path of labor force growth
//!   (`transition` module), and
//! - price employment adjustment frictions with a firing or hiring tax
//!   (`adjustment` module).
//!
//! The implementation focuses on clarity and reproducibility. Every
//! equilibrium object carries the primitives it was solved under, and the
//! solvers report how and why they failed instead of panicking.
//!
//! # Quick start
//!
//! ```no_run
//! use hopenhayn::{EquilibriumMode, Model, Parameters};
//!
//! // Entry cost, fixed cost, grid size, then the AR(1) productivity
//! // process and the entrant productivity draw.
//! let params = Parameters::new(10.0, 5.0, 50, 0.14, 0.9, 0.2, 1.0, 0.4)
//!     .with_mode(EquilibriumMode::BalancedGrowth)
//!     .with_labor_disutility(0.0);
//!
//! let model = Model::new(params).expect("validated calibration");
//! let equilibrium = model.solve().expect("converged");
//!
//! println!("wage: {:.4}", equilibrium.wage());
//! println!("exit threshold: {:.4}", equilibrium.exit_threshold());
//! println!("entry rate: {:.2}%", equilibrium.stats().entry_rate);
//! ```

pub mod adjustment;
pub mod error;
pub mod grid;
pub mod model;
pub mod options;
pub mod params;
pub mod results;
pub mod solving;
pub mod transition;

pub use adjustment::{AdjustmentEquilibrium, AdjustmentModel, AdjustmentStats};
pub use error::{FailureKind, HopenhaynError, Result};
pub use model::Model;
pub use options::SolveOptions;
pub use params::{
    AdjustmentMode, AdjustmentParameters, EquilibriumMode, ExitTiming, FixedCostUnit, Parameters,
};
pub use results::{AggregateStats, Equilibrium, SizeDistribution, SurvivalStat};
pub use solving::{IterationOptions, IterationSummary, RootMethod, RootOptions};
pub use transition::PeriodStat;
