use thiserror::Error;

/// Unified error type for `hopenhayn` operations.
#[derive(Debug, Error)]
pub enum HopenhaynError {
    /// Raised when a primitive parameter is outside its admissible range.
    #[error("parameter `{name}` {reason}, found {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable description of the admissible range.
        reason: &'static str,
        /// The value that was actually supplied.
        value: f64,
    },

    /// Raised when parameters are individually valid but jointly inconsistent.
    #[error("inconsistent configuration: {reason}")]
    InconsistentConfiguration { reason: &'static str },

    /// Raised when the entrant distribution places no usable mass on the grid.
    #[error("entrant distribution is degenerate on the productivity grid (total mass {total})")]
    DegenerateEntrantDistribution { total: f64 },

    /// Raised when a fixed-point iteration fails to meet the tolerance.
    #[error("{context} did not converge after {iterations} iterations; best max gap {max_gap}")]
    IterationDidNotConverge {
        /// Which iteration gave up.
        context: &'static str,
        /// Number of iterations performed before termination.
        iterations: usize,
        /// Maximum absolute change in the last iteration.
        max_gap: f64,
    },

    /// Raised when a scalar root finder terminates without a bracketed root.
    #[error("root finding for {context} failed after {iterations} iterations: {reason}")]
    RootFindFailed {
        context: &'static str,
        iterations: usize,
        reason: &'static str,
    },

    /// Raised when the objective has the same sign at both bracket endpoints.
    #[error("no sign change for {context} over [{lower}, {upper}]")]
    BracketDoesNotStraddle {
        context: &'static str,
        lower: f64,
        upper: f64,
    },

    /// Raised when no productivity state chooses to exit.
    #[error("no firm exits; the stationary distribution is not pinned down")]
    NoExit,

    /// Raised when every productivity state chooses to exit.
    #[error("every firm exits; no incumbents survive to production")]
    CompleteExit,

    /// Raised when the continuation value never reaches the exit payoff.
    #[error("exit payoff {exit_value} exceeds continuation value on the whole grid")]
    ExitPayoffAboveContinuation { exit_value: f64 },

    /// Raised when an equilibrium object that must be positive is not.
    #[error("equilibrium {quantity} must be positive, found {value}")]
    NonPositiveEquilibrium {
        quantity: &'static str,
        value: f64,
    },

    /// Raised when linear algebra operations encounter a singular system.
    #[error("matrix in {context} is singular")]
    SingularMatrix { context: &'static str },

    /// Raised when numerical routines produce NaN.
    #[error("encountered NaN during {context}")]
    NumericalError { context: &'static str },
}

/// Coarse classification of solver failures.
///
/// Callers that retry with perturbed parameters typically branch on this
/// rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request itself is malformed; retrying cannot help.
    Configuration,
    /// An iterative routine ran out of iterations or lost its bracket.
    NonConvergence,
    /// The model is well posed but its equilibrium is degenerate.
    Degenerate,
    /// Floating point trouble: NaN, singular systems, empty searches.
    Numerical,
}

impl HopenhaynError {
    /// Helper to format an [`InvalidParameter`](HopenhaynError::InvalidParameter) error.
    pub fn invalid_parameter(name: &'static str, reason: &'static str, value: f64) -> Self {
        Self::InvalidParameter {
            name,
            reason,
            value,
        }
    }

    /// Helper for jointly inconsistent settings.
    pub fn inconsistent(reason: &'static str) -> Self {
        Self::InconsistentConfiguration { reason }
    }

    /// Helper to raise when a matrix factorization fails due to singularity.
    pub fn singular(context: &'static str) -> Self {
        Self::SingularMatrix { context }
    }

    /// Helper to raise when a computation produced NaN.
    pub fn numerical(context: &'static str) -> Self {
        Self::NumericalError { context }
    }

    /// Helper for equilibrium quantities that came out non-positive.
    pub fn non_positive(quantity: &'static str, value: f64) -> Self {
        Self::NonPositiveEquilibrium { quantity, value }
    }

    /// Classify this error for coarse-grained handling.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidParameter { .. }
            | Self::InconsistentConfiguration { .. }
            | Self::DegenerateEntrantDistribution { .. } => FailureKind::Configuration,
            Self::IterationDidNotConverge { .. }
            | Self::RootFindFailed { .. }
            | Self::BracketDoesNotStraddle { .. } => FailureKind::NonConvergence,
            Self::NoExit | Self::CompleteExit | Self::NonPositiveEquilibrium { .. } => {
                FailureKind::Degenerate
            }
            Self::ExitPayoffAboveContinuation { .. }
            | Self::SingularMatrix { .. }
            | Self::NumericalError { .. } => FailureKind::Numerical,
        }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, HopenhaynError>;
