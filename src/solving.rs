//! Scalar root finders and iteration controls shared by the equilibrium solvers.

use log::debug;

use crate::error::{HopenhaynError, Result};

/// Relative tolerance floor for the bracketed root finder.
const BRENT_RTOL: f64 = 4.0 * f64::EPSILON;

/// Configuration for fixed-point iterations (value functions, distributions).
#[derive(Clone, Debug)]
pub struct IterationOptions {
    /// Supremum norm tolerance for convergence.
    pub tolerance: f64,
    /// Maximum number of iterations allowed before aborting.
    pub max_iterations: usize,
}

impl Default for IterationOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            max_iterations: 2_000,
        }
    }
}

/// Diagnostics returned alongside a converged fixed point.
#[derive(Clone, Debug)]
pub struct IterationSummary {
    /// Number of iterations performed.
    pub iterations: usize,
    /// Maximum absolute change observed in the final iteration.
    pub max_gap: f64,
}

/// Configuration for the scalar root finders.
#[derive(Clone, Debug)]
pub struct RootOptions {
    /// Absolute tolerance on the root location.
    pub tolerance: f64,
    /// Maximum number of iterations allowed before aborting.
    pub max_iterations: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            tolerance: 2e-12,
            max_iterations: 500,
        }
    }
}

/// Choice of scalar root finder for an equilibrium condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootMethod {
    /// Bracketed Brent iteration; robust whenever a sign change is known.
    Brent,
    /// Secant iteration from a single starting point.
    Secant,
}

/// Find a root of `f` on `bracket` with Brent's method.
///
/// Combines bisection with secant and inverse quadratic steps, keeping the
/// root bracketed throughout. The objective may itself fail (it typically
/// wraps an inner solve), so it returns a [`Result`] and errors are passed
/// through unchanged.
pub fn brent_root<F>(
    mut f: F,
    bracket: (f64, f64),
    options: &RootOptions,
    context: &'static str,
) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    let (mut xpre, mut xcur) = bracket;
    let mut fpre = f(xpre)?;
    let mut fcur = f(xcur)?;
    if !fpre.is_finite() || !fcur.is_finite() {
        return Err(HopenhaynError::numerical(context));
    }
    if fpre == 0.0 {
        return Ok(xpre);
    }
    if fcur == 0.0 {
        return Ok(xcur);
    }
    if fpre.signum() == fcur.signum() {
        return Err(HopenhaynError::BracketDoesNotStraddle {
            context,
            lower: bracket.0,
            upper: bracket.1,
        });
    }

    let mut xblk = 0.0;
    let mut fblk = 0.0;
    let mut spre = 0.0;
    let mut scur = 0.0;
    for iteration in 0..options.max_iterations {
        if fpre * fcur < 0.0 {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;
            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = (options.tolerance + BRENT_RTOL * xcur.abs()) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            debug!("solved {context} at {xcur:.6} after {iteration} Brent iterations");
            return Ok(xcur);
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // secant step
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // inverse quadratic interpolation
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = f(xcur)?;
        if !fcur.is_finite() {
            return Err(HopenhaynError::numerical(context));
        }
    }
    Err(HopenhaynError::RootFindFailed {
        context,
        iterations: options.max_iterations,
        reason: "exceeded the iteration budget",
    })
}

/// Find a root of `f` by secant iteration started at `guess`.
///
/// The second point is seeded a relative step away from the guess. Unlike
/// [`brent_root`] this never brackets, so it is reserved for objectives known
/// to be close to linear, such as the labor market clearing condition.
pub fn secant_root<F>(
    mut f: F,
    guess: f64,
    options: &RootOptions,
    context: &'static str,
) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    let eps = 1e-4;
    let mut p0 = guess;
    let mut p1 = guess * (1.0 + eps);
    p1 += if p1 >= 0.0 { eps } else { -eps };
    let mut q0 = f(p0)?;
    let mut q1 = f(p1)?;
    if !q0.is_finite() || !q1.is_finite() {
        return Err(HopenhaynError::numerical(context));
    }
    if q1.abs() < q0.abs() {
        std::mem::swap(&mut p0, &mut p1);
        std::mem::swap(&mut q0, &mut q1);
    }

    for iteration in 0..options.max_iterations {
        if q1 == q0 {
            if p1 != p0 {
                return Err(HopenhaynError::RootFindFailed {
                    context,
                    iterations: iteration,
                    reason: "objective is flat between the last two iterates",
                });
            }
            return Ok((p1 + p0) / 2.0);
        }
        // divide by the larger residual to limit cancellation
        let p = if q1.abs() > q0.abs() {
            (-q0 / q1 * p1 + p0) / (1.0 - q0 / q1)
        } else {
            (-q1 / q0 * p0 + p1) / (1.0 - q1 / q0)
        };
        if (p - p1).abs() <= options.tolerance {
            debug!("solved {context} at {p:.6} after {iteration} secant iterations");
            return Ok(p);
        }
        p0 = p1;
        q0 = q1;
        p1 = p;
        q1 = f(p1)?;
        if !q1.is_finite() {
            return Err(HopenhaynError::numerical(context));
        }
    }
    Err(HopenhaynError::RootFindFailed {
        context,
        iterations: options.max_iterations,
        reason: "exceeded the iteration budget",
    })
}

/// Dispatch to the configured root finder.
pub(crate) fn find_root<F>(
    f: F,
    method: RootMethod,
    bracket: (f64, f64),
    guess: f64,
    options: &RootOptions,
    context: &'static str,
) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    match method {
        RootMethod::Brent => brent_root(f, bracket, options, context),
        RootMethod::Secant => secant_root(f, guess, options, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use approx::assert_relative_eq;

    #[test]
    fn brent_finds_cubic_root() {
        let root = brent_root(
            |x| Ok(x * x * x - 2.0 * x - 5.0),
            (2.0, 3.0),
            &RootOptions::default(),
            "cubic",
        )
        .unwrap();
        assert_relative_eq!(root, 2.094_551_481_542_326_5, max_relative = 1e-12);
    }

    #[test]
    fn brent_rejects_unbracketed_objective() {
        let err = brent_root(
            |x| Ok(x * x + 1.0),
            (-1.0, 1.0),
            &RootOptions::default(),
            "positive parabola",
        )
        .unwrap_err();
        assert!(matches!(err, HopenhaynError::BracketDoesNotStraddle { .. }));
        assert_eq!(err.kind(), FailureKind::NonConvergence);
    }

    #[test]
    fn brent_flags_nan_objective() {
        let err = brent_root(
            |x| Ok((x - 0.5).sqrt() - 0.3),
            (0.0, 1.0),
            &RootOptions::default(),
            "sqrt shift",
        )
        .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Numerical);
    }

    #[test]
    fn secant_solves_linear_objective() {
        let root = secant_root(
            |x| Ok(2.0 * x - 3.0),
            1.0,
            &RootOptions::default(),
            "linear",
        )
        .unwrap();
        assert_relative_eq!(root, 1.5, max_relative = 1e-12);
    }

    #[test]
    fn secant_reports_flat_objective() {
        let err = secant_root(|_| Ok(1.0), 1.0, &RootOptions::default(), "flat").unwrap_err();
        assert_eq!(err.kind(), FailureKind::NonConvergence);
    }
}
