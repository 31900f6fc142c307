//! Calibration of the lognormal dispersion parameter `sigma` from inequality targets.
//!
//! `sigma` is the standard deviation of log-income. The Gini coefficient has no
//! closed-form inverse and is solved by bisection; the P90/P10 ratio is inverted
//! directly.

use crate::error::DemandError;
use serde::Serialize;
use std::f64::consts::SQRT_2;

/// 90th percentile of the standard normal distribution.
pub const Z90: f64 = 1.2815515655446004;

/// Bisection bracket for the Gini inversion.
const SIGMA_LO: f64 = 1e-8;
const SIGMA_HI: f64 = 3.0;

pub const GINI_TOL: f64 = 1e-6;
pub const GINI_MAX_ITER: usize = 100;

/// Gini coefficient implied by a lognormal with log-std `sigma`.
pub fn gini_from_sigma(sigma: f64) -> f64 {
    libm::erf(sigma / SQRT_2)
}

/// Outcome of the Gini bisection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GiniFit {
    pub sigma: f64,
    /// The tolerance was reached before the iteration budget ran out.
    pub converged: bool,
    pub iterations: usize,
}

/// Solve `gini_from_sigma(sigma) == target_gini` by bisection on `[1e-8, 3]`.
///
/// On exhaustion the last midpoint is returned with `converged == false`.
pub fn solve_sigma_from_gini(
    target_gini: f64,
    tol: f64,
    max_iter: usize,
) -> Result<GiniFit, DemandError> {
    if !(target_gini > 0.0 && target_gini < 1.0) {
        return Err(DemandError::invalid(
            "target_gini",
            target_gini,
            "must be strictly between 0 and 1",
        ));
    }

    let (mut lo, mut hi) = (SIGMA_LO, SIGMA_HI);
    let mut mid = 0.5 * (lo + hi);

    for iter in 0..max_iter {
        mid = 0.5 * (lo + hi);
        let gini = gini_from_sigma(mid);

        if (gini - target_gini).abs() < tol {
            return Ok(GiniFit {
                sigma: mid,
                converged: true,
                iterations: iter + 1,
            });
        }

        if gini < target_gini {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(GiniFit {
        sigma: mid,
        converged: false,
        iterations: max_iter,
    })
}

/// Sigma reproducing `target_gini`, with the default tolerance and iteration budget.
///
/// A fit that did not converge is still returned, with a warning.
pub fn sigma_from_gini(target_gini: f64) -> Result<f64, DemandError> {
    let fit = solve_sigma_from_gini(target_gini, GINI_TOL, GINI_MAX_ITER)?;
    if !fit.converged {
        log::warn!(
            "gini bisection did not converge after {} iterations (target {target_gini}, best sigma {})",
            fit.iterations,
            fit.sigma
        );
    }
    Ok(fit.sigma)
}

/// P90/P10 ratio implied by a lognormal with log-std `sigma`.
pub fn p90_p10_from_sigma(sigma: f64) -> f64 {
    (2.0 * Z90 * sigma).exp()
}

/// Sigma reproducing `target_ratio` as the P90/P10 ratio.
pub fn sigma_from_p90_p10(target_ratio: f64) -> Result<f64, DemandError> {
    if !target_ratio.is_finite() || target_ratio <= 1.0 {
        return Err(DemandError::invalid(
            "target_p90_p10",
            target_ratio,
            "must be finite and greater than 1",
        ));
    }
    Ok(target_ratio.ln() / (2.0 * Z90))
}

/// Compromise between a Gini target and a P90/P10 target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SigmaCompromise {
    pub sigma_gini: f64,
    pub sigma_p90_p10: f64,
    pub sigma_avg: f64,
    pub gini_at_avg: f64,
    pub p90_p10_at_avg: f64,
}

/// Average the sigmas calibrated on both targets and report what the average implies.
pub fn average_sigma(target_gini: f64, target_ratio: f64) -> Result<SigmaCompromise, DemandError> {
    let sigma_gini = sigma_from_gini(target_gini)?;
    let sigma_p90_p10 = sigma_from_p90_p10(target_ratio)?;
    let sigma_avg = 0.5 * (sigma_gini + sigma_p90_p10);
    Ok(SigmaCompromise {
        sigma_gini,
        sigma_p90_p10,
        sigma_avg,
        gini_at_avg: gini_from_sigma(sigma_avg),
        p90_p10_at_avg: p90_p10_from_sigma(sigma_avg),
    })
}
