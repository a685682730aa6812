//! Closed-form plasma composition formulas.

use std::f64::consts::PI;
use transport_types::constants::GREENWALD_SCALE;
use transport_types::error::{FusionError, FusionResult};

/// Minimum separation between main-ion and impurity charge.
const MIN_CHARGE_SEPARATION: f64 = 1e-9;

/// Relative slack allowed on ni·Zi ≤ ne before the closure is rejected.
const DILUTION_TOLERANCE: f64 = 1e-12;

/// Main-ion dilution ni/ne from quasineutrality and Zeff.
///
/// Solves ne = ni·Zi + nimp·Zimp and Zeff·ne = ni·Zi² + nimp·Zimp²:
/// ni/ne = (Zimp − Zeff) / (Zi·(Zimp − Zi)).
pub fn main_ion_dilution_factor(zi: f64, zimp: f64, zeff: f64) -> FusionResult<f64> {
    if !zi.is_finite() || zi <= 0.0 || !zimp.is_finite() || zimp <= 0.0 {
        return Err(FusionError::ClosureFailure(format!(
            "charge states must be finite and > 0, got Zi={zi}, Zimp={zimp}"
        )));
    }
    if !zeff.is_finite() {
        return Err(FusionError::ClosureFailure(format!(
            "Zeff must be finite, got {zeff}"
        )));
    }
    if (zimp - zi).abs() < MIN_CHARGE_SEPARATION {
        return Err(FusionError::ClosureFailure(format!(
            "degenerate composition: Zimp ({zimp}) equals Zi ({zi})"
        )));
    }
    let dilution = (zimp - zeff) / (zi * (zimp - zi));
    if dilution < 0.0 || dilution * zi > 1.0 + DILUTION_TOLERANCE {
        return Err(FusionError::ClosureFailure(format!(
            "Zeff={zeff} outside the range spanned by Zi={zi} and Zimp={zimp}"
        )));
    }
    Ok(dilution)
}

/// Greenwald density limit [m^-3] for a plasma current [MA] and minor radius [m].
pub fn greenwald_density(ip_tot_ma: f64, a_minor: f64) -> f64 {
    ip_tot_ma.abs() / (PI * a_minor * a_minor) * GREENWALD_SCALE
}
