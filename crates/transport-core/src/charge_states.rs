// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Charge States
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Average charge state of ion mixtures.
//!
//! The charge-state model is a seam: transport code only needs the
//! fraction-weighted ⟨Z⟩ of a mixture at a given electron temperature.

use ndarray::Array1;
use transport_types::config::IonMixture;
use transport_types::constants::ion_properties;
use transport_types::error::{FusionError, FusionResult};

/// Resolves the average charge of an ion mixture at an electron temperature.
pub trait ChargeStateModel {
    /// ⟨Z⟩ of `mixture` at `te_kev`.
    fn average_charge_state(&self, mixture: &IonMixture, te_kev: f64) -> FusionResult<f64>;

    /// ⟨Z⟩ evaluated at every temperature of a profile.
    fn charge_state_profile(
        &self,
        mixture: &IonMixture,
        te_kev: &Array1<f64>,
    ) -> FusionResult<Array1<f64>> {
        let mut out = Array1::zeros(te_kev.len());
        for (z, &te) in out.iter_mut().zip(te_kev.iter()) {
            *z = self.average_charge_state(mixture, te)?;
        }
        Ok(out)
    }
}

/// Every species fully stripped: ⟨Z⟩ = Σ fᵢ Zᵢ, independent of temperature.
///
/// A mixture `z_override` takes precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FullyIonized;

impl ChargeStateModel for FullyIonized {
    fn average_charge_state(&self, mixture: &IonMixture, te_kev: f64) -> FusionResult<f64> {
        if !te_kev.is_finite() {
            return Err(FusionError::ClosureFailure(format!(
                "charge state requires finite electron temperature, got {te_kev}"
            )));
        }
        if let Some(z) = mixture.z_override {
            return Ok(z);
        }
        let mut z_avg = 0.0;
        for (symbol, fraction) in &mixture.species {
            let ion = ion_properties(symbol).ok_or_else(|| {
                FusionError::ClosureFailure(format!("unknown ion species '{symbol}'"))
            })?;
            z_avg += fraction * ion.z;
        }
        if z_avg <= 0.0 {
            return Err(FusionError::ClosureFailure(format!(
                "average charge state must be > 0, got {z_avg}"
            )));
        }
        Ok(z_avg)
    }
}
