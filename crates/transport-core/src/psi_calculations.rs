// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Poloidal Flux Calculations
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Quantities derived from the poloidal flux ψ(ρ̂).
//!
//! Enclosed current: I(ρ̂) = ψ' · g2g3/ρ̂ · F / (16π³ μ0 Φb)
//! Safety factor:    q = |2 Φb ρ̂ / ψ'| · q_correction
//! Magnetic shear:   s = −ρ̂ (dι/dρ̂) / ι,  ι = |ψ'/ρ̂|
//!
//! ψ' is the derivative with respect to normalized radius ρ̂.

use ndarray::Array1;
use std::f64::consts::PI;
use transport_math::interp::{face_to_cell, gradient};
use transport_types::constants::MU0_SI;
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::{BootstrapCurrentProfile, GridField};

/// 16 π³ μ0, the flux-to-current prefactor.
fn current_prefactor() -> f64 {
    16.0 * PI.powi(3) * MU0_SI
}

/// Total current density on cells and faces plus enclosed current on faces.
///
/// Returns `(jtot, jtot_face, ip_profile_face)` in A/m², A/m² and A.
/// The on-axis current density follows from L'Hôpital's rule with I(0) = 0.
pub fn calc_jtot(geo: &Geometry, psi: &GridField) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let psi_grad = psi.face_grad();
    let ip_profile_face =
        &psi_grad * &geo.g2g3_over_rhon_face * &geo.f_face / (geo.phib * current_prefactor());

    let di_drhon = gradient(ip_profile_face.view(), geo.rho_face_norm.view());
    let mut jtot_face = Array1::zeros(geo.nx + 1);
    jtot_face[0] = ip_profile_face[1] / geo.area_face[1];
    for i in 1..=geo.nx {
        jtot_face[i] = di_drhon[i] / geo.spr_face[i];
    }
    let jtot = face_to_cell(jtot_face.view());
    (jtot, jtot_face, ip_profile_face)
}

/// Safety factor on faces.
pub fn calc_q_face(geo: &Geometry, psi: &GridField) -> Array1<f64> {
    let psi_grad = psi.face_grad();
    let mut q_face = Array1::zeros(geo.nx + 1);
    // On axis ρ̂/ψ' → dρ̂/ψ'(first interior face)
    q_face[0] = (2.0 * geo.phib * geo.drho_norm / psi_grad[1]).abs();
    for i in 1..=geo.nx {
        q_face[i] = (2.0 * geo.phib * geo.rho_face_norm[i] / psi_grad[i]).abs();
    }
    q_face * geo.q_correction_factor
}

/// Magnetic shear on faces.
pub fn calc_s_face(geo: &Geometry, psi: &GridField) -> Array1<f64> {
    let psi_grad = psi.face_grad();
    let mut iota_scaled = Array1::zeros(geo.nx + 1);
    iota_scaled[0] = (psi_grad[1] / geo.drho_norm).abs();
    for i in 1..=geo.nx {
        iota_scaled[i] = (psi_grad[i] / geo.rho_face_norm[i]).abs();
    }
    let diota = gradient(iota_scaled.view(), geo.rho_face_norm.view());
    Array1::from_shape_fn(geo.nx + 1, |i| {
        -geo.rho_face_norm[i] * diota[i] / iota_scaled[i]
    })
}

/// Edge ψ' that makes the enclosed current at the last face equal `ip_tot` [MA].
pub fn calculate_psi_grad_constraint_from_ip_tot(ip_tot: f64, geo: &Geometry) -> f64 {
    let edge = geo.edge_face();
    ip_tot * 1e6 * current_prefactor() * geo.phib
        / (geo.g2g3_over_rhon_face[edge] * geo.f_face[edge])
}

/// Edge ψ at t+dt from θ-weighted loop voltage.
///
/// ψ(t+dt) = ψ(t) + dt·((1−θ)·V(t) + θ·V(t+dt))
pub fn calculate_psi_value_constraint_from_vloop(
    dt: f64,
    theta: f64,
    vloop_lcfs_t: f64,
    vloop_lcfs_t_plus_dt: f64,
    psi_lcfs_t: f64,
) -> f64 {
    let theta_weighted_vloop_lcfs = (1.0 - theta) * vloop_lcfs_t + theta * vloop_lcfs_t_plus_dt;
    psi_lcfs_t + theta_weighted_vloop_lcfs * dt
}

/// Divergence of `d_face · ∂field/∂ρ̂` on cells, honouring the face constraints.
fn diffusion_term(d_face: &Array1<f64>, field: &GridField) -> Array1<f64> {
    let flux = d_face * &field.face_grad();
    let n = field.len();
    Array1::from_shape_fn(n, |i| (flux[i + 1] - flux[i]) / field.dr)
}

/// Divergence of `v_face · field` on cells, using constrained face values.
fn convection_term(v_face: &Array1<f64>, field: &GridField) -> Array1<f64> {
    let flux = v_face * &field.face_value();
    let n = field.len();
    Array1::from_shape_fn(n, |i| (flux[i + 1] - flux[i]) / field.dr)
}

/// ∂ψ/∂t from the current-diffusion equation evaluated at the given ψ.
///
/// toc · ψ̇ = ∂/∂ρ̂(g2g3/ρ̂ · ∂ψ/∂ρ̂) + S_ψ + C · σρ̂²/F² · ∂ψ/∂ρ̂
/// with toc = ρ̂ σ μ0 16π² Φb² / (F² · resistivity_mult) and C = 8π² μ0 Φ̇b Φb.
///
/// The Φ̇b term is discretized as ∂/∂ρ̂(C a ψ) − C ψ ∂a/∂ρ̂ with a = σρ̂²/F²:
/// the first part on faces from `sigma_face`, the second on cells from `sigma`.
pub fn calculate_psidot_from_psi_sources(
    psi_sources: &Array1<f64>,
    conductivity: &BootstrapCurrentProfile,
    resistivity_multiplier: f64,
    psi: &GridField,
    geo: &Geometry,
) -> FusionResult<Array1<f64>> {
    let sigma = &conductivity.sigma;
    let sigma_face = &conductivity.sigma_face;
    if sigma.len() != geo.nx
        || sigma_face.len() != geo.nx + 1
        || psi_sources.len() != geo.nx
        || psi.len() != geo.nx
    {
        return Err(FusionError::ConfigError(format!(
            "psidot inputs must have {} cells and {} faces \
             (sigma={}, sigma_face={}, sources={}, psi={})",
            geo.nx,
            geo.nx + 1,
            sigma.len(),
            sigma_face.len(),
            psi_sources.len(),
            psi.len()
        )));
    }
    if sigma.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(FusionError::PhysicsViolation(
            "conductivity must be finite and > 0 on every cell".to_string(),
        ));
    }
    if sigma_face.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(FusionError::PhysicsViolation(
            "face conductivity must be finite and >= 0".to_string(),
        ));
    }
    if !resistivity_multiplier.is_finite() || resistivity_multiplier <= 0.0 {
        return Err(FusionError::ConfigError(format!(
            "resistivity_mult must be finite and > 0, got {resistivity_multiplier}"
        )));
    }

    let mu0 = MU0_SI;
    let f2 = geo.f.mapv(|f| f * f);
    let toc_psi = &geo.rho_norm * sigma * (mu0 * 16.0 * PI * PI * geo.phib * geo.phib)
        / &f2
        / resistivity_multiplier;

    let phibdot_prefactor = 8.0 * PI * PI * mu0 * geo.phibdot * geo.phib;
    let a_face = &geo.rho_face_norm.mapv(|r| r * r) * sigma_face / &geo.f_face.mapv(|f| f * f);
    let a_cell = &geo.rho_norm.mapv(|r| r * r) * sigma / &f2;
    let da_drhon = gradient(a_cell.view(), geo.rho_norm.view());

    let v_face = a_face * phibdot_prefactor;
    let sources = psi_sources - &(da_drhon * &psi.value * phibdot_prefactor);

    let psidot = (diffusion_term(&geo.g2g3_over_rhon_face, psi)
        + convection_term(&v_face, psi)
        + sources)
        / toc_psi;
    Ok(psidot)
}
