// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Initial Profiles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Construction of the first [`CoreProfiles`] of a run.

use crate::charge_states::ChargeStateModel;
use crate::getters::{
    get_ion_density_and_charge_states, get_updated_electron_density,
    get_updated_electron_temperature, get_updated_ion_temperature,
};
use crate::psi_calculations::calculate_psi_grad_constraint_from_ip_tot;
use crate::updaters::finalize_core_profiles;
use ndarray::Array1;
use std::f64::consts::PI;
use transport_math::integrate::cumulative_trapezoid;
use transport_math::interp::face_to_cell;
use transport_types::config::{DynamicProfileConditions, DynamicRuntimeParamsSlice};
use transport_types::constants::MU0_SI;
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::{CoreProfiles, Currents, FaceConstraint, GridField, SourceProfiles};

/// Initial state built from the dynamic slice at the start time.
///
/// Temperatures and densities come from the prescribed-profile getters.
/// ψ is integrated from a peaked current profile (1 − ρ̂²)^ν carrying the
/// full plasma current. Currents, ψ̇, q and shear are then filled in by the
/// finalizer so the state is consistent from the first step.
pub fn initial_core_profiles(
    dynamic_runtime_params_slice: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    charge_model: &dyn ChargeStateModel,
    source_profiles: &SourceProfiles,
) -> FusionResult<CoreProfiles> {
    let profile_conditions = &dynamic_runtime_params_slice.profile_conditions;
    let composition = &dynamic_runtime_params_slice.plasma_composition;

    let temp_ion = get_updated_ion_temperature(profile_conditions, geo)?;
    let temp_el = get_updated_electron_temperature(profile_conditions, geo)?;
    let ne = get_updated_electron_density(
        &dynamic_runtime_params_slice.numerics,
        profile_conditions,
        geo,
    )?;
    let ions = get_ion_density_and_charge_states(
        dynamic_runtime_params_slice,
        geo,
        &ne,
        &temp_el,
        charge_model,
    )?;

    let psi = initial_psi(profile_conditions, geo)?;
    let psidot = GridField::new(
        Array1::zeros(geo.nx),
        geo.drho_norm,
        FaceConstraint::Gradient(0.0),
        FaceConstraint::Value(profile_conditions.vloop_lcfs),
    );

    let core_profiles = CoreProfiles {
        temp_ion,
        temp_el,
        psi,
        psidot,
        ne,
        ni: ions.ni,
        nimp: ions.nimp,
        currents: Currents::zeros(geo.nx),
        q_face: Array1::zeros(geo.nx + 1),
        s_face: Array1::zeros(geo.nx + 1),
        nref: dynamic_runtime_params_slice.numerics.nref,
        zi: ions.zi,
        zi_face: ions.zi_face,
        ai: composition.main_ion.avg_a()?,
        zimp: ions.zimp,
        zimp_face: ions.zimp_face,
        aimp: composition.impurity.avg_a()?,
    };
    log::debug!(
        "initial profiles: nx={}, Ip={} MA, vloop mode={}",
        geo.nx,
        profile_conditions.ip_tot,
        profile_conditions.use_vloop_lcfs_boundary_condition
    );

    finalize_core_profiles(&core_profiles, dynamic_runtime_params_slice, geo, source_profiles)
}

/// ψ on cells from a current profile normalized to `ip_tot`.
fn initial_psi(
    profile_conditions: &DynamicProfileConditions,
    geo: &Geometry,
) -> FusionResult<GridField> {
    let ip_tot = profile_conditions.ip_tot;
    let nu = profile_conditions.nu;
    if !ip_tot.is_finite() {
        return Err(FusionError::ConfigError(format!(
            "ip_tot must be finite, got {ip_tot}"
        )));
    }
    if !nu.is_finite() || nu < 0.0 {
        return Err(FusionError::ConfigError(format!(
            "current peaking nu must be finite and >= 0, got {nu}"
        )));
    }

    let j_shape_face = geo.rho_face_norm.mapv(|r| (1.0 - r * r).max(0.0).powf(nu));
    let enclosed_shape = cumulative_trapezoid(
        (&j_shape_face * &geo.spr_face).view(),
        geo.rho_face_norm.view(),
        0.0,
    );
    let edge = geo.edge_face();
    let shape_total = enclosed_shape[edge];
    if shape_total <= 0.0 {
        return Err(FusionError::PhysicsViolation(format!(
            "current profile with nu={nu} encloses no current"
        )));
    }
    let ip_profile_face = enclosed_shape * (ip_tot * 1e6 / shape_total);

    // Invert I = ψ' · g2g3/ρ̂ · F / (16π³ μ0 Φb); ψ' = 0 on axis.
    let prefactor = 16.0 * PI.powi(3) * MU0_SI * geo.phib;
    let psi_grad_face = Array1::from_shape_fn(geo.nx + 1, |i| {
        if i == 0 {
            0.0
        } else {
            ip_profile_face[i] * prefactor / (geo.g2g3_over_rhon_face[i] * geo.f_face[i])
        }
    });
    let psi_face = cumulative_trapezoid(psi_grad_face.view(), geo.rho_face_norm.view(), 0.0);
    let psi_value = face_to_cell(psi_face.view());

    let right = if profile_conditions.use_vloop_lcfs_boundary_condition {
        FaceConstraint::Value(psi_face[edge])
    } else {
        FaceConstraint::Gradient(calculate_psi_grad_constraint_from_ip_tot(ip_tot, geo))
    };
    Ok(GridField::new(
        psi_value,
        geo.drho_norm,
        FaceConstraint::Gradient(0.0),
        right,
    ))
}
