// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Boundary Conditions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Edge constraints for the fields solved at t + dt.
//!
//! Temperatures and densities get a zero gradient on axis and a fixed value
//! at the last closed flux surface. The poloidal flux is constrained at the
//! edge either by its gradient (total plasma current) or by its value
//! (loop voltage), never both.

use crate::charge_states::ChargeStateModel;
use crate::formulas::main_ion_dilution_factor;
use crate::getters::get_updated_electron_density;
use crate::psi_calculations::{
    calculate_psi_grad_constraint_from_ip_tot, calculate_psi_value_constraint_from_vloop,
};
use transport_types::config::{DynamicRuntimeParamsSlice, StaticRuntimeParamsSlice};
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::{CoreProfiles, FaceConstraint, GridField};

/// Constraint update for one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBoundary {
    pub left_face_grad_constraint: f64,
    pub right: FaceConstraint,
}

impl FieldBoundary {
    /// Zero gradient on axis, fixed value at the edge.
    pub fn edge_value(value: f64) -> Self {
        FieldBoundary {
            left_face_grad_constraint: 0.0,
            right: FaceConstraint::Value(value),
        }
    }

    /// Zero gradient on axis, fixed gradient at the edge.
    pub fn edge_gradient(gradient: f64) -> Self {
        FieldBoundary {
            left_face_grad_constraint: 0.0,
            right: FaceConstraint::Gradient(gradient),
        }
    }

    pub fn right_face_constraint(&self) -> Option<f64> {
        self.right.value()
    }

    pub fn right_face_grad_constraint(&self) -> Option<f64> {
        self.right.gradient()
    }

    /// Install the constraints on `field`, keeping its values.
    pub fn apply_to(&self, field: &GridField) -> GridField {
        field.with_constraints(
            FaceConstraint::Gradient(self.left_face_grad_constraint),
            self.right,
        )
    }
}

/// How the poloidal flux is pinned at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsiBoundaryMode {
    /// Edge gradient set by the total plasma current.
    CurrentDriven,
    /// Edge value advanced with the loop voltage.
    LoopVoltageDriven,
}

/// Boundary constraints for every field at t + dt.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConditions {
    pub temp_ion: FieldBoundary,
    pub temp_el: FieldBoundary,
    pub ne: FieldBoundary,
    pub ni: FieldBoundary,
    pub nimp: FieldBoundary,
    pub psi: FieldBoundary,
    /// Edge charge states at `te_bound_right`.
    pub zi_edge: f64,
    pub zimp_edge: f64,
}

impl BoundaryConditions {
    pub fn psi_mode(&self) -> PsiBoundaryMode {
        match self.psi.right {
            FaceConstraint::Gradient(_) => PsiBoundaryMode::CurrentDriven,
            FaceConstraint::Value(_) => PsiBoundaryMode::LoopVoltageDriven,
        }
    }

    /// New state with these constraints installed. Cell values and `psidot`
    /// are left as they are.
    pub fn apply(&self, core_profiles: &CoreProfiles) -> CoreProfiles {
        CoreProfiles {
            temp_ion: self.temp_ion.apply_to(&core_profiles.temp_ion),
            temp_el: self.temp_el.apply_to(&core_profiles.temp_el),
            ne: self.ne.apply_to(&core_profiles.ne),
            ni: self.ni.apply_to(&core_profiles.ni),
            nimp: self.nimp.apply_to(&core_profiles.nimp),
            psi: self.psi.apply_to(&core_profiles.psi),
            ..core_profiles.clone()
        }
    }
}

/// Resolve the edge constraints for the step from `t` to `t + dt`.
///
/// Edge temperatures and densities are taken from the dynamic slice at
/// t + dt. The edge ion densities close quasineutrality exactly with the edge
/// charge states and Zeff. In loop-voltage mode the edge flux is advanced
/// from its value in `core_profiles_t`.
pub fn compute_boundary_conditions_for_t_plus_dt(
    dt: f64,
    static_runtime_params_slice: &StaticRuntimeParamsSlice,
    dynamic_runtime_params_slice_t: &DynamicRuntimeParamsSlice,
    dynamic_runtime_params_slice_t_plus_dt: &DynamicRuntimeParamsSlice,
    geo_t_plus_dt: &Geometry,
    core_profiles_t: &CoreProfiles,
    charge_model: &dyn ChargeStateModel,
) -> FusionResult<BoundaryConditions> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(FusionError::ConfigError(format!(
            "timestep must be finite and > 0, got {dt}"
        )));
    }
    let profile_conditions = &dynamic_runtime_params_slice_t_plus_dt.profile_conditions;
    let composition = &dynamic_runtime_params_slice_t_plus_dt.plasma_composition;

    let ti_bound_right = profile_conditions.ti_bound_right;
    let te_bound_right = profile_conditions.te_bound_right;
    for (name, value) in [
        ("ti_bound_right", ti_bound_right),
        ("te_bound_right", te_bound_right),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(FusionError::InvalidBoundaryCondition { name, value });
        }
    }

    let ne = get_updated_electron_density(
        &dynamic_runtime_params_slice_t_plus_dt.numerics,
        profile_conditions,
        geo_t_plus_dt,
    )?;
    let ne_bound_right = ne.right_face_constraint().ok_or_else(|| {
        FusionError::ConfigError(
            "electron density requires a value constraint at the edge face".to_string(),
        )
    })?;

    let zi_edge = charge_model.average_charge_state(&composition.main_ion, te_bound_right)?;
    let zimp_edge = charge_model.average_charge_state(&composition.impurity, te_bound_right)?;

    let edge = geo_t_plus_dt.edge_face();
    let zeff_edge = *composition.zeff_face.get(edge).ok_or_else(|| {
        FusionError::ConfigError(format!(
            "zeff_face has {} entries, edge face index is {edge}",
            composition.zeff_face.len()
        ))
    })?;
    let dilution_factor_edge = main_ion_dilution_factor(zi_edge, zimp_edge, zeff_edge)?;
    let ni_bound_right = ne_bound_right * dilution_factor_edge;
    let nimp_bound_right = (ne_bound_right - ni_bound_right * zi_edge) / zimp_edge;

    let psi = if profile_conditions.use_vloop_lcfs_boundary_condition {
        let psi_lcfs_t = core_profiles_t.psi.face_value()[core_profiles_t.psi.len()];
        let value = calculate_psi_value_constraint_from_vloop(
            dt,
            static_runtime_params_slice.theta_imp,
            dynamic_runtime_params_slice_t.profile_conditions.vloop_lcfs,
            profile_conditions.vloop_lcfs,
            psi_lcfs_t,
        );
        log::debug!("psi edge constraint from loop voltage: psi_lcfs={value:.6e} Wb");
        FieldBoundary::edge_value(value)
    } else {
        let gradient =
            calculate_psi_grad_constraint_from_ip_tot(profile_conditions.ip_tot, geo_t_plus_dt);
        log::debug!(
            "psi edge constraint from Ip={} MA: dpsi/drho={gradient:.6e}",
            profile_conditions.ip_tot
        );
        FieldBoundary::edge_gradient(gradient)
    };

    Ok(BoundaryConditions {
        temp_ion: FieldBoundary::edge_value(ti_bound_right),
        temp_el: FieldBoundary::edge_value(te_bound_right),
        ne: FieldBoundary::edge_value(ne_bound_right),
        ni: FieldBoundary::edge_value(ni_bound_right),
        nimp: FieldBoundary::edge_value(nimp_bound_right),
        psi,
        zi_edge,
        zimp_edge,
    })
}
