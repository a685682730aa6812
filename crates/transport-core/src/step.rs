// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Timestep Pipeline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One attempted timestep: boundary conditions, solve, merge, finalize.
//!
//! The accepted state is only ever borrowed. A failed attempt returns an
//! error and leaves nothing behind; retrying restarts from the same
//! accepted state.

use crate::boundary::{compute_boundary_conditions_for_t_plus_dt, BoundaryConditions};
use crate::charge_states::ChargeStateModel;
use crate::updaters::{
    finalize_core_profiles, get_prescribed_core_profile_values, update_evolving_core_profiles,
};
use transport_types::config::{
    DynamicRuntimeParamsSlice, EvolvingVariable, RuntimeParams, StaticRuntimeParamsSlice,
};
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::{CoreProfiles, GridField, SourceProfiles};

/// Factor applied to dt after a diverged solve.
const DT_REDUCTION_FACTOR: f64 = 0.5;

/// Everything a solver sees for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub dt: f64,
    pub static_runtime_params_slice: &'a StaticRuntimeParamsSlice,
    pub dynamic_runtime_params_slice_t: &'a DynamicRuntimeParamsSlice,
    pub dynamic_runtime_params_slice_t_plus_dt: &'a DynamicRuntimeParamsSlice,
    pub geo_t: &'a Geometry,
    pub geo_t_plus_dt: &'a Geometry,
    /// Accepted state at t.
    pub core_profiles_t: &'a CoreProfiles,
    /// State at t with the t + dt boundary conditions and prescribed values installed.
    pub core_profiles_t_plus_dt: &'a CoreProfiles,
    pub evolving_names: &'a [EvolvingVariable],
}

/// Implicit solver for the evolving fields.
pub trait EvolvingSolver {
    /// New values of `request.evolving_names`, in that order.
    ///
    /// Non-convergence is reported as [`FusionError::SolverDiverged`].
    fn solve(&self, request: &SolveRequest<'_>) -> FusionResult<Vec<GridField>>;
}

/// Inputs shared by every attempt of one step.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub static_runtime_params_slice: &'a StaticRuntimeParamsSlice,
    pub dynamic_runtime_params_slice_t: &'a DynamicRuntimeParamsSlice,
    pub dynamic_runtime_params_slice_t_plus_dt: &'a DynamicRuntimeParamsSlice,
    pub geo_t: &'a Geometry,
    pub geo_t_plus_dt: &'a Geometry,
    pub source_profiles: &'a SourceProfiles,
    pub charge_model: &'a dyn ChargeStateModel,
}

/// Result of an accepted attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub core_profiles: CoreProfiles,
    pub boundary_conditions: BoundaryConditions,
    /// Timestep actually taken.
    pub dt: f64,
}

/// Advance `accepted` by `dt`.
pub fn run_timestep(
    dt: f64,
    ctx: &StepContext<'_>,
    accepted: &CoreProfiles,
    solver: &dyn EvolvingSolver,
) -> FusionResult<StepOutput> {
    let boundary_conditions = compute_boundary_conditions_for_t_plus_dt(
        dt,
        ctx.static_runtime_params_slice,
        ctx.dynamic_runtime_params_slice_t,
        ctx.dynamic_runtime_params_slice_t_plus_dt,
        ctx.geo_t_plus_dt,
        accepted,
        ctx.charge_model,
    )?;
    let core_profiles_t_plus_dt = with_prescribed_values(
        boundary_conditions.apply(accepted),
        ctx,
    )?;

    let evolving_names = ctx.static_runtime_params_slice.evolving_names();
    let request = SolveRequest {
        dt,
        static_runtime_params_slice: ctx.static_runtime_params_slice,
        dynamic_runtime_params_slice_t: ctx.dynamic_runtime_params_slice_t,
        dynamic_runtime_params_slice_t_plus_dt: ctx.dynamic_runtime_params_slice_t_plus_dt,
        geo_t: ctx.geo_t,
        geo_t_plus_dt: ctx.geo_t_plus_dt,
        core_profiles_t: accepted,
        core_profiles_t_plus_dt: &core_profiles_t_plus_dt,
        evolving_names: &evolving_names,
    };
    let x_new = solver.solve(&request)?;

    let merged = update_evolving_core_profiles(
        &x_new,
        ctx.static_runtime_params_slice,
        ctx.dynamic_runtime_params_slice_t_plus_dt,
        ctx.geo_t_plus_dt,
        &core_profiles_t_plus_dt,
        &evolving_names,
        ctx.charge_model,
    )?;
    let core_profiles = finalize_core_profiles(
        &merged,
        ctx.dynamic_runtime_params_slice_t_plus_dt,
        ctx.geo_t_plus_dt,
        ctx.source_profiles,
    )?;

    Ok(StepOutput {
        core_profiles,
        boundary_conditions,
        dt,
    })
}

/// Overwrite the non-evolved temperatures and density with their values at t + dt.
fn with_prescribed_values(
    core_profiles: CoreProfiles,
    ctx: &StepContext<'_>,
) -> FusionResult<CoreProfiles> {
    let prescribed = get_prescribed_core_profile_values(
        ctx.static_runtime_params_slice,
        ctx.dynamic_runtime_params_slice_t_plus_dt,
        ctx.geo_t_plus_dt,
        &core_profiles,
        ctx.charge_model,
    )?;
    Ok(CoreProfiles {
        temp_ion: core_profiles.temp_ion.with_value(prescribed.temp_ion),
        temp_el: core_profiles.temp_el.with_value(prescribed.temp_el),
        ne: core_profiles.ne.with_value(prescribed.ne),
        ni: core_profiles.ni.with_value(prescribed.ni),
        nimp: core_profiles.nimp.with_value(prescribed.nimp),
        zi: prescribed.zi,
        zi_face: prescribed.zi_face,
        zimp: prescribed.zimp,
        zimp_face: prescribed.zimp_face,
        ..core_profiles
    })
}

/// Advance from time `t`, halving dt whenever the solver diverges.
///
/// Every attempt restarts from `accepted`. Only [`FusionError::SolverDiverged`]
/// triggers a retry; after `max_attempts` the last divergence is returned.
#[allow(clippy::too_many_arguments)]
pub fn run_timestep_with_retry(
    runtime_params: &RuntimeParams,
    t: f64,
    dt: f64,
    max_attempts: usize,
    geo: &Geometry,
    accepted: &CoreProfiles,
    source_profiles: &SourceProfiles,
    charge_model: &dyn ChargeStateModel,
    solver: &dyn EvolvingSolver,
) -> FusionResult<StepOutput> {
    if max_attempts == 0 {
        return Err(FusionError::ConfigError(
            "max_attempts must be at least 1".to_string(),
        ));
    }
    let static_slice = runtime_params.static_slice();
    let dynamic_t = runtime_params.dynamic_slice(t, geo)?;

    let mut dt = dt;
    let mut last_error = None;
    for attempt in 1..=max_attempts {
        let dynamic_t_plus_dt = runtime_params.dynamic_slice(t + dt, geo)?;
        let ctx = StepContext {
            static_runtime_params_slice: &static_slice,
            dynamic_runtime_params_slice_t: &dynamic_t,
            dynamic_runtime_params_slice_t_plus_dt: &dynamic_t_plus_dt,
            geo_t: geo,
            geo_t_plus_dt: geo,
            source_profiles,
            charge_model,
        };
        match run_timestep(dt, &ctx, accepted, solver) {
            Ok(output) => return Ok(output),
            Err(FusionError::SolverDiverged { iteration, message }) => {
                log::warn!(
                    "attempt {attempt}/{max_attempts} at t={t}: solver diverged after \
                     {iteration} iterations ({message}); dt {dt:.3e} -> {:.3e}",
                    dt * DT_REDUCTION_FACTOR
                );
                last_error = Some(FusionError::SolverDiverged { iteration, message });
                dt *= DT_REDUCTION_FACTOR;
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        FusionError::ConfigError("no timestep attempt was made".to_string())
    }))
}
