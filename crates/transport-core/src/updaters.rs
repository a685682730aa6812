// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Core Profile Updaters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Rebuilding [`CoreProfiles`] around a solve.
//!
//! - [`update_evolving_core_profiles`] merges solver output into the state.
//! - [`get_prescribed_core_profile_values`] evaluates the non-evolved fields.
//! - [`finalize_core_profiles`] refreshes everything derived from ψ.
//!
//! Ion densities and charge states are never evolved; every path re-derives
//! them from ne and Te through the quasineutrality closure.

use crate::charge_states::ChargeStateModel;
use crate::getters::{
    get_ion_density_and_charge_states, get_updated_electron_density,
    get_updated_electron_temperature, get_updated_ion_temperature,
};
use crate::psi_calculations::{
    calc_jtot, calc_q_face, calc_s_face, calculate_psidot_from_psi_sources,
};
use crate::sources::{external_current_source, sum_sources_psi};
use ndarray::Array1;
use transport_types::config::{
    DynamicRuntimeParamsSlice, EvolvingVariable, StaticRuntimeParamsSlice,
};
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::{CoreProfiles, Currents, GridField, SourceProfiles};

/// The field of `core_profiles` that an evolving variable refers to.
pub fn evolving_field(core_profiles: &CoreProfiles, var: EvolvingVariable) -> &GridField {
    match var {
        EvolvingVariable::TempIon => &core_profiles.temp_ion,
        EvolvingVariable::TempEl => &core_profiles.temp_el,
        EvolvingVariable::Psi => &core_profiles.psi,
        EvolvingVariable::Ne => &core_profiles.ne,
    }
}

fn check_evolving_set(
    static_runtime_params_slice: &StaticRuntimeParamsSlice,
    evolving_names: &[EvolvingVariable],
    n_new: usize,
) -> FusionResult<()> {
    let expected = static_runtime_params_slice.evolving_names();
    if evolving_names != expected.as_slice() {
        return Err(FusionError::InconsistentEvolvingSet(format!(
            "evolving names {} do not match configured equations {}",
            join_names(evolving_names),
            join_names(&expected)
        )));
    }
    if n_new != evolving_names.len() {
        return Err(FusionError::InconsistentEvolvingSet(format!(
            "solver returned {n_new} fields for {} evolving names",
            evolving_names.len()
        )));
    }
    Ok(())
}

fn join_names(names: &[EvolvingVariable]) -> String {
    let parts: Vec<&str> = names.iter().map(|v| v.as_str()).collect();
    format!("[{}]", parts.join(", "))
}

/// Merge freshly solved fields into the state.
///
/// `x_new[i]` is the new value of `evolving_names[i]`. Fields that are not
/// evolved are carried over from `core_profiles`, which is expected to carry
/// the boundary constraints for t + dt already.
pub fn update_evolving_core_profiles(
    x_new: &[GridField],
    static_runtime_params_slice: &StaticRuntimeParamsSlice,
    dynamic_runtime_params_slice: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    core_profiles: &CoreProfiles,
    evolving_names: &[EvolvingVariable],
    charge_model: &dyn ChargeStateModel,
) -> FusionResult<CoreProfiles> {
    check_evolving_set(static_runtime_params_slice, evolving_names, x_new.len())?;

    let pick = |var: EvolvingVariable| -> FusionResult<GridField> {
        match evolving_names.iter().position(|v| *v == var) {
            Some(idx) => {
                let field = &x_new[idx];
                if field.len() != geo.nx {
                    return Err(FusionError::ConfigError(format!(
                        "solved {var} has {} cells, grid has {}",
                        field.len(),
                        geo.nx
                    )));
                }
                Ok(field.clone())
            }
            None => Ok(evolving_field(core_profiles, var).clone()),
        }
    };

    let temp_ion = pick(EvolvingVariable::TempIon)?;
    let temp_el = pick(EvolvingVariable::TempEl)?;
    let psi = pick(EvolvingVariable::Psi)?;
    let ne = pick(EvolvingVariable::Ne)?;

    let ions = get_ion_density_and_charge_states(
        dynamic_runtime_params_slice,
        geo,
        &ne,
        &temp_el,
        charge_model,
    )?;

    Ok(CoreProfiles {
        temp_ion,
        temp_el,
        psi,
        ne,
        ni: ions.ni,
        nimp: ions.nimp,
        zi: ions.zi,
        zi_face: ions.zi_face,
        zimp: ions.zimp,
        zimp_face: ions.zimp_face,
        ..core_profiles.clone()
    })
}

/// Cell values of the prescribed fields and the closure quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescribedValues {
    pub temp_ion: Array1<f64>,
    pub temp_el: Array1<f64>,
    pub ne: Array1<f64>,
    pub ni: Array1<f64>,
    pub nimp: Array1<f64>,
    pub zi: Array1<f64>,
    pub zi_face: Array1<f64>,
    pub zimp: Array1<f64>,
    pub zimp_face: Array1<f64>,
}

/// Values of the non-evolved fields at the time of `dynamic_runtime_params_slice`.
///
/// Prescribed temperatures and density use the same getters as initialization.
/// Evolved ones are read from `core_profiles`; their values may be stale.
pub fn get_prescribed_core_profile_values(
    static_runtime_params_slice: &StaticRuntimeParamsSlice,
    dynamic_runtime_params_slice: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    core_profiles: &CoreProfiles,
    charge_model: &dyn ChargeStateModel,
) -> FusionResult<PrescribedValues> {
    let profile_conditions = &dynamic_runtime_params_slice.profile_conditions;

    let temp_ion = if static_runtime_params_slice.ion_heat_eq {
        core_profiles.temp_ion.clone()
    } else {
        get_updated_ion_temperature(profile_conditions, geo)?
    };
    let temp_el = if static_runtime_params_slice.el_heat_eq {
        core_profiles.temp_el.clone()
    } else {
        get_updated_electron_temperature(profile_conditions, geo)?
    };
    let ne = if static_runtime_params_slice.dens_eq {
        core_profiles.ne.clone()
    } else {
        get_updated_electron_density(
            &dynamic_runtime_params_slice.numerics,
            profile_conditions,
            geo,
        )?
    };

    let ions = get_ion_density_and_charge_states(
        dynamic_runtime_params_slice,
        geo,
        &ne,
        &temp_el,
        charge_model,
    )?;

    Ok(PrescribedValues {
        temp_ion: temp_ion.value,
        temp_el: temp_el.value,
        ne: ne.value,
        ni: ions.ni.value,
        nimp: ions.nimp.value,
        zi: ions.zi,
        zi_face: ions.zi_face,
        zimp: ions.zimp,
        zimp_face: ions.zimp_face,
    })
}

/// Refresh currents, ψ̇, q and magnetic shear from the converged ψ.
///
/// The ohmic current is the residual `jtot − external − bootstrap`, so the
/// current balance holds exactly. `jtot_hires` is carried over unchanged.
pub fn finalize_core_profiles(
    core_profiles: &CoreProfiles,
    dynamic_runtime_params_slice: &DynamicRuntimeParamsSlice,
    geo: &Geometry,
    source_profiles: &SourceProfiles,
) -> FusionResult<CoreProfiles> {
    let psi = &core_profiles.psi;
    if psi.len() != geo.nx {
        return Err(FusionError::ConfigError(format!(
            "psi has {} cells, grid has {}",
            psi.len(),
            geo.nx
        )));
    }
    let bootstrap = &source_profiles.j_bootstrap;
    if bootstrap.j_bootstrap_face.len() != geo.nx + 1 {
        return Err(FusionError::ConfigError(format!(
            "j_bootstrap_face has {} faces, grid has {}",
            bootstrap.j_bootstrap_face.len(),
            geo.nx + 1
        )));
    }

    let (jtot, jtot_face, ip_profile_face) = calc_jtot(geo, psi);
    let external = external_current_source(source_profiles, geo.nx)?;
    let psi_sources = sum_sources_psi(geo, source_profiles)?;
    let psidot = calculate_psidot_from_psi_sources(
        &psi_sources,
        bootstrap,
        dynamic_runtime_params_slice.numerics.resistivity_mult,
        psi,
        geo,
    )?;
    let johm = &jtot - &external - &bootstrap.j_bootstrap;

    let currents = Currents {
        jtot,
        jtot_face,
        johm,
        external_current_source: external,
        j_bootstrap: bootstrap.j_bootstrap.clone(),
        j_bootstrap_face: bootstrap.j_bootstrap_face.clone(),
        i_bootstrap: bootstrap.i_bootstrap,
        ip_profile_face,
        sigma: bootstrap.sigma.clone(),
        jtot_hires: core_profiles.currents.jtot_hires.clone(),
    };

    Ok(CoreProfiles {
        psidot: core_profiles.psidot.with_value(psidot),
        currents,
        q_face: calc_q_face(geo, psi),
        s_face: calc_s_face(geo, psi),
        ..core_profiles.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge_states::FullyIonized;
    use crate::initialization::initial_core_profiles;
    use transport_types::config::RuntimeParams;
    use transport_types::state::BootstrapCurrentProfile;

    struct Fixture {
        params: RuntimeParams,
        geo: Geometry,
        dynamic: DynamicRuntimeParamsSlice,
        sources: SourceProfiles,
        core: CoreProfiles,
    }

    fn fixture(params: RuntimeParams) -> Fixture {
        let geo = params.create_geometry().unwrap();
        let dynamic = params.dynamic_slice(0.0, &geo).unwrap();
        let sources = SourceProfiles::new(BootstrapCurrentProfile::zero_bootstrap(
            Array1::from_elem(geo.nx, 5e7),
            Array1::from_elem(geo.nx + 1, 5e7),
        ));
        let core = initial_core_profiles(&dynamic, &geo, &FullyIonized, &sources).unwrap();
        Fixture {
            params,
            geo,
            dynamic,
            sources,
            core,
        }
    }

    #[test]
    fn test_merge_takes_evolved_and_carries_the_rest() {
        let f = fixture(RuntimeParams::default());
        let static_slice = f.params.static_slice();
        let names = static_slice.evolving_names();
        assert_eq!(names, vec![EvolvingVariable::TempIon, EvolvingVariable::TempEl]);

        let new_ti = f.core.temp_ion.with_value(&f.core.temp_ion.value * 1.1);
        let new_te = f.core.temp_el.with_value(&f.core.temp_el.value * 0.9);
        let merged = update_evolving_core_profiles(
            &[new_ti.clone(), new_te.clone()],
            &static_slice,
            &f.dynamic,
            &f.geo,
            &f.core,
            &names,
            &FullyIonized,
        )
        .unwrap();
        assert_eq!(merged.temp_ion, new_ti);
        assert_eq!(merged.temp_el, new_te);
        assert_eq!(merged.psi, f.core.psi);
        assert_eq!(merged.ne, f.core.ne);
        assert!(merged
            .quasineutrality_residual()
            .iter()
            .all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn test_merge_rejects_mismatched_names() {
        let f = fixture(RuntimeParams::default());
        let static_slice = f.params.static_slice();
        let names = [EvolvingVariable::TempIon, EvolvingVariable::Psi];
        let result = update_evolving_core_profiles(
            &[f.core.temp_ion.clone(), f.core.psi.clone()],
            &static_slice,
            &f.dynamic,
            &f.geo,
            &f.core,
            &names,
            &FullyIonized,
        );
        match result {
            Err(FusionError::InconsistentEvolvingSet(msg)) => assert!(msg.contains("psi")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_merge_rejects_reordered_names() {
        let f = fixture(RuntimeParams::default());
        let static_slice = f.params.static_slice();
        let names = [EvolvingVariable::TempEl, EvolvingVariable::TempIon];
        let result = update_evolving_core_profiles(
            &[f.core.temp_el.clone(), f.core.temp_ion.clone()],
            &static_slice,
            &f.dynamic,
            &f.geo,
            &f.core,
            &names,
            &FullyIonized,
        );
        assert!(matches!(result, Err(FusionError::InconsistentEvolvingSet(_))));
    }

    #[test]
    fn test_merge_rejects_missing_field() {
        let f = fixture(RuntimeParams::default());
        let static_slice = f.params.static_slice();
        let names = static_slice.evolving_names();
        let result = update_evolving_core_profiles(
            &[f.core.temp_ion.clone()],
            &static_slice,
            &f.dynamic,
            &f.geo,
            &f.core,
            &names,
            &FullyIonized,
        );
        assert!(matches!(result, Err(FusionError::InconsistentEvolvingSet(_))));
    }

    #[test]
    fn test_merge_recomputes_ions_from_new_density() {
        let mut params = RuntimeParams::default();
        params.numerics.dens_eq = true;
        let f = fixture(params);
        let static_slice = f.params.static_slice();
        let names = static_slice.evolving_names();
        assert_eq!(names.last(), Some(&EvolvingVariable::Ne));

        let x_new: Vec<GridField> = names
            .iter()
            .map(|v| {
                let field = evolving_field(&f.core, *v);
                if *v == EvolvingVariable::Ne {
                    field.with_value(&field.value * 1.2)
                } else {
                    field.clone()
                }
            })
            .collect();
        let merged = update_evolving_core_profiles(
            &x_new,
            &static_slice,
            &f.dynamic,
            &f.geo,
            &f.core,
            &names,
            &FullyIonized,
        )
        .unwrap();
        for i in 0..f.geo.nx {
            let expected = f.core.ni.value[i] * 1.2;
            assert!((merged.ni.value[i] - expected).abs() < 1e-12 * expected);
        }
    }

    #[test]
    fn test_prescribed_matches_initialization() {
        let f = fixture(RuntimeParams::default());
        let prescribed = get_prescribed_core_profile_values(
            &f.params.static_slice(),
            &f.dynamic,
            &f.geo,
            &f.core,
            &FullyIonized,
        )
        .unwrap();
        assert_eq!(prescribed.temp_ion, f.core.temp_ion.value);
        assert_eq!(prescribed.ne, f.core.ne.value);
        assert_eq!(prescribed.ni, f.core.ni.value);
        assert_eq!(prescribed.nimp, f.core.nimp.value);
        assert_eq!(prescribed.zimp_face, f.core.zimp_face);
    }

    #[test]
    fn test_prescribed_ignores_stale_evolved_fields_for_prescribed_ones() {
        let f = fixture(RuntimeParams::default());
        let stale = CoreProfiles {
            ne: f.core.ne.with_value(&f.core.ne.value * 3.0),
            ..f.core.clone()
        };
        let prescribed = get_prescribed_core_profile_values(
            &f.params.static_slice(),
            &f.dynamic,
            &f.geo,
            &stale,
            &FullyIonized,
        )
        .unwrap();
        // ne is prescribed in the default run, so the stale value is ignored.
        assert_eq!(prescribed.ne, f.core.ne.value);
    }

    #[test]
    fn test_finalize_conserves_current() {
        let f = fixture(RuntimeParams::default());
        let sources = f
            .sources
            .clone()
            .with_psi_source("eccd", Array1::from_elem(f.geo.nx, 2e5));
        let finalized = finalize_core_profiles(&f.core, &f.dynamic, &f.geo, &sources).unwrap();
        let scale = finalized.currents.jtot.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(finalized
            .currents
            .conservation_residual()
            .iter()
            .all(|r| r.abs() <= 1e-12 * scale));
        assert!(finalized
            .currents
            .external_current_source
            .iter()
            .all(|v| (*v - 2e5).abs() < 1e-6));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let f = fixture(RuntimeParams::default());
        let once = finalize_core_profiles(&f.core, &f.dynamic, &f.geo, &f.sources).unwrap();
        let twice = finalize_core_profiles(&once, &f.dynamic, &f.geo, &f.sources).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_finalize_passes_hires_current_through() {
        let f = fixture(RuntimeParams::default());
        let hires = Array1::linspace(1.0, 2.0, 4 * f.geo.nx);
        let mut core = f.core.clone();
        core.currents.jtot_hires = Some(hires.clone());
        let finalized = finalize_core_profiles(&core, &f.dynamic, &f.geo, &f.sources).unwrap();
        assert_eq!(finalized.currents.jtot_hires, Some(hires));
    }

    #[test]
    fn test_finalize_keeps_psidot_constraints() {
        let f = fixture(RuntimeParams::default());
        let finalized = finalize_core_profiles(&f.core, &f.dynamic, &f.geo, &f.sources).unwrap();
        assert_eq!(finalized.psidot.left, f.core.psidot.left);
        assert_eq!(finalized.psidot.right, f.core.psidot.right);
    }
}
