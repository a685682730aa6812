// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Current Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Aggregation of externally computed current-density sources.

use ndarray::Array1;
use std::f64::consts::PI;
use transport_types::constants::MU0_SI;
use transport_types::error::{FusionError, FusionResult};
use transport_types::geometry::Geometry;
use transport_types::state::SourceProfiles;

/// Sum of all named external current-density profiles [A/m²].
///
/// Summation follows the map's key order. No sources gives zeros.
pub fn external_current_source(sources: &SourceProfiles, nx: usize) -> FusionResult<Array1<f64>> {
    let mut total = Array1::zeros(nx);
    for (name, profile) in &sources.psi {
        if profile.len() != nx {
            return Err(FusionError::ConfigError(format!(
                "psi source '{name}' length {} must equal cell count {nx}",
                profile.len()
            )));
        }
        if profile.iter().any(|v| !v.is_finite()) {
            return Err(FusionError::PhysicsViolation(format!(
                "psi source '{name}' contains non-finite values"
            )));
        }
        total += profile;
    }
    Ok(total)
}

/// Right-hand-side source of the flux equation from bootstrap and external currents.
///
/// S_ψ = −8π² μ0 B0 Φb V' / F² · (j_bs + Σ j_ext)
pub fn sum_sources_psi(geo: &Geometry, sources: &SourceProfiles) -> FusionResult<Array1<f64>> {
    let bootstrap = &sources.j_bootstrap.j_bootstrap;
    if bootstrap.len() != geo.nx {
        return Err(FusionError::ConfigError(format!(
            "j_bootstrap length {} must equal cell count {}",
            bootstrap.len(),
            geo.nx
        )));
    }
    let total = external_current_source(sources, geo.nx)? + bootstrap;
    let prefactor = &geo.vpr * (8.0 * PI * PI * geo.b0 * MU0_SI * geo.phib)
        / &geo.f.mapv(|f| f * f);
    Ok(-(prefactor * total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport_types::geometry::CircularGeometryParams;
    use transport_types::state::BootstrapCurrentProfile;

    fn empty_sources(nx: usize) -> SourceProfiles {
        SourceProfiles::new(BootstrapCurrentProfile::zero_bootstrap(
            Array1::from_elem(nx, 1e8),
            Array1::from_elem(nx + 1, 1e8),
        ))
    }

    #[test]
    fn test_no_sources_sum_to_zero() {
        let geo = Geometry::circular(&CircularGeometryParams::default()).unwrap();
        let sources = empty_sources(geo.nx);
        let ext = external_current_source(&sources, geo.nx).unwrap();
        assert!(ext.iter().all(|v| *v == 0.0));
        let s = sum_sources_psi(&geo, &sources).unwrap();
        assert!(s.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_external_sources_are_summed() {
        let nx = 10;
        let sources = empty_sources(nx)
            .with_psi_source("eccd", Array1::from_elem(nx, 1.0e5))
            .with_psi_source("nbi", Array1::from_elem(nx, 2.5e5));
        let ext = external_current_source(&sources, nx).unwrap();
        assert!(ext.iter().all(|v| (*v - 3.5e5).abs() < 1e-6));
    }

    #[test]
    fn test_positive_current_gives_negative_flux_source() {
        let geo = Geometry::circular(&CircularGeometryParams::default()).unwrap();
        let sources = empty_sources(geo.nx).with_psi_source("eccd", Array1::from_elem(geo.nx, 1e5));
        let s = sum_sources_psi(&geo, &sources).unwrap();
        assert!(s.iter().all(|v| *v < 0.0));
        // Proportional to V', which grows linearly with ρ̂.
        assert!(s[geo.nx - 1].abs() > s[0].abs());
    }

    #[test]
    fn test_source_length_mismatch() {
        let sources = empty_sources(8).with_psi_source("bad", Array1::zeros(5));
        match external_current_source(&sources, 8) {
            Err(FusionError::ConfigError(msg)) => assert!(msg.contains("bad")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }
}
