// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radial finite-volume mesh and flux-surface metric factors.
//!
//! The radial coordinate is the normalized toroidal-flux radius
//! ρ̂ = ρ/ρ_b with ρ = sqrt(Φ/(π B0)). Cells are uniform in ρ̂; there are
//! `nx` cell centres and `nx + 1` faces, the first face on the magnetic axis
//! and the last on the last closed flux surface.

use crate::error::{FusionError, FusionResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use ndarray::Array1;

/// Parameters of the circular, large-aspect-ratio geometry model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularGeometryParams {
    /// Number of radial cells.
    #[serde(default = "default_nx")]
    pub nx: usize,
    /// Major radius R0 [m].
    #[serde(default = "default_r_major")]
    pub r_major: f64,
    /// Minor radius a [m].
    #[serde(default = "default_a_minor")]
    pub a_minor: f64,
    /// Vacuum toroidal field on axis B0 [T].
    #[serde(default = "default_b0")]
    pub b0: f64,
    /// Rate of change of the boundary toroidal flux [Wb/s].
    #[serde(default)]
    pub phibdot: f64,
    /// Empirical correction applied to the cylindrical safety factor.
    #[serde(default = "default_q_correction_factor")]
    pub q_correction_factor: f64,
}

fn default_nx() -> usize {
    25
}
fn default_r_major() -> f64 {
    6.2
}
fn default_a_minor() -> f64 {
    2.0
}
fn default_b0() -> f64 {
    5.3
}
fn default_q_correction_factor() -> f64 {
    1.25
}

impl Default for CircularGeometryParams {
    fn default() -> Self {
        CircularGeometryParams {
            nx: default_nx(),
            r_major: default_r_major(),
            a_minor: default_a_minor(),
            b0: default_b0(),
            phibdot: 0.0,
            q_correction_factor: default_q_correction_factor(),
        }
    }
}

/// Immutable radial mesh with metric coefficients for one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub nx: usize,
    /// Uniform cell width in ρ̂.
    pub drho_norm: f64,
    /// Cell centres in ρ̂ [nx].
    pub rho_norm: Array1<f64>,
    /// Faces in ρ̂ [nx + 1].
    pub rho_face_norm: Array1<f64>,
    pub r_major: f64,
    pub a_minor: f64,
    pub b0: f64,
    /// Boundary value of the toroidal-flux radius ρ_b [m].
    pub rho_b: f64,
    /// Toroidal flux enclosed by the last closed flux surface Φb [Wb].
    pub phib: f64,
    /// dΦb/dt [Wb/s].
    pub phibdot: f64,
    /// dV/dρ̂ on cells and faces [m³].
    pub vpr: Array1<f64>,
    pub vpr_face: Array1<f64>,
    /// dA/dρ̂ on cells and faces [m²].
    pub spr_cell: Array1<f64>,
    pub spr_face: Array1<f64>,
    /// Poloidal cross-section area enclosed by each face [m²].
    pub area_face: Array1<f64>,
    /// Toroidal-field flux function F = R·Bφ on cells and faces [T·m].
    pub f: Array1<f64>,
    pub f_face: Array1<f64>,
    /// ⟨|∇V|²/R²⟩⟨1/R²⟩/ρ̂ on faces, zero on axis.
    pub g2g3_over_rhon_face: Array1<f64>,
    /// Outboard midplane major radius of each face [m].
    pub rout_face: Array1<f64>,
    pub q_correction_factor: f64,
}

impl Geometry {
    /// Build a circular geometry (unit elongation, concentric surfaces).
    pub fn circular(params: &CircularGeometryParams) -> FusionResult<Self> {
        let nx = params.nx;
        if nx < 4 {
            return Err(FusionError::ConfigError(format!(
                "geometry requires at least 4 radial cells, got {nx}"
            )));
        }
        for (name, value) in [
            ("r_major", params.r_major),
            ("a_minor", params.a_minor),
            ("b0", params.b0),
            ("q_correction_factor", params.q_correction_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FusionError::ConfigError(format!(
                    "geometry {name} must be finite and > 0, got {value}"
                )));
            }
        }
        if params.a_minor >= params.r_major {
            return Err(FusionError::ConfigError(format!(
                "geometry requires a_minor < r_major, got a={} R={}",
                params.a_minor, params.r_major
            )));
        }
        if !params.phibdot.is_finite() {
            return Err(FusionError::ConfigError(
                "geometry phibdot must be finite".to_string(),
            ));
        }

        let r_major = params.r_major;
        let rho_b = params.a_minor;
        let phib = PI * params.b0 * rho_b * rho_b;

        let drho_norm = 1.0 / nx as f64;
        let rho_face_norm = Array1::linspace(0.0, 1.0, nx + 1);
        let rho_norm = Array1::from_shape_fn(nx, |i| (i as f64 + 0.5) * drho_norm);

        // V = 2π² R ρ², A = π ρ² with ρ = ρ̂ ρ_b
        let vpr_of = |rn: f64| 4.0 * PI * PI * r_major * rho_b * rho_b * rn;
        let spr_of = |rn: f64| 2.0 * PI * rho_b * rho_b * rn;
        let vpr = rho_norm.mapv(vpr_of);
        let vpr_face = rho_face_norm.mapv(vpr_of);
        let spr_cell = rho_norm.mapv(spr_of);
        let spr_face = rho_face_norm.mapv(spr_of);
        let area_face = rho_face_norm.mapv(|rn| PI * (rn * rho_b).powi(2));

        let f = Array1::from_elem(nx, params.b0 * r_major);
        let f_face = Array1::from_elem(nx + 1, params.b0 * r_major);

        // g2 = V'²/R², g3 = ⟨1/R²⟩ for concentric circles
        let g2g3_over_rhon_face = Array1::from_shape_fn(nx + 1, |i| {
            let rn = rho_face_norm[i];
            if i == 0 {
                return 0.0;
            }
            let g2 = vpr_face[i] * vpr_face[i] / (r_major * r_major);
            let eps = rn * rho_b / r_major;
            let g3 = 1.0 / (r_major * r_major * (1.0 - eps * eps).powf(1.5));
            g2 * g3 / rn
        });

        let rout_face = rho_face_norm.mapv(|rn| r_major + rn * params.a_minor);

        Ok(Geometry {
            nx,
            drho_norm,
            rho_norm,
            rho_face_norm,
            r_major,
            a_minor: params.a_minor,
            b0: params.b0,
            rho_b,
            phib,
            phibdot: params.phibdot,
            vpr,
            vpr_face,
            spr_cell,
            spr_face,
            area_face,
            f,
            f_face,
            g2g3_over_rhon_face,
            rout_face,
            q_correction_factor: params.q_correction_factor,
        })
    }

    /// Index of the last face (the plasma edge).
    pub fn edge_face(&self) -> usize {
        self.nx
    }
}
