// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array1, Zip};
use std::collections::BTreeMap;

/// Constraint imposed on one face of a [`GridField`].
///
/// A face carries either a value (Dirichlet) or a gradient (Neumann)
/// constraint, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceConstraint {
    Value(f64),
    Gradient(f64),
}

impl FaceConstraint {
    pub fn value(self) -> Option<f64> {
        match self {
            FaceConstraint::Value(v) => Some(v),
            FaceConstraint::Gradient(_) => None,
        }
    }

    pub fn gradient(self) -> Option<f64> {
        match self {
            FaceConstraint::Gradient(g) => Some(g),
            FaceConstraint::Value(_) => None,
        }
    }
}

/// Field sampled at cell centres of a uniform radial grid, with one
/// constraint per boundary face.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    pub value: Array1<f64>,
    /// Cell width in ρ̂.
    pub dr: f64,
    pub left: FaceConstraint,
    pub right: FaceConstraint,
}

impl GridField {
    pub fn new(value: Array1<f64>, dr: f64, left: FaceConstraint, right: FaceConstraint) -> Self {
        GridField {
            value,
            dr,
            left,
            right,
        }
    }

    /// Zero-gradient on axis, fixed value at the edge.
    pub fn with_edge_value(value: Array1<f64>, dr: f64, right_value: f64) -> Self {
        Self::new(
            value,
            dr,
            FaceConstraint::Gradient(0.0),
            FaceConstraint::Value(right_value),
        )
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn left_face_constraint(&self) -> Option<f64> {
        self.left.value()
    }

    pub fn left_face_grad_constraint(&self) -> Option<f64> {
        self.left.gradient()
    }

    pub fn right_face_constraint(&self) -> Option<f64> {
        self.right.value()
    }

    pub fn right_face_grad_constraint(&self) -> Option<f64> {
        self.right.gradient()
    }

    /// Same constraints, new cell values.
    pub fn with_value(&self, value: Array1<f64>) -> Self {
        GridField {
            value,
            dr: self.dr,
            left: self.left,
            right: self.right,
        }
    }

    /// Same cell values, new boundary constraints.
    pub fn with_constraints(&self, left: FaceConstraint, right: FaceConstraint) -> Self {
        GridField {
            value: self.value.clone(),
            dr: self.dr,
            left,
            right,
        }
    }

    /// Values on the `n + 1` faces.
    ///
    /// Interior faces average their neighbours. A gradient-constrained left
    /// face takes the first cell value; a gradient-constrained right face is
    /// extrapolated half a cell with the constrained slope.
    pub fn face_value(&self) -> Array1<f64> {
        let n = self.value.len();
        let mut face = Array1::zeros(n + 1);
        for i in 1..n {
            face[i] = 0.5 * (self.value[i - 1] + self.value[i]);
        }
        face[0] = match self.left {
            FaceConstraint::Value(v) => v,
            FaceConstraint::Gradient(_) => self.value[0],
        };
        face[n] = match self.right {
            FaceConstraint::Value(v) => v,
            FaceConstraint::Gradient(g) => self.value[n - 1] + g * self.dr / 2.0,
        };
        face
    }

    /// Gradients on the `n + 1` faces.
    pub fn face_grad(&self) -> Array1<f64> {
        let n = self.value.len();
        let mut grad = Array1::zeros(n + 1);
        for i in 1..n {
            grad[i] = (self.value[i] - self.value[i - 1]) / self.dr;
        }
        let half = 0.5 * self.dr;
        grad[0] = match self.left {
            FaceConstraint::Value(v) => (self.value[0] - v) / half,
            FaceConstraint::Gradient(g) => g,
        };
        grad[n] = match self.right {
            FaceConstraint::Value(v) => (v - self.value[n - 1]) / half,
            FaceConstraint::Gradient(g) => g,
        };
        grad
    }

    /// Cell-centred gradient from differences of face values.
    pub fn grad(&self) -> Array1<f64> {
        let face = self.face_value();
        let n = self.value.len();
        Array1::from_shape_fn(n, |i| (face[i + 1] - face[i]) / self.dr)
    }
}

/// Current densities and related profiles derived from the poloidal flux.
#[derive(Debug, Clone, PartialEq)]
pub struct Currents {
    /// Total toroidal current density [A/m²].
    pub jtot: Array1<f64>,
    pub jtot_face: Array1<f64>,
    /// Ohmic current density, the residual of `jtot` [A/m²].
    pub johm: Array1<f64>,
    /// Sum of all non-bootstrap driven currents [A/m²].
    pub external_current_source: Array1<f64>,
    pub j_bootstrap: Array1<f64>,
    pub j_bootstrap_face: Array1<f64>,
    /// Integrated bootstrap current [A].
    pub i_bootstrap: f64,
    /// Current enclosed by each face [A].
    pub ip_profile_face: Array1<f64>,
    /// Neoclassical conductivity [S/m].
    pub sigma: Array1<f64>,
    /// Total current on a refined grid, owned by an external pass.
    pub jtot_hires: Option<Array1<f64>>,
}

impl Currents {
    pub fn zeros(nx: usize) -> Self {
        Currents {
            jtot: Array1::zeros(nx),
            jtot_face: Array1::zeros(nx + 1),
            johm: Array1::zeros(nx),
            external_current_source: Array1::zeros(nx),
            j_bootstrap: Array1::zeros(nx),
            j_bootstrap_face: Array1::zeros(nx + 1),
            i_bootstrap: 0.0,
            ip_profile_face: Array1::zeros(nx + 1),
            sigma: Array1::zeros(nx),
            jtot_hires: None,
        }
    }

    /// Pointwise `jtot − (external + bootstrap + ohmic)`.
    pub fn conservation_residual(&self) -> Array1<f64> {
        &self.jtot - &self.external_current_source - &self.j_bootstrap - &self.johm
    }
}

/// Complete 1-D plasma state at one time.
///
/// Values are replaced, never updated in place: every update builds a new
/// `CoreProfiles` from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreProfiles {
    /// Ion temperature [keV].
    pub temp_ion: GridField,
    /// Electron temperature [keV].
    pub temp_el: GridField,
    /// Poloidal flux [Wb].
    pub psi: GridField,
    /// Time derivative of the poloidal flux [V].
    pub psidot: GridField,
    /// Electron, main-ion and impurity densities [nref].
    pub ne: GridField,
    pub ni: GridField,
    pub nimp: GridField,
    pub currents: Currents,
    pub q_face: Array1<f64>,
    pub s_face: Array1<f64>,
    /// Density reference [m^-3].
    pub nref: f64,
    /// Average main-ion charge on cells and faces.
    pub zi: Array1<f64>,
    pub zi_face: Array1<f64>,
    /// Average main-ion mass [amu].
    pub ai: f64,
    /// Average impurity charge on cells and faces.
    pub zimp: Array1<f64>,
    pub zimp_face: Array1<f64>,
    /// Average impurity mass [amu].
    pub aimp: f64,
}

impl CoreProfiles {
    pub fn nx(&self) -> usize {
        self.ne.len()
    }

    /// Pointwise `ne − (ni·Zi + nimp·Zimp)` on cells.
    pub fn quasineutrality_residual(&self) -> Array1<f64> {
        let mut residual = self.ne.value.clone();
        Zip::from(&mut residual)
            .and(&self.ni.value)
            .and(&self.zi)
            .and(&self.nimp.value)
            .and(&self.zimp)
            .for_each(|r, &ni, &zi, &nimp, &zimp| *r -= ni * zi + nimp * zimp);
        residual
    }
}

/// Bootstrap current together with the conductivity it was computed with.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapCurrentProfile {
    /// Conductivity on cells and faces [S/m].
    pub sigma: Array1<f64>,
    pub sigma_face: Array1<f64>,
    /// Bootstrap current density on cells and faces [A/m²].
    pub j_bootstrap: Array1<f64>,
    pub j_bootstrap_face: Array1<f64>,
    /// Integrated bootstrap current [A].
    pub i_bootstrap: f64,
}

impl BootstrapCurrentProfile {
    /// No bootstrap current, only a conductivity profile.
    pub fn zero_bootstrap(sigma: Array1<f64>, sigma_face: Array1<f64>) -> Self {
        let nx = sigma.len();
        BootstrapCurrentProfile {
            sigma,
            sigma_face,
            j_bootstrap: Array1::zeros(nx),
            j_bootstrap_face: Array1::zeros(nx + 1),
            i_bootstrap: 0.0,
        }
    }
}

/// Aggregated source contributions for one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProfiles {
    pub j_bootstrap: BootstrapCurrentProfile,
    /// Externally driven current densities on cells [A/m²], keyed by source name.
    pub psi: BTreeMap<String, Array1<f64>>,
}

impl SourceProfiles {
    pub fn new(j_bootstrap: BootstrapCurrentProfile) -> Self {
        SourceProfiles {
            j_bootstrap,
            psi: BTreeMap::new(),
        }
    }

    pub fn with_psi_source(mut self, name: impl Into<String>, profile: Array1<f64>) -> Self {
        self.psi.insert(name.into(), profile);
        self
    }
}
