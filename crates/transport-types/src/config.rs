// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{ion_properties, DEFAULT_NREF};
use crate::error::{FusionError, FusionResult};
use crate::geometry::{CircularGeometryParams, Geometry};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use transport_math::interp::{interp1d, interp1d_array};

/// Tolerance on the sum of mixture fractions.
const FRACTION_SUM_TOLERANCE: f64 = 1e-6;

/// Fields that the implicit solver may evolve, in canonical solver order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvolvingVariable {
    TempIon,
    TempEl,
    Psi,
    Ne,
}

impl EvolvingVariable {
    pub const ALL: [EvolvingVariable; 4] = [
        EvolvingVariable::TempIon,
        EvolvingVariable::TempEl,
        EvolvingVariable::Psi,
        EvolvingVariable::Ne,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EvolvingVariable::TempIon => "temp_ion",
            EvolvingVariable::TempEl => "temp_el",
            EvolvingVariable::Psi => "psi",
            EvolvingVariable::Ne => "ne",
        }
    }
}

impl fmt::Display for EvolvingVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvolvingVariable {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvolvingVariable::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                FusionError::InconsistentEvolvingSet(format!("unknown evolving variable '{s}'"))
            })
    }
}

/// Scalar that may vary in time: a constant or piecewise-linear `[t, value]` knots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSeries {
    Constant(f64),
    Knots(Vec<[f64; 2]>),
}

impl TimeSeries {
    /// Value at time `t`, held constant outside the knot range.
    pub fn at(&self, t: f64) -> f64 {
        match self {
            TimeSeries::Constant(v) => *v,
            TimeSeries::Knots(knots) => {
                let ts: Vec<f64> = knots.iter().map(|k| k[0]).collect();
                let vs: Vec<f64> = knots.iter().map(|k| k[1]).collect();
                interp1d(&ts, &vs, t)
            }
        }
    }

    fn validate(&self, name: &str) -> FusionResult<()> {
        match self {
            TimeSeries::Constant(v) if !v.is_finite() => Err(FusionError::ConfigError(format!(
                "{name} must be finite, got {v}"
            ))),
            TimeSeries::Constant(_) => Ok(()),
            TimeSeries::Knots(knots) => validate_knots(name, knots),
        }
    }
}

impl From<f64> for TimeSeries {
    fn from(v: f64) -> Self {
        TimeSeries::Constant(v)
    }
}

/// Radial profile given as piecewise-linear `[rho_norm, value]` knots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RadialProfile {
    pub knots: Vec<[f64; 2]>,
}

impl RadialProfile {
    pub fn new(knots: Vec<[f64; 2]>) -> Self {
        RadialProfile { knots }
    }

    pub fn constant(v: f64) -> Self {
        RadialProfile {
            knots: vec![[0.0, v]],
        }
    }

    pub fn at(&self, rho_norm: f64) -> f64 {
        let xs: Vec<f64> = self.knots.iter().map(|k| k[0]).collect();
        let ys: Vec<f64> = self.knots.iter().map(|k| k[1]).collect();
        interp1d(&xs, &ys, rho_norm)
    }

    /// Sample the profile on a radial grid.
    pub fn on_grid(&self, rho_norm: &Array1<f64>) -> Array1<f64> {
        let xs: Vec<f64> = self.knots.iter().map(|k| k[0]).collect();
        let ys: Vec<f64> = self.knots.iter().map(|k| k[1]).collect();
        interp1d_array(&xs, &ys, rho_norm.view())
    }

    fn validate(&self, name: &str) -> FusionResult<()> {
        validate_knots(name, &self.knots)
    }
}

fn validate_knots(name: &str, knots: &[[f64; 2]]) -> FusionResult<()> {
    if knots.is_empty() {
        return Err(FusionError::ConfigError(format!(
            "{name} requires at least one knot"
        )));
    }
    if knots.iter().flatten().any(|v| !v.is_finite()) {
        return Err(FusionError::ConfigError(format!(
            "{name} knots must be finite"
        )));
    }
    if knots.windows(2).any(|w| w[1][0] <= w[0][0]) {
        return Err(FusionError::ConfigError(format!(
            "{name} knot coordinates must be strictly increasing"
        )));
    }
    Ok(())
}

/// Mixture of ion species with fractional abundances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonMixture {
    /// Species symbol → fraction. Fractions sum to 1.
    pub species: BTreeMap<String, f64>,
    /// Fixed average charge, bypassing the charge-state model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_override: Option<f64>,
    /// Fixed average mass [amu].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_override: Option<f64>,
}

impl IonMixture {
    pub fn single(symbol: &str) -> Self {
        IonMixture {
            species: BTreeMap::from([(symbol.to_string(), 1.0)]),
            z_override: None,
            a_override: None,
        }
    }

    pub fn from_fractions(fractions: &[(&str, f64)]) -> Self {
        IonMixture {
            species: fractions
                .iter()
                .map(|(s, f)| (s.to_string(), *f))
                .collect(),
            z_override: None,
            a_override: None,
        }
    }

    /// Fraction-weighted atomic mass [amu].
    pub fn avg_a(&self) -> FusionResult<f64> {
        if let Some(a) = self.a_override {
            return Ok(a);
        }
        let mut total = 0.0;
        for (symbol, fraction) in &self.species {
            let ion = ion_properties(symbol).ok_or_else(|| {
                FusionError::ConfigError(format!("unknown ion species '{symbol}'"))
            })?;
            total += fraction * ion.a;
        }
        Ok(total)
    }

    pub fn validate(&self, name: &str) -> FusionResult<()> {
        if self.species.is_empty() {
            return Err(FusionError::ConfigError(format!(
                "{name} mixture must contain at least one species"
            )));
        }
        let mut sum = 0.0;
        for (symbol, fraction) in &self.species {
            if ion_properties(symbol).is_none() {
                return Err(FusionError::ConfigError(format!(
                    "{name} mixture contains unknown ion species '{symbol}'"
                )));
            }
            if !fraction.is_finite() || *fraction < 0.0 {
                return Err(FusionError::ConfigError(format!(
                    "{name} fraction for '{symbol}' must be finite and >= 0, got {fraction}"
                )));
            }
            sum += fraction;
        }
        if (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            return Err(FusionError::ConfigError(format!(
                "{name} fractions must sum to 1, got {sum}"
            )));
        }
        for (label, value) in [("z_override", self.z_override), ("a_override", self.a_override)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(FusionError::ConfigError(format!(
                        "{name} {label} must be finite and > 0, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Prescribed profiles and edge targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConditions {
    /// Total plasma current [MA].
    #[serde(default = "default_ip_tot")]
    pub ip_tot: TimeSeries,
    /// Loop voltage at the last closed flux surface [V].
    #[serde(default = "default_vloop_lcfs")]
    pub vloop_lcfs: TimeSeries,
    /// Select the loop-voltage (value) psi boundary instead of the current (gradient) one.
    #[serde(default)]
    pub use_vloop_lcfs_boundary_condition: bool,
    /// Ion and electron temperature profiles [keV].
    #[serde(default = "default_temperature_profile")]
    pub ti: RadialProfile,
    #[serde(default = "default_temperature_profile")]
    pub te: RadialProfile,
    /// Edge temperatures [keV]; the profile value at ρ̂ = 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ti_bound_right: Option<TimeSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub te_bound_right: Option<TimeSeries>,
    /// Electron density profile [nref, or Greenwald fraction].
    #[serde(default = "default_ne_profile")]
    pub ne: RadialProfile,
    #[serde(default = "default_true")]
    pub ne_is_fgw: bool,
    /// Edge electron density; the profile value at ρ̂ = 1 when absent.
    #[serde(default = "default_ne_bound_right")]
    pub ne_bound_right: Option<TimeSeries>,
    #[serde(default = "default_true")]
    pub ne_bound_right_is_fgw: bool,
    /// Target line-averaged density.
    #[serde(default = "default_nbar")]
    pub nbar: TimeSeries,
    #[serde(default = "default_true")]
    pub nbar_is_fgw: bool,
    #[serde(default = "default_true")]
    pub normalize_to_nbar: bool,
    /// Peaking exponent of the initial current profile (1 − ρ̂²)^nu.
    #[serde(default = "default_nu")]
    pub nu: f64,
}

fn default_ip_tot() -> TimeSeries {
    TimeSeries::Constant(15.0)
}
fn default_vloop_lcfs() -> TimeSeries {
    TimeSeries::Constant(0.0)
}
fn default_temperature_profile() -> RadialProfile {
    RadialProfile::new(vec![[0.0, 15.0], [1.0, 1.0]])
}
fn default_ne_profile() -> RadialProfile {
    RadialProfile::new(vec![[0.0, 1.5], [1.0, 1.0]])
}
fn default_ne_bound_right() -> Option<TimeSeries> {
    Some(TimeSeries::Constant(0.5))
}
fn default_nbar() -> TimeSeries {
    TimeSeries::Constant(0.85)
}
fn default_nu() -> f64 {
    3.0
}
fn default_true() -> bool {
    true
}

impl Default for ProfileConditions {
    fn default() -> Self {
        ProfileConditions {
            ip_tot: default_ip_tot(),
            vloop_lcfs: default_vloop_lcfs(),
            use_vloop_lcfs_boundary_condition: false,
            ti: default_temperature_profile(),
            te: default_temperature_profile(),
            ti_bound_right: None,
            te_bound_right: None,
            ne: default_ne_profile(),
            ne_is_fgw: true,
            ne_bound_right: default_ne_bound_right(),
            ne_bound_right_is_fgw: true,
            nbar: default_nbar(),
            nbar_is_fgw: true,
            normalize_to_nbar: true,
            nu: default_nu(),
        }
    }
}

/// Equation selection and numerical multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Numerics {
    #[serde(default)]
    pub t_initial: f64,
    #[serde(default = "default_t_final")]
    pub t_final: f64,
    #[serde(default = "default_true")]
    pub ion_heat_eq: bool,
    #[serde(default = "default_true")]
    pub el_heat_eq: bool,
    #[serde(default)]
    pub dens_eq: bool,
    #[serde(default)]
    pub current_eq: bool,
    /// Multiplier on resistivity, shortens the current diffusion time when > 1.
    #[serde(default = "default_resistivity_mult")]
    pub resistivity_mult: f64,
    /// Density reference [m^-3].
    #[serde(default = "default_nref")]
    pub nref: f64,
}

fn default_t_final() -> f64 {
    5.0
}
fn default_resistivity_mult() -> f64 {
    1.0
}
fn default_nref() -> f64 {
    DEFAULT_NREF
}

impl Default for Numerics {
    fn default() -> Self {
        Numerics {
            t_initial: 0.0,
            t_final: default_t_final(),
            ion_heat_eq: true,
            el_heat_eq: true,
            dens_eq: false,
            current_eq: false,
            resistivity_mult: default_resistivity_mult(),
            nref: default_nref(),
        }
    }
}

/// Main-ion and impurity species with the effective charge profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlasmaComposition {
    #[serde(default = "default_main_ion")]
    pub main_ion: IonMixture,
    #[serde(default = "default_impurity")]
    pub impurity: IonMixture,
    #[serde(default = "default_zeff")]
    pub zeff: RadialProfile,
}

fn default_main_ion() -> IonMixture {
    IonMixture::single("D")
}
fn default_impurity() -> IonMixture {
    IonMixture::single("Ne")
}
fn default_zeff() -> RadialProfile {
    RadialProfile::constant(1.6)
}

impl Default for PlasmaComposition {
    fn default() -> Self {
        PlasmaComposition {
            main_ion: default_main_ion(),
            impurity: default_impurity(),
            zeff: default_zeff(),
        }
    }
}

/// Time-stepping scheme parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperParams {
    /// Implicit weight θ: 0 explicit, 1 fully implicit.
    #[serde(default = "default_theta_imp")]
    pub theta_imp: f64,
}

fn default_theta_imp() -> f64 {
    1.0
}

impl Default for StepperParams {
    fn default() -> Self {
        StepperParams {
            theta_imp: default_theta_imp(),
        }
    }
}

/// Top-level runtime configuration, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeParams {
    #[serde(default)]
    pub geometry: CircularGeometryParams,
    #[serde(default)]
    pub profile_conditions: ProfileConditions,
    #[serde(default)]
    pub numerics: Numerics,
    #[serde(default)]
    pub plasma_composition: PlasmaComposition,
    #[serde(default)]
    pub stepper: StepperParams,
}

impl RuntimeParams {
    /// Load and validate a JSON runtime configuration.
    pub fn from_file(path: &str) -> FusionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> FusionResult<()> {
        self.validate_interpolants()?;
        let pc = &self.profile_conditions;
        if !pc.nu.is_finite() || pc.nu < 0.0 {
            return Err(FusionError::ConfigError(format!(
                "nu must be finite and >= 0, got {}",
                pc.nu
            )));
        }

        let num = &self.numerics;
        if !num.resistivity_mult.is_finite() || num.resistivity_mult <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "resistivity_mult must be finite and > 0, got {}",
                num.resistivity_mult
            )));
        }
        if !num.nref.is_finite() || num.nref <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "nref must be finite and > 0, got {}",
                num.nref
            )));
        }
        if !num.t_final.is_finite() || num.t_final <= num.t_initial {
            return Err(FusionError::ConfigError(format!(
                "t_final ({}) must exceed t_initial ({})",
                num.t_final, num.t_initial
            )));
        }

        let comp = &self.plasma_composition;
        comp.main_ion.validate("main_ion")?;
        comp.impurity.validate("impurity")?;
        if comp.zeff.knots.iter().any(|k| k[1] < 1.0) {
            return Err(FusionError::ConfigError(
                "zeff must be >= 1 everywhere".to_string(),
            ));
        }

        let theta = self.stepper.theta_imp;
        if !(0.0..=1.0).contains(&theta) {
            return Err(FusionError::ConfigError(format!(
                "theta_imp must lie in [0, 1], got {theta}"
            )));
        }
        Ok(())
    }

    /// Check every knot table that [`RuntimeParams::dynamic_slice`] interpolates.
    fn validate_interpolants(&self) -> FusionResult<()> {
        let pc = &self.profile_conditions;
        pc.ip_tot.validate("ip_tot")?;
        pc.vloop_lcfs.validate("vloop_lcfs")?;
        pc.nbar.validate("nbar")?;
        pc.ti.validate("ti")?;
        pc.te.validate("te")?;
        pc.ne.validate("ne")?;
        for (name, series) in [
            ("ti_bound_right", &pc.ti_bound_right),
            ("te_bound_right", &pc.te_bound_right),
            ("ne_bound_right", &pc.ne_bound_right),
        ] {
            if let Some(s) = series {
                s.validate(name)?;
            }
        }
        self.plasma_composition.zeff.validate("zeff")
    }

    /// Build the circular geometry described by this configuration.
    pub fn create_geometry(&self) -> FusionResult<Geometry> {
        Geometry::circular(&self.geometry)
    }

    pub fn static_slice(&self) -> StaticRuntimeParamsSlice {
        StaticRuntimeParamsSlice {
            ion_heat_eq: self.numerics.ion_heat_eq,
            el_heat_eq: self.numerics.el_heat_eq,
            dens_eq: self.numerics.dens_eq,
            current_eq: self.numerics.current_eq,
            theta_imp: self.stepper.theta_imp,
        }
    }

    /// Interpolate every time-dependent parameter at `t` and sample radial
    /// profiles on the cell grid of `geo`.
    pub fn dynamic_slice(&self, t: f64, geo: &Geometry) -> FusionResult<DynamicRuntimeParamsSlice> {
        if !t.is_finite() {
            return Err(FusionError::ConfigError(format!(
                "dynamic slice time must be finite, got {t}"
            )));
        }
        self.validate_interpolants()?;
        let pc = &self.profile_conditions;
        let ti = pc.ti.on_grid(&geo.rho_norm);
        let te = pc.te.on_grid(&geo.rho_norm);
        let ne = pc.ne.on_grid(&geo.rho_norm);
        let ti_bound_right = pc
            .ti_bound_right
            .as_ref()
            .map_or_else(|| pc.ti.at(1.0), |s| s.at(t));
        let te_bound_right = pc
            .te_bound_right
            .as_ref()
            .map_or_else(|| pc.te.at(1.0), |s| s.at(t));
        let ne_bound_right = pc
            .ne_bound_right
            .as_ref()
            .map_or_else(|| pc.ne.at(1.0), |s| s.at(t));
        // Without an explicit edge density the edge follows the profile's units.
        let ne_bound_right_is_fgw = if pc.ne_bound_right.is_some() {
            pc.ne_bound_right_is_fgw
        } else {
            pc.ne_is_fgw
        };

        let comp = &self.plasma_composition;
        Ok(DynamicRuntimeParamsSlice {
            profile_conditions: DynamicProfileConditions {
                ip_tot: pc.ip_tot.at(t),
                vloop_lcfs: pc.vloop_lcfs.at(t),
                use_vloop_lcfs_boundary_condition: pc.use_vloop_lcfs_boundary_condition,
                ti,
                te,
                ti_bound_right,
                te_bound_right,
                ne,
                ne_is_fgw: pc.ne_is_fgw,
                ne_bound_right,
                ne_bound_right_is_fgw,
                nbar: pc.nbar.at(t),
                nbar_is_fgw: pc.nbar_is_fgw,
                normalize_to_nbar: pc.normalize_to_nbar,
                nu: pc.nu,
            },
            numerics: DynamicNumerics {
                resistivity_mult: self.numerics.resistivity_mult,
                nref: self.numerics.nref,
            },
            plasma_composition: DynamicPlasmaComposition {
                main_ion: comp.main_ion.clone(),
                impurity: comp.impurity.clone(),
                zeff: comp.zeff.on_grid(&geo.rho_norm),
                zeff_face: comp.zeff.on_grid(&geo.rho_face_norm),
            },
        })
    }
}

/// Parameters fixed for a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticRuntimeParamsSlice {
    pub ion_heat_eq: bool,
    pub el_heat_eq: bool,
    pub dens_eq: bool,
    pub current_eq: bool,
    pub theta_imp: f64,
}

impl StaticRuntimeParamsSlice {
    pub fn is_evolving(&self, var: EvolvingVariable) -> bool {
        match var {
            EvolvingVariable::TempIon => self.ion_heat_eq,
            EvolvingVariable::TempEl => self.el_heat_eq,
            EvolvingVariable::Psi => self.current_eq,
            EvolvingVariable::Ne => self.dens_eq,
        }
    }

    /// Evolved fields in canonical order.
    pub fn evolving_names(&self) -> Vec<EvolvingVariable> {
        EvolvingVariable::ALL
            .into_iter()
            .filter(|v| self.is_evolving(*v))
            .collect()
    }
}

/// Profile conditions evaluated at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicProfileConditions {
    pub ip_tot: f64,
    pub vloop_lcfs: f64,
    pub use_vloop_lcfs_boundary_condition: bool,
    /// Prescribed profiles on the cell grid.
    pub ti: Array1<f64>,
    pub te: Array1<f64>,
    pub ti_bound_right: f64,
    pub te_bound_right: f64,
    pub ne: Array1<f64>,
    pub ne_is_fgw: bool,
    pub ne_bound_right: f64,
    pub ne_bound_right_is_fgw: bool,
    pub nbar: f64,
    pub nbar_is_fgw: bool,
    pub normalize_to_nbar: bool,
    pub nu: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicNumerics {
    pub resistivity_mult: f64,
    pub nref: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicPlasmaComposition {
    pub main_ion: IonMixture,
    pub impurity: IonMixture,
    /// Effective charge on cells and faces.
    pub zeff: Array1<f64>,
    pub zeff_face: Array1<f64>,
}

/// Time-dependent parameters evaluated at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRuntimeParamsSlice {
    pub profile_conditions: DynamicProfileConditions,
    pub numerics: DynamicNumerics,
    pub plasma_composition: DynamicPlasmaComposition,
}
