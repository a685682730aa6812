// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m) - real SI value.
pub const MU0_SI: f64 = 1.2566370614e-6;

/// Default density reference for normalized profiles (m^-3).
pub const DEFAULT_NREF: f64 = 1e20;

/// Greenwald density prefactor: n_GW = Ip[MA] / (π a²) · 1e20 m^-3.
pub const GREENWALD_SCALE: f64 = 1e20;

/// Static properties of an ion species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonProperties {
    pub symbol: &'static str,
    pub name: &'static str,
    /// Atomic mass number [amu]
    pub a: f64,
    /// Atomic number (charge when fully stripped)
    pub z: f64,
}

/// Ion species recognised in plasma-composition mixtures.
pub const ION_PROPERTIES: &[IonProperties] = &[
    IonProperties { symbol: "H", name: "Hydrogen", a: 1.008, z: 1.0 },
    IonProperties { symbol: "D", name: "Deuterium", a: 2.0141, z: 1.0 },
    IonProperties { symbol: "T", name: "Tritium", a: 3.0160, z: 1.0 },
    IonProperties { symbol: "He3", name: "Helium-3", a: 3.0160, z: 2.0 },
    IonProperties { symbol: "He4", name: "Helium-4", a: 4.0026, z: 2.0 },
    IonProperties { symbol: "Li", name: "Lithium", a: 6.94, z: 3.0 },
    IonProperties { symbol: "Be", name: "Beryllium", a: 9.0122, z: 4.0 },
    IonProperties { symbol: "C", name: "Carbon", a: 12.011, z: 6.0 },
    IonProperties { symbol: "N", name: "Nitrogen", a: 14.007, z: 7.0 },
    IonProperties { symbol: "O", name: "Oxygen", a: 15.999, z: 8.0 },
    IonProperties { symbol: "Ne", name: "Neon", a: 20.180, z: 10.0 },
    IonProperties { symbol: "Ar", name: "Argon", a: 39.95, z: 18.0 },
    IonProperties { symbol: "Kr", name: "Krypton", a: 83.798, z: 36.0 },
    IonProperties { symbol: "Xe", name: "Xenon", a: 131.29, z: 54.0 },
    IonProperties { symbol: "W", name: "Tungsten", a: 183.84, z: 74.0 },
];

/// Look up an ion species by symbol.
pub fn ion_properties(symbol: &str) -> Option<&'static IonProperties> {
    ION_PROPERTIES.iter().find(|ion| ion.symbol == symbol)
}
