// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Integrate
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Trapezoid-rule quadrature on radial grids.
//!
//! Used for enclosed-current integrals, flux reconstruction from face
//! gradients and line-averaged density normalization.

use ndarray::{Array1, ArrayView1};

/// Trapezoid integral of `y` over the coordinate `x`.
///
/// Returns 0 for fewer than two samples.
pub fn trapezoid(y: ArrayView1<f64>, x: ArrayView1<f64>) -> f64 {
    assert_eq!(y.len(), x.len());
    (1..y.len())
        .map(|i| 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]))
        .sum()
}

/// Running trapezoid integral of `y` over `x`, prefixed with `initial`.
///
/// Output has the same length as `y`: `out[0] = initial`,
/// `out[i] = initial + ∫_{x0}^{xi} y dx`.
pub fn cumulative_trapezoid(y: ArrayView1<f64>, x: ArrayView1<f64>, initial: f64) -> Array1<f64> {
    assert_eq!(y.len(), x.len());
    let n = y.len();
    let mut out = Array1::zeros(n);
    if n == 0 {
        return out;
    }
    out[0] = initial;
    for i in 1..n {
        out[i] = out[i - 1] + 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    out
}
