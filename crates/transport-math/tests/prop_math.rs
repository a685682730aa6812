// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Property-Based Tests (proptest) for transport-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for transport-math using proptest.
//!
//! Covers: piecewise-linear interpolation bounds, face/cell averaging,
//! gradient of linear data, trapezoid additivity.

use ndarray::Array1;
use proptest::prelude::*;
use transport_math::integrate::{cumulative_trapezoid, trapezoid};
use transport_math::interp::{face_to_cell, gradient, interp1d};

// ── Interpolation ────────────────────────────────────────────────────

proptest! {
    /// Interpolated values stay inside the range of the neighbouring knots.
    #[test]
    fn interp1d_bounded_by_knots(
        ys in prop::collection::vec(-100.0f64..100.0, 2..20),
        x in -0.5f64..1.5,
    ) {
        let n = ys.len();
        let xs: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        let v = interp1d(&xs, &ys, x);
        let lo = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "v={} outside [{}, {}]", v, lo, hi);
    }

    /// face_to_cell of a constant is the same constant, one element shorter.
    #[test]
    fn face_to_cell_constant(n in 2usize..64, c in -1e3f64..1e3) {
        let face = Array1::from_elem(n, c);
        let cell = face_to_cell(face.view());
        prop_assert_eq!(cell.len(), n - 1);
        for &v in cell.iter() {
            prop_assert!((v - c).abs() < 1e-9);
        }
    }
}

// ── Differentiation and quadrature ───────────────────────────────────

proptest! {
    /// The gradient of a linear function is its slope everywhere.
    #[test]
    fn gradient_of_linear_is_slope(
        n in 3usize..50,
        slope in -10.0f64..10.0,
        offset in -10.0f64..10.0,
    ) {
        let x = Array1::linspace(0.0, 1.0, n).mapv(|v: f64| v.powf(1.3));
        let y = x.mapv(|v| slope * v + offset);
        let g = gradient(y.view(), x.view());
        for &gi in g.iter() {
            prop_assert!((gi - slope).abs() < 1e-8, "gi={}, slope={}", gi, slope);
        }
    }

    /// The last cumulative value equals the full trapezoid integral.
    #[test]
    fn cumulative_trapezoid_endpoint(
        ys in prop::collection::vec(-10.0f64..10.0, 2..40),
        initial in -5.0f64..5.0,
    ) {
        let n = ys.len();
        let x = Array1::linspace(0.0, 2.0, n);
        let y = Array1::from(ys);
        let cum = cumulative_trapezoid(y.view(), x.view(), initial);
        let total = trapezoid(y.view(), x.view());
        prop_assert!((cum[n - 1] - initial - total).abs() < 1e-9);
    }
}
