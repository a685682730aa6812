//! Piecewise-linear interpolation and finite differences on 1-D radial grids.
//!
//! Grids are strictly increasing coordinate arrays; values outside the knot
//! range are clamped to the nearest end value.

use ndarray::{Array1, ArrayView1};

/// Piecewise-linear interpolation of `(xs, ys)` at `x`.
///
/// Clamps to `ys[0]` / `ys[n-1]` outside `[xs[0], xs[n-1]]`.
/// A single knot yields a constant.
///
/// Panics if `xs` and `ys` differ in length or are empty.
pub fn interp1d(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    assert!(!xs.is_empty(), "interp1d requires at least one knot");
    assert_eq!(xs.len(), ys.len());

    let n = xs.len();
    if n == 1 || x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    // First knot strictly greater than x; guaranteed in 1..n by the checks above.
    let hi = xs.partition_point(|&xk| xk <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[hi];
    }
    let t = (x - xs[lo]) / span;
    (1.0 - t) * ys[lo] + t * ys[hi]
}

/// Evaluate [`interp1d`] on every point of `x`.
pub fn interp1d_array(xs: &[f64], ys: &[f64], x: ArrayView1<f64>) -> Array1<f64> {
    x.mapv(|xi| interp1d(xs, ys, xi))
}

/// Average adjacent face values onto the cell grid: `n+1` faces → `n` cells.
pub fn face_to_cell(face: ArrayView1<f64>) -> Array1<f64> {
    assert!(face.len() >= 2, "face_to_cell requires at least 2 faces");
    let n = face.len() - 1;
    Array1::from_shape_fn(n, |i| 0.5 * (face[i] + face[i + 1]))
}

/// Gradient of `y` with respect to a (possibly non-uniform) coordinate `x`.
///
/// Second-order central differences in the interior, first-order one-sided
/// differences at both ends (numpy `gradient` with `edge_order=1`).
pub fn gradient(y: ArrayView1<f64>, x: ArrayView1<f64>) -> Array1<f64> {
    assert_eq!(y.len(), x.len());
    let n = y.len();
    assert!(n >= 2, "gradient requires at least 2 points");

    let mut out = Array1::zeros(n);
    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let hm = x[i] - x[i - 1];
        let hp = x[i + 1] - x[i];
        out[i] = (hm * hm * y[i + 1] - hp * hp * y[i - 1] + (hp * hp - hm * hm) * y[i])
            / (hm * hp * (hm + hp));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp1d_exact_knots() {
        let xs = [0.0, 0.5, 1.0];
        let ys = [3.0, 2.0, 7.0];
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((interp1d(&xs, &ys, *x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_interp1d_midpoint_and_clamp() {
        let xs = [0.0, 1.0];
        let ys = [10.0, 20.0];
        assert!((interp1d(&xs, &ys, 0.25) - 12.5).abs() < 1e-12);
        assert_eq!(interp1d(&xs, &ys, -1.0), 10.0);
        assert_eq!(interp1d(&xs, &ys, 2.0), 20.0);
    }

    #[test]
    fn test_interp1d_single_knot_is_constant() {
        assert_eq!(interp1d(&[0.3], &[4.2], 0.9), 4.2);
    }

    #[test]
    fn test_face_to_cell_averages() {
        let face = Array1::from(vec![0.0, 2.0, 6.0]);
        let cell = face_to_cell(face.view());
        assert_eq!(cell.len(), 2);
        assert!((cell[0] - 1.0).abs() < 1e-12);
        assert!((cell[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_linear_nonuniform() {
        // f(x) = 3x - 1 on a stretched grid: every stencil is exact.
        let x = Array1::from(vec![0.0, 0.1, 0.35, 0.5, 0.9, 1.0]);
        let y = x.mapv(|v| 3.0 * v - 1.0);
        let g = gradient(y.view(), x.view());
        for (i, gi) in g.iter().enumerate() {
            assert!((gi - 3.0).abs() < 1e-12, "gradient[{i}] = {gi}");
        }
    }

    #[test]
    fn test_gradient_quadratic_interior_exact() {
        // Central differences are exact for quadratics on non-uniform grids.
        let x = Array1::from(vec![0.0, 0.2, 0.5, 0.6, 1.0]);
        let y = x.mapv(|v| v * v);
        let g = gradient(y.view(), x.view());
        for i in 1..4 {
            assert!((g[i] - 2.0 * x[i]).abs() < 1e-12, "gradient[{i}] = {}", g[i]);
        }
    }
}
