//! Affine transform reconstruction from three destination points.
//!
//! Records such as DrawImagePoints describe their placement as the three
//! points that a source rectangle's corners land on. The transform is
//! recovered by solving `dest = T * src` with 3x3 homogeneous matrices.

use super::records::primitives::{PointF, RectF, Transform};
use crate::common::error::{Error, Result};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Row-major 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Build a matrix from three homogeneous column points.
    fn from_columns(points: [(f64, f64); 3]) -> Self {
        let [a, b, c] = points;
        Matrix3([[a.0, b.0, c.0], [a.1, b.1, c.1], [1.0, 1.0, 1.0]])
    }

    fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate; `None` when singular.
    fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let m = &self.0;
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let inv_det = 1.0 / det;
        Some(Matrix3([
            [
                cofactor(1, 2, 1, 2) * inv_det,
                -cofactor(0, 2, 1, 2) * inv_det,
                cofactor(0, 1, 1, 2) * inv_det,
            ],
            [
                -cofactor(1, 2, 0, 2) * inv_det,
                cofactor(0, 2, 0, 2) * inv_det,
                -cofactor(0, 1, 0, 2) * inv_det,
            ],
            [
                cofactor(1, 2, 0, 1) * inv_det,
                -cofactor(0, 2, 0, 1) * inv_det,
                cofactor(0, 1, 0, 1) * inv_det,
            ],
        ]))
    }

    fn multiply(&self, other: &Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[r][k] * other.0[k][c]).sum();
            }
        }
        Matrix3(out)
    }
}

fn round_coefficient(value: f64) -> f64 {
    let rounded = (value * 1e10).round() / 1e10;
    // Avoid reporting -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Find the transform mapping `src`'s corners onto `dest`.
///
/// The corners `(min x, min y)`, `(max x, min y)` and `(min x, max y)` map
/// to `dest[0]`, `dest[1]` and `dest[2]` respectively. A degenerate source
/// rectangle is a `MalformedRecord` at `offset`.
///
/// # Examples
///
/// ```
/// use emfplus::images::emfplus::records::primitives::{PointF, RectF};
/// use emfplus::images::emfplus::transform::reconstruct;
///
/// let src = RectF::new(0.0, 0.0, 10.0, 10.0);
/// let dest = [PointF::new(5.0, 5.0), PointF::new(25.0, 5.0), PointF::new(5.0, 25.0)];
/// let t = reconstruct(&src, &dest, 0).unwrap();
/// assert_eq!(t.apply(10.0, 10.0), (25.0, 25.0));
/// ```
pub fn reconstruct(src: &RectF, dest: &[PointF; 3], offset: usize) -> Result<Transform> {
    let (min_x, max_x) = (f64::from(src.min_x()), f64::from(src.max_x()));
    let (min_y, max_y) = (f64::from(src.min_y()), f64::from(src.max_y()));
    let src_basis = Matrix3::from_columns([(min_x, min_y), (max_x, min_y), (min_x, max_y)]);
    let dest_basis = Matrix3::from_columns(dest.map(|p| (f64::from(p.x), f64::from(p.y))));

    let inverse = src_basis
        .inverse()
        .ok_or_else(|| Error::malformed(offset, "source rectangle is degenerate"))?;
    let t = dest_basis.multiply(&inverse).0;

    Ok(Transform {
        m11: round_coefficient(t[0][0]),
        m12: round_coefficient(t[1][0]),
        m21: round_coefficient(t[0][1]),
        m22: round_coefficient(t[1][1]),
        dx: round_coefficient(t[0][2]),
        dy: round_coefficient(t[1][2]),
    })
}
