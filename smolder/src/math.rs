//! Scalar, vector, and color mathematics for world-space geometry.

use euclid::{Point3D, Vector3D};

mod aab;
pub use aab::{Aab, RayBoxHit, ZERO_DIRECTION_EPSILON};
mod color;
pub use color::Rgb;

/// Coordinate type for continuous world-space positions and directions.
pub type FreeCoordinate = f64;

/// Unit-of-measure tag for world-space coordinates.
///
/// One unit is one world-space distance unit; voxel grids subdivide their
/// bounding boxes into fractions of it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum World {}

/// A point in world space.
pub type FreePoint = Point3D<FreeCoordinate, World>;

/// A vector in world space.
pub type FreeVector = Vector3D<FreeCoordinate, World>;

/// Remaps `value` from the range `[lo, hi]` to `[0, 1]`, preserving its
/// proportional position. Values outside the input range extrapolate.
#[inline]
pub fn unit_range(value: FreeCoordinate, lo: FreeCoordinate, hi: FreeCoordinate) -> FreeCoordinate {
    (value - lo) / (hi - lo)
}

/// Linear interpolation between `v1` and `v2` by `t`.
#[inline]
pub(crate) fn lerp(v1: f32, v2: f32, t: f32) -> f32 {
    (1.0 - t) * v1 + t * v2
}

/// Trilinear interpolation of the eight corner values of a cell, by the
/// fractional weights `(xd, yd, zd)`.
///
/// Corner naming: `v_xyz` where each digit selects the low (0) or high (1)
/// corner on that axis.
#[inline]
#[allow(clippy::too_many_arguments)]
pub(crate) fn trilerp(
    xd: f32,
    yd: f32,
    zd: f32,
    v000: f32,
    v001: f32,
    v010: f32,
    v011: f32,
    v100: f32,
    v101: f32,
    v110: f32,
    v111: f32,
) -> f32 {
    let c00 = lerp(v000, v100, xd);
    let c10 = lerp(v010, v110, xd);
    let c01 = lerp(v001, v101, xd);
    let c11 = lerp(v011, v111, xd);
    let c0 = lerp(c00, c10, yd);
    let c1 = lerp(c01, c11, yd);
    lerp(c0, c1, zd)
}
