//! Axis-aligned box type and its ray-slab intersection test.

use core::fmt;

use crate::math::{FreeCoordinate, FreePoint};
use crate::raycast::Ray;

/// Substituted for an exactly-zero ray direction component before taking its
/// reciprocal in the slab test, so that axis-aligned rays produce infinite
/// (but well-ordered) plane-crossing parameters instead of dividing by zero.
pub const ZERO_DIRECTION_EPSILON: FreeCoordinate = f32::EPSILON as FreeCoordinate;

/// Axis-Aligned Box data type with continuous coordinates.
///
/// The two corners need not be ordered per axis; the intersection test and
/// containment test reorder them as needed. Extents are therefore always
/// non-negative.
#[derive(Clone, Copy, PartialEq)]
pub struct Aab {
    p1: FreePoint,
    p2: FreePoint,
    center: FreePoint,
}

/// World-space points at which a ray enters and exits an [`Aab`],
/// as returned by [`Aab::intersect()`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayBoxHit {
    /// Point at which the ray crosses into the box.
    ///
    /// If the ray originates inside the box this lies behind the origin.
    pub entered: FreePoint,
    /// Point at which the ray crosses out of the box.
    pub exited: FreePoint,
}

impl Aab {
    /// Constructs an [`Aab`] from two opposite corner points, in any order.
    #[inline]
    pub fn new(p1: impl Into<FreePoint>, p2: impl Into<FreePoint>) -> Self {
        let p1 = p1.into();
        let p2 = p2.into();
        Self {
            p1,
            p2,
            center: ((p1.to_vector() + p2.to_vector()) / 2.0).to_point(),
        }
    }

    /// Constructs the cube of half-width `radius` around `center`.
    #[inline]
    pub fn from_center(center: FreePoint, radius: FreeCoordinate) -> Self {
        Self::new(
            FreePoint::new(center.x - radius, center.y - radius, center.z - radius),
            FreePoint::new(center.x + radius, center.y + radius, center.z + radius),
        )
    }

    /// The first corner point, exactly as given to [`Aab::new()`].
    #[inline]
    pub fn p1(&self) -> FreePoint {
        self.p1
    }

    /// The second corner point, exactly as given to [`Aab::new()`].
    #[inline]
    pub fn p2(&self) -> FreePoint {
        self.p2
    }

    /// The midpoint of the two corners.
    #[inline]
    pub fn center(&self) -> FreePoint {
        self.center
    }

    /// Extent along the X axis; always non-negative.
    #[inline]
    pub fn width(&self) -> FreeCoordinate {
        (self.p1.x - self.p2.x).abs()
    }

    /// Extent along the Y axis; always non-negative.
    #[inline]
    pub fn height(&self) -> FreeCoordinate {
        (self.p1.y - self.p2.y).abs()
    }

    /// Extent along the Z axis; always non-negative.
    #[inline]
    pub fn depth(&self) -> FreeCoordinate {
        (self.p1.z - self.p2.z).abs()
    }

    /// Tests whether `point` lies inside this box (boundary inclusive),
    /// checking each axis independently against the reordered corners.
    pub fn contains(&self, point: FreePoint) -> bool {
        fn axis(t: FreeCoordinate, a: FreeCoordinate, b: FreeCoordinate) -> bool {
            t >= a.min(b) && t <= a.max(b)
        }
        axis(point.x, self.p1.x, self.p2.x)
            && axis(point.y, self.p1.y, self.p2.y)
            && axis(point.z, self.p1.z, self.p2.z)
    }

    /// Slab test: computes where `ray` crosses this box, or [`None`] if it
    /// misses or the box lies entirely behind the ray origin.
    pub fn intersect(&self, ray: &Ray) -> Option<RayBoxHit> {
        fn nonzero(d: FreeCoordinate) -> FreeCoordinate {
            if d == 0.0 { ZERO_DIRECTION_EPSILON } else { d }
        }
        fn ordered(a: FreeCoordinate, b: FreeCoordinate) -> (FreeCoordinate, FreeCoordinate) {
            if a > b { (b, a) } else { (a, b) }
        }

        let origin = ray.origin();
        let direction = ray.direction();
        let xd = nonzero(direction.x);
        let yd = nonzero(direction.y);
        let zd = nonzero(direction.z);

        let (x1, x2) = ordered((self.p1.x - origin.x) / xd, (self.p2.x - origin.x) / xd);
        let (y1, y2) = ordered((self.p1.y - origin.y) / yd, (self.p2.y - origin.y) / yd);
        let (z1, z2) = ordered((self.p1.z - origin.z) / zd, (self.p2.z - origin.z) / zd);

        let near = x1.max(y1).max(z1);
        let far = x2.min(y2).min(z2);

        if near > far || far < 0.0 {
            return None;
        }

        Some(RayBoxHit {
            entered: origin + direction * near,
            exited: origin + direction * far,
        })
    }
}

impl fmt::Debug for Aab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aab({:?} .. {:?})", self.p1, self.p2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FreeVector;

    fn unit_box() -> Aab {
        Aab::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
    }

    #[test]
    fn extents_ignore_corner_order() {
        let b = Aab::new([1.0, 2.0, 3.0], [-1.0, 0.0, -3.0]);
        assert_eq!(b.width(), 2.0);
        assert_eq!(b.height(), 2.0);
        assert_eq!(b.depth(), 6.0);
        assert_eq!(b.center(), FreePoint::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn contains_checks_each_axis() {
        let b = Aab::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert!(b.contains(FreePoint::new(0.5, 0.5, 0.5)));
        assert!(b.contains(FreePoint::new(0.0, 1.0, 0.5)));
        assert!(!b.contains(FreePoint::new(0.5, 1.5, 0.5)));
        assert!(!b.contains(FreePoint::new(-0.1, 0.5, 0.5)));
    }

    #[test]
    fn intersect_through_center() {
        let hit = unit_box()
            .intersect(&Ray::new([0.5, 0.5, -1.0], [0.0, 0.0, 1.0]))
            .unwrap();
        assert!((hit.entered.z - 0.0).abs() < 1e-9);
        assert!((hit.exited.z - 1.0).abs() < 1e-9);
        assert_eq!(hit.entered.x, 0.5);
        assert_eq!(hit.exited.x, 0.5);
    }

    #[test]
    fn intersect_miss() {
        assert_eq!(
            unit_box().intersect(&Ray::new([2.0, 2.0, -1.0], [0.0, 0.0, 1.0])),
            None
        );
    }

    #[test]
    fn intersect_behind_origin() {
        // Box entirely behind the ray.
        assert_eq!(
            unit_box().intersect(&Ray::new([0.5, 0.5, 2.0], [0.0, 0.0, 1.0])),
            None
        );
    }

    #[test]
    fn intersect_axis_aligned_ray_with_zero_components() {
        // Direction has two exactly-zero components; the epsilon substitution
        // must keep the test well defined.
        let hit = unit_box()
            .intersect(&Ray::new([0.25, 0.25, 5.0], [0.0, 0.0, -1.0]))
            .unwrap();
        assert!((hit.entered.z - 1.0).abs() < 1e-9);
        assert!((hit.exited.z - 0.0).abs() < 1e-9);
    }

    #[test]
    fn entry_and_exit_lie_on_the_ray() {
        let ray = Ray::new([-2.0, -1.5, -3.0], [1.0, 1.0, 2.0]);
        let hit = unit_box().intersect(&ray).unwrap();
        for p in [hit.entered, hit.exited] {
            // p = origin + direction * t for some scalar t: the offset must be
            // parallel to the direction.
            let offset = p - ray.origin();
            let cross: FreeVector = offset.cross(ray.direction());
            assert!(cross.length() < 1e-9);
        }
    }

    #[test]
    fn ray_starting_inside_still_hits() {
        let hit = unit_box()
            .intersect(&Ray::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0]))
            .unwrap();
        assert!((hit.exited.y - 1.0).abs() < 1e-9);
    }
}
