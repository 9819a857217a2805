//! Rays and fixed-step traversal of line segments.

use crate::math::{FreeCoordinate, FreePoint, FreeVector};

/// A ray; a half-infinite line segment.
///
/// The direction is always stored normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    origin: FreePoint,
    direction: FreeVector,
}

impl Ray {
    /// Constructs a [`Ray`] from convertible types (e.g. tuples or 3-element
    /// arrays), normalizing the direction.
    pub fn new(origin: impl Into<FreePoint>, direction: impl Into<FreeVector>) -> Self {
        Self {
            origin: origin.into(),
            direction: direction.into().normalize(),
        }
    }

    /// The sole endpoint of the ray.
    #[inline]
    pub fn origin(&self) -> FreePoint {
        self.origin
    }

    /// The unit direction in which the ray extends.
    #[inline]
    pub fn direction(&self) -> FreeVector {
        self.direction
    }

    /// The point at parameter `t` along the ray.
    #[inline]
    pub fn at(&self, t: FreeCoordinate) -> FreePoint {
        self.origin + self.direction * t
    }
}

/// Plan for stepping along the segment from `start` to `end` at a fixed
/// interval: a starting sample position, a per-step displacement, and the
/// number of steps that cover the segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentMarch {
    /// First sample position: `start` advanced by the requested offset.
    pub start: FreePoint,
    /// Displacement between consecutive sample positions.
    pub step: FreeVector,
    /// `ceil(|end − start| / step_size)`; an explicit bound on the walk.
    pub count: usize,
}

impl SegmentMarch {
    /// Plans a walk from `start` toward `end` with the given step size,
    /// beginning `offset` world units past `start` along the segment.
    ///
    /// A degenerate segment (zero length) produces a zero-step plan.
    pub fn new(
        step_size: FreeCoordinate,
        offset: FreeCoordinate,
        start: FreePoint,
        end: FreePoint,
    ) -> Self {
        let span = end - start;
        let length = span.length();
        if length == 0.0 {
            return Self {
                start,
                step: FreeVector::zero(),
                count: 0,
            };
        }
        let direction = span / length;
        Self {
            start: start + direction * offset,
            step: direction * step_size,
            count: (length / step_size).ceil() as usize,
        }
    }

    /// The sample positions of the walk, in order.
    pub fn positions(&self) -> impl Iterator<Item = FreePoint> + '_ {
        let start = self.start;
        let step = self.step;
        (0..self.count).map(move |i| start + step * i as FreeCoordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_direction_is_normalized() {
        let ray = Ray::new([0.0, 0.0, 0.0], [0.0, 3.0, 4.0]);
        assert!((ray.direction().length() - 1.0).abs() < 1e-12);
        assert_eq!(ray.at(5.0), FreePoint::new(0.0, 3.0, 4.0));
    }

    #[test]
    fn march_count_covers_segment() {
        let m = SegmentMarch::new(
            0.25,
            0.0,
            FreePoint::new(0.0, 0.0, 0.0),
            FreePoint::new(1.0, 0.0, 0.0),
        );
        assert_eq!(m.count, 4);
        assert_eq!(m.step, FreeVector::new(0.25, 0.0, 0.0));
        assert_eq!(m.start, FreePoint::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn march_rounds_partial_steps_up() {
        let m = SegmentMarch::new(
            0.3,
            0.0,
            FreePoint::new(0.0, 0.0, 0.0),
            FreePoint::new(1.0, 0.0, 0.0),
        );
        assert_eq!(m.count, 4);
    }

    #[test]
    fn march_offset_shifts_start_only() {
        let m = SegmentMarch::new(
            0.5,
            0.1,
            FreePoint::new(0.0, 0.0, 0.0),
            FreePoint::new(0.0, 2.0, 0.0),
        );
        assert_eq!(m.start, FreePoint::new(0.0, 0.1, 0.0));
        assert_eq!(m.count, 4);
    }

    #[test]
    fn march_degenerate_segment() {
        let p = FreePoint::new(1.0, 2.0, 3.0);
        let m = SegmentMarch::new(0.1, 0.0, p, p);
        assert_eq!(m.count, 0);
        assert_eq!(m.positions().count(), 0);
    }

    #[test]
    fn positions_are_evenly_spaced() {
        let m = SegmentMarch::new(
            0.5,
            0.0,
            FreePoint::new(0.0, 0.0, 0.0),
            FreePoint::new(0.0, 0.0, 2.0),
        );
        let positions: Vec<FreePoint> = m.positions().collect();
        assert_eq!(positions.len(), 4);
        for (i, p) in positions.iter().enumerate() {
            assert!((p.z - 0.5 * i as f64).abs() < 1e-12);
        }
    }
}
