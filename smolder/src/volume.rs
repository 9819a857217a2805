//! Voxel density grids: storage, indexing, and density sampling.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::math::{self, Aab, FreeCoordinate, FreePoint, FreeVector};
use crate::material::Material;
use crate::raycast::Ray;
use crate::raymarch;
use crate::scene::{Hit, Primitive, RenderContext};

/// Maximum number of lights a scene may contain.
///
/// Each voxel carries one shadow-transmittance cache slot per light, so the
/// bound must be fixed at compile time.
pub const MAX_LIGHTS: usize = 5;

/// Sentinel meaning "shadow transmittance not yet computed for this slot".
const LIGHT_UNCACHED: f32 = -1.0;

/// Magnitude below which a normalized grid coordinate is snapped to exactly
/// zero, absorbing floating-point noise at the box boundary.
const SNAP_THRESHOLD: FreeCoordinate = 1.0e-6;

/// One cell of a [`VoxelBuffer`]: a density plus a lazily computed cache of
/// per-light shadow transmittance.
///
/// The cache slots are atomics so that concurrent pixel tasks may fill them
/// without locking. Racing writers compute identical values from immutable
/// scene data, so the writes are idempotent and relaxed ordering suffices.
#[derive(Debug)]
pub struct Voxel {
    density: f32,
    light_cache: [AtomicU32; MAX_LIGHTS],
}

impl Voxel {
    /// Constructs a [`Voxel`] with all cache slots unset.
    pub fn new(density: f32) -> Self {
        Self {
            density,
            light_cache: core::array::from_fn(|_| AtomicU32::new(LIGHT_UNCACHED.to_bits())),
        }
    }

    /// The voxel's density; non-negative.
    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    /// The cached shadow transmittance toward light `index`, if computed.
    #[inline]
    pub fn cached_light(&self, index: usize) -> Option<f32> {
        let value = f32::from_bits(self.light_cache[index].load(Ordering::Relaxed));
        (value >= 0.0).then_some(value)
    }

    /// Stores the shadow transmittance toward light `index`.
    #[inline]
    pub fn store_light(&self, index: usize, transmittance: f32) {
        self.light_cache[index].store(transmittance.to_bits(), Ordering::Relaxed);
    }
}

impl Clone for Voxel {
    fn clone(&self) -> Self {
        Self {
            density: self.density,
            light_cache: core::array::from_fn(|i| {
                AtomicU32::new(self.light_cache[i].load(Ordering::Relaxed))
            }),
        }
    }
}

/// Errors in the construction of a [`VoxelBuffer`].
#[derive(Clone, Copy, Debug, displaydoc::Display, Eq, PartialEq)]
#[non_exhaustive]
pub enum GridError {
    /// grid dimensions {dims:?} contain a zero extent
    EmptyDimension {
        /// The offending dimensions.
        dims: [usize; 3],
    },
    /// {input_length} densities provided for a grid of {dims:?} = {volume} cells
    LengthMismatch {
        /// Number of densities provided.
        input_length: usize,
        /// The declared dimensions.
        dims: [usize; 3],
        /// Product of the declared dimensions.
        volume: usize,
    },
}

impl std::error::Error for GridError {}

/// A 3D grid of [`Voxel`]s filling an axis-aligned bounding box, shaded by a
/// shared [`Material`].
///
/// Storage is a flat row-major array: X varies fastest, then Y, then Z.
pub struct VoxelBuffer {
    dims: [usize; 3],
    voxels: Box<[Voxel]>,
    bounds: Aab,
    material: Arc<dyn Material>,
    /// Per-axis world-space size of one voxel: bounds extent / dimension.
    voxel_size: FreeVector,
}

impl VoxelBuffer {
    /// Constructs a zero-density grid.
    pub fn new(
        dims: [usize; 3],
        bounds: Aab,
        material: Arc<dyn Material>,
    ) -> Result<Self, GridError> {
        let [x, y, z] = dims;
        if x == 0 || y == 0 || z == 0 {
            return Err(GridError::EmptyDimension { dims });
        }
        let voxels: Box<[Voxel]> = (0..x * y * z).map(|_| Voxel::new(0.0)).collect();
        Ok(Self {
            dims,
            voxels,
            bounds,
            material,
            voxel_size: FreeVector::new(
                bounds.width() / x as FreeCoordinate,
                bounds.height() / y as FreeCoordinate,
                bounds.depth() / z as FreeCoordinate,
            ),
        })
    }

    /// Constructs a grid from pre-computed densities in linear index order.
    ///
    /// Fails if the number of densities does not match the declared
    /// dimensions.
    pub fn from_densities(
        dims: [usize; 3],
        densities: &[f32],
        bounds: Aab,
        material: Arc<dyn Material>,
    ) -> Result<Self, GridError> {
        let mut buffer = Self::new(dims, bounds, material)?;
        let volume = buffer.voxels.len();
        if densities.len() != volume {
            return Err(GridError::LengthMismatch {
                input_length: densities.len(),
                dims,
                volume,
            });
        }
        for (voxel, &density) in buffer.voxels.iter_mut().zip(densities) {
            voxel.density = density;
        }
        Ok(buffer)
    }

    /// The grid dimensions `[x, y, z]`.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// The world-space bounds of the grid.
    #[inline]
    pub fn bounds(&self) -> Aab {
        self.bounds
    }

    /// The material shared by every voxel of this field.
    #[inline]
    pub fn material(&self) -> &Arc<dyn Material> {
        &self.material
    }

    /// Per-axis world-space size of one voxel.
    #[inline]
    pub fn voxel_size(&self) -> FreeVector {
        self.voxel_size
    }

    /// Converts a 3D index to a linear index.
    #[inline]
    pub fn sub2ind(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.dims[0] + k * (self.dims[0] * self.dims[1])
    }

    /// Converts a linear index back to a 3D index.
    #[inline]
    pub fn ind2sub(&self, w: usize) -> (usize, usize, usize) {
        let [x, y, _] = self.dims;
        (w % x, (w / x) % y, w / (x * y))
    }

    fn valid(&self, i: i64, j: i64, k: i64) -> bool {
        (0..self.dims[0] as i64).contains(&i)
            && (0..self.dims[1] as i64).contains(&j)
            && (0..self.dims[2] as i64).contains(&k)
    }

    /// The voxel at 3D index `(i, j, k)`, or [`None`] if out of range.
    pub fn voxel(&self, i: usize, j: usize, k: usize) -> Option<&Voxel> {
        self.valid(i as i64, j as i64, k as i64)
            .then(|| &self.voxels[self.sub2ind(i, j, k)])
    }

    /// Sets the density of the voxel at `(i, j, k)`.
    ///
    /// Panics if the index is out of range; generators only write indices they
    /// iterate.
    pub(crate) fn set_density(&mut self, i: usize, j: usize, k: usize, density: f32) {
        let index = self.sub2ind(i, j, k);
        self.voxels[index].density = density;
    }

    /// Finds the 3D index of the voxel containing `p`, or [`None`] if `p`
    /// does not fall in any voxel.
    pub fn position_to_index(&self, p: FreePoint) -> Option<(usize, usize, usize)> {
        let p1 = self.bounds.p1();
        let p2 = self.bounds.p2();

        fn snap(v: FreeCoordinate) -> FreeCoordinate {
            if v.abs() < SNAP_THRESHOLD { 0.0 } else { v }
        }
        let dx = snap(math::unit_range(p.x, p1.x, p2.x));
        let dy = snap(math::unit_range(p.y, p1.y, p2.y));
        let dz = snap(math::unit_range(p.z, p1.z, p2.z));

        // The scale factor is (dimension − voxel size on that axis), a
        // calibration quirk carried over for output fidelity.
        let i = (dx * (self.dims[0] as FreeCoordinate - self.voxel_size.x)).floor() as i64;
        let j = (dy * (self.dims[1] as FreeCoordinate - self.voxel_size.y)).floor() as i64;
        let k = (dz * (self.dims[2] as FreeCoordinate - self.voxel_size.z)).floor() as i64;

        self.valid(i, j, k)
            .then(|| (i as usize, j as usize, k as usize))
    }

    /// The voxel containing world position `p`, or [`None`].
    pub fn voxel_at(&self, p: FreePoint) -> Option<&Voxel> {
        let (i, j, k) = self.position_to_index(p)?;
        Some(&self.voxels[self.sub2ind(i, j, k)])
    }

    /// World-space center of the cell `(i, j, k)`, or [`None`] if the index
    /// is out of range.
    pub fn center(&self, i: usize, j: usize, k: usize) -> Option<FreePoint> {
        self.valid(i as i64, j as i64, k as i64)
            .then(|| self.cell_center(i, j, k))
    }

    /// World-space center of the cell containing `p`, or [`None`].
    pub fn center_of(&self, p: FreePoint) -> Option<FreePoint> {
        let (i, j, k) = self.position_to_index(p)?;
        Some(self.cell_center(i, j, k))
    }

    pub(crate) fn cell_center(&self, i: usize, j: usize, k: usize) -> FreePoint {
        let p1 = self.bounds.p1();
        let p2 = self.bounds.p2();
        let d = FreeVector::new(
            (p2.x - p1.x) / self.dims[0] as FreeCoordinate,
            (p2.y - p1.y) / self.dims[1] as FreeCoordinate,
            (p2.z - p1.z) / self.dims[2] as FreeCoordinate,
        );
        FreePoint::new(
            p1.x + 0.5 * d.x + d.x * i as FreeCoordinate,
            p1.y + 0.5 * d.y + d.y * j as FreeCoordinate,
            p1.z + 0.5 * d.z + d.z * k as FreeCoordinate,
        )
    }

    /// Trilinearly interpolated density at `p`.
    ///
    /// Neighbor cells outside the grid contribute density 0. The result is
    /// divided by exactly 3.0, a scaling convention carried over from the
    /// field generators' original calibration.
    pub fn interpolated_density(&self, p: FreePoint) -> f32 {
        let p1 = self.bounds.p1();
        let p2 = self.bounds.p2();

        let x_loc = math::unit_range(p.x, p1.x, p2.x) * (self.dims[0] as FreeCoordinate - 1.0);
        let y_loc = math::unit_range(p.y, p1.y, p2.y) * (self.dims[1] as FreeCoordinate - 1.0);
        let z_loc = math::unit_range(p.z, p1.z, p2.z) * (self.dims[2] as FreeCoordinate - 1.0);

        let (x1, x2) = (x_loc.floor() as i64, x_loc.ceil() as i64);
        let (y1, y2) = (y_loc.floor() as i64, y_loc.ceil() as i64);
        let (z1, z2) = (z_loc.floor() as i64, z_loc.ceil() as i64);

        let density = |i: i64, j: i64, k: i64| -> f32 {
            if self.valid(i, j, k) {
                self.voxels[self.sub2ind(i as usize, j as usize, k as usize)].density
            } else {
                0.0
            }
        };

        math::trilerp(
            (x_loc - x_loc.floor()) as f32,
            (y_loc - y_loc.floor()) as f32,
            (z_loc - z_loc.floor()) as f32,
            density(x1, y1, z1),
            density(x1, y1, z2),
            density(x1, y2, z1),
            density(x1, y2, z2),
            density(x2, y1, z1),
            density(x2, y1, z2),
            density(x2, y2, z1),
            density(x2, y2, z2),
        ) / 3.0
    }
}

impl Primitive for VoxelBuffer {
    /// AABB pruning followed by a ray march through the entry/exit segment.
    fn intersect(&self, ray: &Ray, ctx: &RenderContext) -> Option<Hit> {
        let box_hit = self.bounds.intersect(ray)?;
        let marched = raymarch::march(ctx, self, box_hit.entered, box_hit.exited);
        Some(Hit {
            color: marched.color,
            transmittance: marched.transmittance,
        })
    }
}

impl fmt::Debug for VoxelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoxelBuffer")
            .field("dims", &self.dims)
            .field("bounds", &self.bounds)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rgb;
    use pretty_assertions::assert_eq;

    fn test_buffer(dims: [usize; 3]) -> VoxelBuffer {
        VoxelBuffer::new(
            dims,
            Aab::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            Arc::new(Rgb::WHITE),
        )
        .unwrap()
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let result = VoxelBuffer::new(
            [4, 0, 4],
            Aab::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            Arc::new(Rgb::WHITE),
        );
        assert_eq!(result.err(), Some(GridError::EmptyDimension { dims: [4, 0, 4] }));
    }

    #[test]
    fn density_length_mismatch_is_rejected() {
        let result = VoxelBuffer::from_densities(
            [2, 2, 2],
            &[0.0; 7],
            Aab::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            Arc::new(Rgb::WHITE),
        );
        assert_eq!(
            result.err(),
            Some(GridError::LengthMismatch {
                input_length: 7,
                dims: [2, 2, 2],
                volume: 8
            })
        );
    }

    #[test]
    fn index_round_trip() {
        let buffer = test_buffer([3, 4, 5]);
        for k in 0..5 {
            for j in 0..4 {
                for i in 0..3 {
                    assert_eq!(buffer.ind2sub(buffer.sub2ind(i, j, k)), (i, j, k));
                }
            }
        }
    }

    #[test]
    fn linear_order_is_x_fastest() {
        let buffer = test_buffer([3, 4, 5]);
        assert_eq!(buffer.sub2ind(1, 0, 0), 1);
        assert_eq!(buffer.sub2ind(0, 1, 0), 3);
        assert_eq!(buffer.sub2ind(0, 0, 1), 12);
    }

    #[test]
    fn position_of_center_round_trips() {
        let buffer = test_buffer([8, 8, 8]);
        for k in 0..8 {
            for j in 0..8 {
                for i in 0..8 {
                    let center = buffer.center(i, j, k).unwrap();
                    assert_eq!(buffer.position_to_index(center), Some((i, j, k)));
                }
            }
        }
    }

    #[test]
    fn position_outside_bounds_is_none() {
        let buffer = test_buffer([4, 4, 4]);
        assert_eq!(
            buffer.position_to_index(FreePoint::new(1.5, 0.5, 0.5)),
            None
        );
        assert_eq!(
            buffer.position_to_index(FreePoint::new(0.5, -0.5, 0.5)),
            None
        );
    }

    #[test]
    fn boundary_noise_snaps_into_the_grid() {
        let buffer = test_buffer([4, 4, 4]);
        // Slightly negative normalized coordinate, within the snap threshold.
        let p = FreePoint::new(-1.0e-7, 0.5, 0.5);
        assert!(buffer.position_to_index(p).is_some());
    }

    #[test]
    fn uniform_grid_interpolates_to_density_over_three() {
        let densities = vec![6.0; 4 * 4 * 4];
        let buffer = VoxelBuffer::from_densities(
            [4, 4, 4],
            &densities,
            Aab::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            Arc::new(Rgb::WHITE),
        )
        .unwrap();
        // Interior samples see all 8 corners at density 6; the result carries
        // the fixed /3.0 scaling.
        for p in [
            FreePoint::new(0.5, 0.5, 0.5),
            FreePoint::new(0.3, 0.6, 0.4),
            FreePoint::new(0.25, 0.25, 0.75),
        ] {
            assert!((buffer.interpolated_density(p) - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn interpolated_density_is_continuous() {
        let mut buffer = test_buffer([4, 4, 4]);
        for k in 0..4 {
            for j in 0..4 {
                for i in 0..4 {
                    buffer.set_density(i, j, k, (i + 2 * j + 4 * k) as f32 * 0.1);
                }
            }
        }
        // Two samples a tiny distance apart, straddling an interior cell
        // boundary, must produce nearly identical interpolated values.
        let x_boundary = 1.0 / 3.0; // grid coordinate 1 of 0..=3 maps to 1/3
        let a = buffer.interpolated_density(FreePoint::new(x_boundary - 1e-9, 0.4, 0.6));
        let b = buffer.interpolated_density(FreePoint::new(x_boundary + 1e-9, 0.4, 0.6));
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn light_cache_starts_unset_and_stores_once() {
        let voxel = Voxel::new(0.5);
        for slot in 0..MAX_LIGHTS {
            assert_eq!(voxel.cached_light(slot), None);
        }
        voxel.store_light(2, 0.75);
        assert_eq!(voxel.cached_light(2), Some(0.75));
        assert_eq!(voxel.cached_light(1), None);
    }

    #[test]
    fn voxel_lookup_by_position() {
        let mut buffer = test_buffer([2, 2, 2]);
        buffer.set_density(1, 0, 0, 9.0);
        let v = buffer.voxel_at(FreePoint::new(0.9, 0.1, 0.1)).unwrap();
        assert_eq!(v.density(), 9.0);
    }
}
