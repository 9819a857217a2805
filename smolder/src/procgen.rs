//! Procedural density field generators.

use std::sync::Arc;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::material::Material;
use crate::math::{Aab, FreePoint};
use crate::volume::{GridError, VoxelBuffer};

/// Fractional-Brownian-motion noise over Perlin octaves, with an output
/// amplitude scale.
pub struct FbmNoise {
    fbm: Fbm<Perlin>,
    amplitude: f64,
}

impl FbmNoise {
    /// Constructs a noise source.
    ///
    /// `octaves` below 1 is treated as 1.
    pub fn new(seed: u32, octaves: usize, frequency: f64, amplitude: f64) -> Self {
        Self {
            fbm: Fbm::new(seed)
                .set_octaves(octaves.max(1))
                .set_frequency(frequency),
            amplitude,
        }
    }

    /// Samples the noise at a world-space point.
    pub fn sample(&self, p: FreePoint) -> f32 {
        (self.fbm.get([p.x, p.y, p.z]) * self.amplitude) as f32
    }
}

impl std::fmt::Debug for FbmNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FbmNoise")
            .field("amplitude", &self.amplitude)
            .finish_non_exhaustive()
    }
}

impl VoxelBuffer {
    /// Fills a grid with a sphere of density falling off linearly from
    /// `scale` at the center of `bounds` to zero at `radius`.
    pub fn sphere(
        dims: [usize; 3],
        bounds: Aab,
        material: Arc<dyn Material>,
        radius: f32,
        scale: f32,
    ) -> Result<Self, GridError> {
        let mut buffer = Self::new(dims, bounds, material)?;
        let center = bounds.center();
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let d = (buffer.cell_center(i, j, k) - center).length() as f32;
                    let density = if d <= radius {
                        (1.0 - d / radius) * scale
                    } else {
                        0.0
                    };
                    buffer.set_density(i, j, k, density);
                }
            }
        }
        Ok(buffer)
    }

    /// Fills a grid with a noisy cloud: the sphere falloff term plus fBm
    /// noise, clamped to non-negative density.
    ///
    /// Unlike [`VoxelBuffer::sphere`], positive noise can extend the cloud
    /// beyond `radius`.
    pub fn cloud(
        dims: [usize; 3],
        bounds: Aab,
        material: Arc<dyn Material>,
        radius: f32,
        scale: f32,
        noise: &FbmNoise,
    ) -> Result<Self, GridError> {
        let mut buffer = Self::new(dims, bounds, material)?;
        let center = bounds.center();
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let voxel_center = buffer.cell_center(i, j, k);
                    let fbm = noise.sample((center - voxel_center).to_point());
                    let falloff = 1.0 - (center - voxel_center).length() as f32 / radius;
                    let density = ((fbm + falloff) * scale).max(0.0);
                    buffer.set_density(i, j, k, density);
                }
            }
        }
        Ok(buffer)
    }

    /// Fills a grid with a pyroclastic plume: dense core with a crisp,
    /// noise-displaced boundary.
    ///
    /// Density is `max(0, radius − d/radius + |fbm|) · scale` where `d` is
    /// the distance from the center of `bounds`.
    pub fn pyroclastic(
        dims: [usize; 3],
        bounds: Aab,
        material: Arc<dyn Material>,
        radius: f32,
        scale: f32,
        noise: &FbmNoise,
    ) -> Result<Self, GridError> {
        let mut buffer = Self::new(dims, bounds, material)?;
        let center = bounds.center();
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let voxel_center = buffer.cell_center(i, j, k);
                    let fbm = noise.sample((center - voxel_center).to_point());
                    let factor = (center - voxel_center).length() as f32 / radius;
                    let density = (radius - factor + fbm.abs()).max(0.0) * scale;
                    buffer.set_density(i, j, k, density);
                }
            }
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rgb;
    use pretty_assertions::assert_eq;

    fn centered_bounds() -> Aab {
        Aab::new([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0])
    }

    #[test]
    fn sphere_peaks_at_center_and_vanishes_outside_radius() {
        let buffer = VoxelBuffer::sphere(
            [9, 9, 9],
            centered_bounds(),
            Arc::new(Rgb::WHITE),
            1.0,
            2.0,
        )
        .unwrap();
        // Odd dimensions put voxel (4,4,4) exactly at the bounds center.
        let peak = buffer.voxel(4, 4, 4).unwrap().density();
        assert!((peak - 2.0).abs() < 1e-5);
        // The corner voxel is farther than the radius.
        assert_eq!(buffer.voxel(0, 0, 0).unwrap().density(), 0.0);
    }

    #[test]
    fn sphere_density_decreases_with_distance() {
        let buffer = VoxelBuffer::sphere(
            [9, 9, 9],
            centered_bounds(),
            Arc::new(Rgb::WHITE),
            1.0,
            1.0,
        )
        .unwrap();
        let at_center = buffer.voxel(4, 4, 4).unwrap().density();
        let one_off = buffer.voxel(5, 4, 4).unwrap().density();
        let two_off = buffer.voxel(6, 4, 4).unwrap().density();
        assert!(at_center > one_off);
        assert!(one_off > two_off);
        assert!(two_off > 0.0);
    }

    #[test]
    fn cloud_with_zero_amplitude_matches_sphere() {
        let silent = FbmNoise::new(7, 2, 1.0, 0.0);
        let cloud = VoxelBuffer::cloud(
            [7, 7, 7],
            centered_bounds(),
            Arc::new(Rgb::WHITE),
            1.0,
            1.5,
            &silent,
        )
        .unwrap();
        let sphere = VoxelBuffer::sphere(
            [7, 7, 7],
            centered_bounds(),
            Arc::new(Rgb::WHITE),
            1.0,
            1.5,
        )
        .unwrap();
        for k in 0..7 {
            for j in 0..7 {
                for i in 0..7 {
                    let c = cloud.voxel(i, j, k).unwrap().density();
                    let s = sphere.voxel(i, j, k).unwrap().density();
                    assert!((c - s).abs() < 1e-5, "mismatch at ({i}, {j}, {k})");
                }
            }
        }
    }

    #[test]
    fn pyroclastic_core_is_dense() {
        let silent = FbmNoise::new(3, 1, 1.0, 0.0);
        let buffer = VoxelBuffer::pyroclastic(
            [9, 9, 9],
            centered_bounds(),
            Arc::new(Rgb::WHITE),
            1.0,
            2.0,
            &silent,
        )
        .unwrap();
        // With silent noise the center density is radius · scale.
        let peak = buffer.voxel(4, 4, 4).unwrap().density();
        assert!((peak - 2.0).abs() < 1e-5);
        assert!(buffer.voxel(0, 0, 0).unwrap().density() < peak);
    }

    #[test]
    fn noise_is_deterministic_per_seed() {
        let a = FbmNoise::new(42, 4, 2.0, 1.0);
        let b = FbmNoise::new(42, 4, 2.0, 1.0);
        let c = FbmNoise::new(43, 4, 2.0, 1.0);
        let p = FreePoint::new(0.3, -0.7, 0.2);
        assert_eq!(a.sample(p), b.sample(p));
        assert_ne!(a.sample(p), c.sample(p));
    }

    #[test]
    fn noise_amplitude_scales_output() {
        let unit = FbmNoise::new(5, 3, 1.5, 1.0);
        let doubled = FbmNoise::new(5, 3, 1.5, 2.0);
        let p = FreePoint::new(0.1, 0.9, -0.4);
        assert!((doubled.sample(p) - 2.0 * unit.sample(p)).abs() < 1e-6);
    }
}
