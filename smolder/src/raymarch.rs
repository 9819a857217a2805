//! Volumetric ray marching with Beer-Lambert attenuation.

use crate::math::{FreeCoordinate, FreePoint, Rgb};
use crate::raycast::SegmentMarch;
use crate::scene::RenderContext;
use crate::volume::VoxelBuffer;

/// Extinction coefficient of the participating medium.
pub(crate) const KAPPA: f32 = 1.0;

/// Nudge applied to marching start positions: the view-ray walk begins this
/// far past the box entry point, and the shadow walk this far past its
/// two-step skip, so the first sample never lands on a boundary.
const OFFSET_EPSILON: FreeCoordinate = f32::EPSILON as FreeCoordinate;

/// Accumulated result of marching a view ray through a density field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RayMarch {
    /// In-scattered light accumulated along the ray.
    pub color: Rgb,
    /// Residual transmittance after absorption along the ray.
    pub transmittance: f32,
}

/// Marches the segment from `entered` to `exited` through `buffer`,
/// accumulating emitted light and Beer-Lambert extinction.
///
/// Shadow transmittance toward each light is computed per voxel on first use
/// and memoized in the voxel's cache slots.
pub(crate) fn march(
    ctx: &RenderContext,
    buffer: &VoxelBuffer,
    entered: FreePoint,
    exited: FreePoint,
) -> RayMarch {
    let step = ctx.step();
    let walk = SegmentMarch::new(step, OFFSET_EPSILON, entered, exited);

    let mut color = Rgb::BLACK;
    let mut transmittance: f32 = 1.0;
    let origin = buffer.bounds().center();

    for x in walk.positions() {
        let Some((i, j, k)) = buffer.position_to_index(x) else {
            break;
        };
        let Some(voxel) = buffer.voxel(i, j, k) else {
            break;
        };

        let density = if ctx.interpolate() {
            buffer.interpolated_density(x)
        } else {
            voxel.density()
        };

        let delta_t = (-KAPPA * step as f32 * density).exp();
        transmittance *= delta_t;

        if density > 0.0 {
            let attenuation = (1.0 - delta_t) / KAPPA;
            let surface = buffer.material().color_at(x, origin);
            let center = buffer.cell_center(i, j, k);

            for (index, light) in ctx.lights().iter().enumerate() {
                let shadow = match voxel.cached_light(index) {
                    Some(q) => q,
                    None => {
                        let q = light_transmittance(ctx, buffer, center, light.position());
                        voxel.store_light(index, q);
                        q
                    }
                };
                color +=
                    light.color() * surface * (attenuation * transmittance * shadow);
            }
        }
    }

    RayMarch {
        color,
        transmittance,
    }
}

/// Fraction of a light's intensity that survives the medium between a voxel
/// center and the light.
///
/// The walk starts two steps (plus an epsilon) past the voxel center so the
/// voxel does not shadow itself, proceeds at the context's step size, and
/// ends at the light or at the first sample outside the grid, whichever comes
/// first; the remainder of the path is treated as vacuum.
fn light_transmittance(
    ctx: &RenderContext,
    buffer: &VoxelBuffer,
    center: FreePoint,
    light_position: FreePoint,
) -> f32 {
    let step = ctx.step();
    let walk = SegmentMarch::new(step, 2.0 * step + OFFSET_EPSILON, center, light_position);

    let mut q: f32 = 1.0;
    for position in walk.positions() {
        let Some(voxel) = buffer.voxel_at(position) else {
            break;
        };
        q *= (-KAPPA * step as f32 * voxel.density()).exp();
    }
    q
}
