//! Top-level rendering: tracing every pixel of an image.

use imgref::{Img, ImgVec};

use crate::camera::Camera;
use crate::math::Rgb;
use crate::scene::RenderContext;

/// Renders the scene to a `width`×`height` sRGB image.
///
/// Each pixel's view ray is tested against every primitive; the color
/// contributions add and the transmittances multiply, and the background
/// shows through by the combined transmittance.
///
/// Pixels are independent, so with the `"auto-threads"` feature rows are
/// traced in parallel.
pub fn render(ctx: &RenderContext, camera: &Camera, width: usize, height: usize) -> ImgVec<[u8; 3]> {
    log::debug!(
        "rendering {width}\u{d7}{height} pixels, {} primitive(s), {} light(s)",
        ctx.primitives().len(),
        ctx.lights().len(),
    );
    Img::new(compute_pixels(ctx, camera, width, height), width, height)
}

#[cfg(feature = "auto-threads")]
fn compute_pixels(
    ctx: &RenderContext,
    camera: &Camera,
    width: usize,
    height: usize,
) -> Vec<[u8; 3]> {
    use rayon::iter::{IntoParallelIterator as _, ParallelIterator as _};

    (0..height)
        .into_par_iter()
        .flat_map_iter(move |y| (0..width).map(move |x| trace_pixel(ctx, camera, x, y, width, height)))
        .collect()
}

#[cfg(not(feature = "auto-threads"))]
fn compute_pixels(
    ctx: &RenderContext,
    camera: &Camera,
    width: usize,
    height: usize,
) -> Vec<[u8; 3]> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            pixels.push(trace_pixel(ctx, camera, x, y, width, height));
        }
        if y % 64 == 63 {
            log::debug!("row {} of {height}", y + 1);
        }
    }
    pixels
}

fn trace_pixel(
    ctx: &RenderContext,
    camera: &Camera,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> [u8; 3] {
    let ray = camera.spawn_ray_pixel(x, y, width, height);

    let mut color = Rgb::BLACK;
    let mut transmittance: f32 = 1.0;
    for primitive in ctx.primitives() {
        if let Some(hit) = primitive.intersect(&ray, ctx) {
            color += hit.color;
            transmittance *= hit.transmittance;
        }
    }

    (color + ctx.background() * transmittance).to_srgb8()
}
