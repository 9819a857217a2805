//! The shading capability: mapping positions to colors.

use core::f64::consts::{PI, TAU};
use core::fmt;

use imgref::ImgVec;

use crate::math::{FreePoint, Rgb};

/// Capability to answer "what color is this object at this position?".
///
/// `origin` is a reference point for the query — for a voxel field, the center
/// of its bounding box — so that direction-dependent materials (such as
/// spherically mapped textures) have a stable frame.
pub trait Material: Send + Sync + fmt::Debug {
    /// The color at `position`, relative to the reference point `origin`.
    fn color_at(&self, position: FreePoint, origin: FreePoint) -> Rgb;
}

/// A solid color is the simplest material.
impl Material for Rgb {
    #[inline]
    fn color_at(&self, _position: FreePoint, _origin: FreePoint) -> Rgb {
        *self
    }
}

/// An image-backed material sampled by spherical UV mapping around the query
/// origin.
///
/// Decoding image files is the caller's concern; this type consumes an
/// already-decoded RGB texel buffer.
pub struct SphericalTexture {
    texels: ImgVec<[u8; 3]>,
}

impl SphericalTexture {
    /// Wraps a decoded texel buffer.
    ///
    /// Panics if the buffer has a zero dimension.
    pub fn new(texels: ImgVec<[u8; 3]>) -> Self {
        assert!(
            texels.width() > 0 && texels.height() > 0,
            "texture must have nonzero dimensions"
        );
        Self { texels }
    }
}

impl Material for SphericalTexture {
    fn color_at(&self, position: FreePoint, origin: FreePoint) -> Rgb {
        let d = (position - origin).normalize();

        // Spherical UV mapping of the direction from the origin.
        let u = (0.5 + d.z.atan2(d.x) / TAU).clamp(0.0, 1.0);
        let v = (0.5 - d.y.asin() / PI).clamp(0.0, 1.0);

        let i = (u * (self.texels.width() - 1) as f64).floor() as usize;
        let j = (v * (self.texels.height() - 1) as f64).floor() as usize;
        Rgb::from_srgb8(self.texels[(i, j)])
    }
}

impl fmt::Debug for SphericalTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SphericalTexture")
            .field("width", &self.texels.width())
            .field("height", &self.texels.height())
            .finish_non_exhaustive()
    }
}
