//! Scene aggregation: lights, intersectable primitives, and the per-pass
//! render context.

use core::fmt;

use crate::math::{FreeCoordinate, FreePoint, Rgb};
use crate::raycast::Ray;
use crate::volume::MAX_LIGHTS;

/// A point light: a world-space position radiating a color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    position: FreePoint,
    color: Rgb,
}

impl Light {
    /// Constructs a [`Light`].
    pub fn new(position: impl Into<FreePoint>, color: Rgb) -> Self {
        Self {
            position: position.into(),
            color,
        }
    }

    /// The light's world-space position.
    #[inline]
    pub fn position(&self) -> FreePoint {
        self.position
    }

    /// The light's color.
    #[inline]
    pub fn color(&self) -> Rgb {
        self.color
    }
}

/// Result of successfully intersecting a primitive with a view ray:
/// the light it contributes and the fraction of background light it lets
/// through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Accumulated color along the ray's path through the primitive.
    pub color: Rgb,
    /// Residual transmittance in `[0, 1]`; 1 means fully transparent.
    pub transmittance: f32,
}

/// An object that can be tested for intersection with a view ray.
pub trait Primitive: Send + Sync + fmt::Debug {
    /// Intersects `ray` with this object, computing its color contribution
    /// under the given context, or [`None`] on a geometric miss.
    fn intersect(&self, ray: &Ray, ctx: &RenderContext) -> Option<Hit>;
}

/// Errors detected while assembling a scene, before any pixel is rendered.
#[derive(Clone, Copy, Debug, displaydoc::Display, Eq, PartialEq)]
#[non_exhaustive]
pub enum SceneError {
    /// scene has {count} lights but at most {MAX_LIGHTS} are supported
    TooManyLights {
        /// Number of lights requested.
        count: usize,
    },
    /// ray-march step size must be positive
    NonPositiveStep,
}

impl std::error::Error for SceneError {}

/// Read-only options and scene content for a single render pass.
pub struct RenderContext {
    step: FreeCoordinate,
    primitives: Vec<Box<dyn Primitive>>,
    lights: Vec<Light>,
    background: Rgb,
    interpolate: bool,
}

impl RenderContext {
    /// Assembles a render context, validating scene-level preconditions.
    ///
    /// Fails if there are more than [`MAX_LIGHTS`] lights (the per-voxel
    /// shadow cache has one slot per light) or if `step` is not positive.
    pub fn new(
        step: FreeCoordinate,
        primitives: Vec<Box<dyn Primitive>>,
        lights: Vec<Light>,
        background: Rgb,
    ) -> Result<Self, SceneError> {
        if !(step > 0.0) {
            return Err(SceneError::NonPositiveStep);
        }
        if lights.len() > MAX_LIGHTS {
            return Err(SceneError::TooManyLights {
                count: lights.len(),
            });
        }
        Ok(Self {
            step,
            primitives,
            lights,
            background,
            interpolate: false,
        })
    }

    /// The ray-march step size, in world units.
    #[inline]
    pub fn step(&self) -> FreeCoordinate {
        self.step
    }

    /// The intersectable objects of the scene.
    #[inline]
    pub fn primitives(&self) -> &[Box<dyn Primitive>] {
        &self.primitives
    }

    /// The scene's lights, in cache-slot order.
    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// The background color composited behind all primitives.
    #[inline]
    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Whether density sampling uses trilinear interpolation.
    #[inline]
    pub fn interpolate(&self) -> bool {
        self.interpolate
    }

    /// Enables or disables trilinear density interpolation.
    pub fn set_interpolation(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("step", &self.step)
            .field("primitives.len", &self.primitives.len())
            .field("lights", &self.lights)
            .field("background", &self.background)
            .field("interpolate", &self.interpolate)
            .finish()
    }
}
