//! Volumetric renderer for voxel density fields.
//!
//! A scene is a set of [`scene::Primitive`]s — typically [`volume::VoxelBuffer`]
//! density grids, filled by hand or by the generators in [`procgen`] — plus
//! point [`scene::Light`]s and a background color. [`render::render`] traces a
//! view ray per pixel through each field, accumulating in-scattered light and
//! Beer-Lambert extinction, and produces an sRGB image.
//!
//! Cargo features:
//!
//! * `"auto-threads"` (default): trace pixel rows in parallel via `rayon`.

pub mod camera;
pub mod material;
pub mod math;
pub mod procgen;
pub mod raycast;
mod raymarch;
pub mod render;
pub mod scene;
pub mod volume;

pub use camera::Camera;
pub use math::{Aab, Rgb};
pub use scene::{Light, RenderContext, SceneError};
pub use volume::{VoxelBuffer, MAX_LIGHTS};
