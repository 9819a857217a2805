//! Pinhole camera: view basis construction and ray generation.

use core::f64::consts::PI;
use core::fmt;

use crate::math::{FreeCoordinate, FreePoint, FreeVector};
use crate::raycast::Ray;

/// Generates world-space view rays from eye position, view direction, up
/// vector, vertical field of view, and aspect ratio.
///
/// The conceptual view plane sits at unit distance along the view direction.
/// Derived data (the orthonormal-ish basis and view-plane half-extent vectors)
/// is recomputed by every setter, so it is never stale.
#[derive(Clone, PartialEq)]
pub struct Camera {
    // Caller-provided data
    position: FreePoint,
    view_dir: FreeVector,
    up: FreeVector,
    fov_y: FreeCoordinate,
    aspect_ratio: FreeCoordinate,

    // Derived data
    u: FreeVector,
    v: FreeVector,
    w: FreeVector,
    midpoint: FreePoint,
    view_plane_x: FreeVector,
    view_plane_y: FreeVector,
}

impl Camera {
    /// Constructs a [`Camera`].
    ///
    /// `fov_y` is the half-angle field of view in the Y direction, in degrees.
    pub fn new(
        position: impl Into<FreePoint>,
        view_dir: impl Into<FreeVector>,
        up: impl Into<FreeVector>,
        fov_y: FreeCoordinate,
        aspect_ratio: FreeCoordinate,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            view_dir: view_dir.into(),
            up: up.into().normalize(),
            fov_y,
            aspect_ratio,
            u: FreeVector::zero(),
            v: FreeVector::zero(),
            w: FreeVector::zero(),
            midpoint: FreePoint::origin(),
            view_plane_x: FreeVector::zero(),
            view_plane_y: FreeVector::zero(),
        };
        camera.calibrate_view_plane();
        camera
    }

    /// Constructs a [`Camera`] at `position` looking toward `look_at`, with a
    /// +Y up vector.
    pub fn looking_at(
        position: impl Into<FreePoint>,
        look_at: impl Into<FreePoint>,
        fov_y: FreeCoordinate,
        aspect_ratio: FreeCoordinate,
    ) -> Self {
        let position = position.into();
        let view_dir = look_at.into() - position;
        Self::new(position, view_dir, [0.0, 1.0, 0.0], fov_y, aspect_ratio)
    }

    /// The eye position.
    #[inline]
    pub fn position(&self) -> FreePoint {
        self.position
    }

    /// The view direction (not necessarily unit length).
    #[inline]
    pub fn view_dir(&self) -> FreeVector {
        self.view_dir
    }

    /// The vertical half-angle field of view, in degrees.
    #[inline]
    pub fn fov_y(&self) -> FreeCoordinate {
        self.fov_y
    }

    /// The width:height aspect ratio of the image.
    #[inline]
    pub fn aspect_ratio(&self) -> FreeCoordinate {
        self.aspect_ratio
    }

    /// Moves the eye and re-derives the view plane.
    pub fn set_position(&mut self, position: FreePoint) {
        self.position = position;
        self.calibrate_view_plane();
    }

    /// Changes the view direction and re-derives the view plane.
    pub fn set_view_dir(&mut self, view_dir: FreeVector) {
        self.view_dir = view_dir;
        self.calibrate_view_plane();
    }

    /// Changes the up vector (normalizing it) and re-derives the view plane.
    pub fn set_up(&mut self, up: FreeVector) {
        self.up = up.normalize();
        self.calibrate_view_plane();
    }

    /// Changes the vertical half-angle field of view (degrees) and re-derives
    /// the view plane.
    pub fn set_fov_y(&mut self, fov_y: FreeCoordinate) {
        self.fov_y = fov_y;
        self.calibrate_view_plane();
    }

    /// Changes the aspect ratio and re-derives the view plane.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: FreeCoordinate) {
        self.aspect_ratio = aspect_ratio;
        self.calibrate_view_plane();
    }

    /// Maps normalized device coordinates `(x, y)`, each in `[0, 1]` with
    /// `(0, 0)` the upper-left corner, to a world-space point on the view
    /// plane.
    pub fn ndc_to_world(&self, x: FreeCoordinate, y: FreeCoordinate) -> FreePoint {
        // (0,0) arrives as upper-left; the view-plane basis has +Y upward,
        // so flip y into bottom-up coordinates first.
        let y_prime = 1.0 - y;
        self.midpoint
            + self.view_plane_x * (2.0 * x - 1.0)
            + self.view_plane_y * (2.0 * y_prime - 1.0)
    }

    /// Spawns the view ray through the NDC point `(x, y)`.
    pub fn spawn_ray(&self, x: FreeCoordinate, y: FreeCoordinate) -> Ray {
        Ray::new(self.position, self.ndc_to_world(x, y) - self.position)
    }

    /// Spawns the view ray for pixel `(x, y)` of a `width`×`height` image.
    pub fn spawn_ray_pixel(&self, x: usize, y: usize, width: usize, height: usize) -> Ray {
        self.spawn_ray(
            x as FreeCoordinate / width as FreeCoordinate,
            y as FreeCoordinate / height as FreeCoordinate,
        )
    }

    fn calibrate_view_plane(&mut self) {
        // Basis: w forward, u right, v up.
        self.w = self.view_dir;
        self.u = self.w.cross(self.up);
        self.v = self.u.cross(self.w);
        self.midpoint = self.position + self.view_dir;

        let u_bar = self.u.length();
        let v_bar = self.v.length();
        let w_bar = self.w.length();

        let phi = (self.fov_y * PI / 180.0).tan();
        let theta = phi * self.aspect_ratio;

        self.view_plane_x = self.u * w_bar * theta / u_bar;
        self.view_plane_y = self.v * w_bar * phi / v_bar;
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("position", &self.position)
            .field("view_dir", &self.view_dir)
            .field("up", &self.up)
            .field("fov_y", &self.fov_y)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("midpoint", &self.midpoint)
            .finish()
    }
}
