//! Color data types. This module is private but reexported by its parent.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};

use euclid::Vector3D;

/// Unit-of-measure type for vectors that contain color channels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intensity {}

/// A floating-point RGB color value.
///
/// Channels are linear and nominally in `[0, 1]`, but accumulated radiance may
/// exceed 1; clamping happens only on conversion to bytes.
#[derive(Clone, Copy, PartialEq)]
pub struct Rgb(Vector3D<f32, Intensity>);

impl Rgb {
    /// Black; all channels zero.
    pub const BLACK: Rgb = Rgb(Vector3D::new(0.0, 0.0, 0.0));
    /// Nominal white.
    pub const WHITE: Rgb = Rgb(Vector3D::new(1.0, 1.0, 1.0));

    /// Constructs an [`Rgb`] from linear channel values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self(Vector3D::new(r, g, b))
    }

    /// Constructs an [`Rgb`] from 8-bit channel values in `[0, 255]`.
    #[inline]
    pub fn from_srgb8(rgb: [u8; 3]) -> Self {
        Self::new(
            f32::from(rgb[0]) / 255.0,
            f32::from(rgb[1]) / 255.0,
            f32::from(rgb[2]) / 255.0,
        )
    }

    /// Red channel.
    #[inline]
    pub const fn red(&self) -> f32 {
        self.0.x
    }
    /// Green channel.
    #[inline]
    pub const fn green(&self) -> f32 {
        self.0.y
    }
    /// Blue channel.
    #[inline]
    pub const fn blue(&self) -> f32 {
        self.0.z
    }

    /// Converts to 8-bit channels, clamping each channel to `[0, 1]` first.
    #[inline]
    pub fn to_srgb8(self) -> [u8; 3] {
        fn channel(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).floor() as u8
        }
        [channel(self.0.x), channel(self.0.y), channel(self.0.z)]
    }
}

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rgb({:?}, {:?}, {:?})",
            self.red(),
            self.green(),
            self.blue()
        )
    }
}

impl Add for Rgb {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Rgb {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Multiplies two colors componentwise.
impl Mul for Rgb {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self(self.0.component_mul(other.0))
    }
}

/// Multiplies each channel by a scalar.
impl Mul<f32> for Rgb {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self(self.0 * scalar)
    }
}

impl Sum for Rgb {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Rgb::BLACK, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_conversion_rounds_down_and_clamps() {
        assert_eq!(Rgb::new(0.0, 0.5, 1.0).to_srgb8(), [0, 127, 255]);
        assert_eq!(Rgb::new(-0.5, 2.0, 0.999).to_srgb8(), [0, 255, 254]);
    }

    #[test]
    fn componentwise_multiply() {
        let c = Rgb::new(0.5, 1.0, 0.25) * Rgb::new(1.0, 0.5, 0.0);
        assert_eq!(c, Rgb::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn scalar_multiply_and_accumulate() {
        let mut acc = Rgb::BLACK;
        acc += Rgb::WHITE * 0.25;
        acc += Rgb::WHITE * 0.25;
        assert_eq!(acc, Rgb::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn from_srgb8_round_trip() {
        assert_eq!(Rgb::from_srgb8([255, 0, 51]).to_srgb8(), [255, 0, 51]);
    }
}
