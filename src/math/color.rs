#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// An RGBA color with unit-interval float channels, as the host sees it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Fully transparent black, the engine's "no color" value
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Creates a color from unit-interval channels
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// A particle color as the engine stores it: one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ParticleColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ParticleColor {
    /// Creates a color from byte channels
    #[inline]
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the channels in RGBA order
    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Reads a single channel
    #[inline]
    pub fn channel(self, channel: ColorChannel) -> u8 {
        match channel {
            ColorChannel::Red => self.r,
            ColorChannel::Green => self.g,
            ColorChannel::Blue => self.b,
            ColorChannel::Alpha => self.a,
        }
    }
}

/// Selects one channel of a color buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
    Alpha,
}

/// Multiplies by 255 and truncates. Inputs are clamped to [0, 1] first so the
/// cast never wraps.
#[inline]
pub fn unit_to_byte(value: f32) -> u8 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    (clamped * 255.0) as u8
}

/// Divides by 255
#[inline]
pub fn byte_to_unit(value: u8) -> f32 {
    value as f32 / 255.0
}

/// Host to engine conversion. Lossy: the round trip back through
/// [`Color::from`] may differ by up to 1/255 per channel.
impl From<Color> for ParticleColor {
    fn from(color: Color) -> Self {
        Self {
            r: unit_to_byte(color.r),
            g: unit_to_byte(color.g),
            b: unit_to_byte(color.b),
            a: unit_to_byte(color.a),
        }
    }
}

impl From<ParticleColor> for Color {
    fn from(color: ParticleColor) -> Self {
        Self {
            r: byte_to_unit(color.r),
            g: byte_to_unit(color.g),
            b: byte_to_unit(color.b),
            a: byte_to_unit(color.a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_instead_of_rounding() {
        // 0.999 * 255 = 254.745
        assert_eq!(unit_to_byte(0.999), 254);
        assert_eq!(unit_to_byte(1.0), 255);
        assert_eq!(unit_to_byte(0.0), 0);
    }

    #[test]
    fn out_of_range_inputs_clamp() {
        assert_eq!(unit_to_byte(-0.5), 0);
        assert_eq!(unit_to_byte(7.0), 255);
        assert_eq!(unit_to_byte(f32::NAN), 0);
    }

    #[test]
    fn white_maps_to_full_bytes() {
        let c = ParticleColor::from(Color::WHITE);
        assert_eq!(c.to_array(), [255, 255, 255, 255]);
        assert_eq!(Color::from(c), Color::WHITE);
    }
}
