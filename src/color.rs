//! RGBA colors and the fixed palettes used by items, the creature, and bursts

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Linear RGBA color, 0.0 - 1.0 per channel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xFFFFFF);

    /// Build an opaque color from `0xRRGGBB`
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Build an opaque color from hue (degrees), saturation and lightness (0-1)
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        Self {
            r: r + m,
            g: g + m,
            b: b + m,
            a: 1.0,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Colors a plain item may take
pub const BRIGHT_PALETTE: [Color; 5] = [
    Color::from_hex(0xFFFF00),
    Color::from_hex(0x40E0D0),
    Color::from_hex(0xFFFFFF),
    Color::from_hex(0xFF8000),
    Color::from_hex(0x32CD32),
];

/// Creature tint before any tiered capture
pub const CREATURE_NEUTRAL: Color = Color::from_hex(0xD3D3D3);
/// Identity color of tier-A items (and the tint they leave behind)
pub const TIER_A: Color = Color::from_hex(0x00F3FF);
/// Identity color of tier-B items
pub const TIER_B: Color = Color::from_hex(0xFFFF00);

pub const TIER_A_BURST: [Color; 4] = [
    Color::from_hex(0x00F3FF),
    Color::from_hex(0xFFFFFF),
    Color::from_hex(0x80F9FF),
    Color::from_hex(0x0080FF),
];

pub const TIER_B_BURST: [Color; 4] = [
    Color::from_hex(0xFFFF00),
    Color::from_hex(0xFFFFFF),
    Color::from_hex(0xFFFF80),
    Color::from_hex(0xFFAA00),
];

/// Secondary sparks mixed into a plain capture burst
pub const PLAIN_BURST_ACCENTS: [Color; 2] = [Color::from_hex(0xFFFFFF), Color::from_hex(0xDDDDDD)];

pub const EXPLOSION: [Color; 7] = [
    Color::from_hex(0xFF4E4E),
    Color::from_hex(0xFF8F4E),
    Color::from_hex(0xFFCF4E),
    Color::from_hex(0xFFFFFF),
    Color::from_hex(0xFF6B9D),
    Color::from_hex(0xFF3030),
    Color::from_hex(0xFFD700),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex(0xFF8000);
        assert!(close(c.r, 1.0));
        assert!(close(c.g, 128.0 / 255.0));
        assert!(close(c.b, 0.0));
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_from_hsl_primaries() {
        let red = Color::from_hsl(0.0, 1.0, 0.5);
        assert!(close(red.r, 1.0) && close(red.g, 0.0) && close(red.b, 0.0));

        let blue = Color::from_hsl(240.0, 1.0, 0.5);
        assert!(close(blue.r, 0.0) && close(blue.g, 0.0) && close(blue.b, 1.0));

        // Hue wraps
        let wrapped = Color::from_hsl(480.0, 1.0, 0.5);
        let green_ish = Color::from_hsl(120.0, 1.0, 0.5);
        assert!(close(wrapped.g, green_ish.g));
    }
}
