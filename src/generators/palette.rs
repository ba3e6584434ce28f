//! Edge color scale and hex color helpers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`; the leading `#` is optional.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();

        match hex.len() {
            6 => Some(Self::new(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            3 => {
                let expand = |v: u8| v * 17;
                Some(Self::new(
                    expand(channel(0, 1)?),
                    expand(channel(1, 1)?),
                    expand(channel(2, 1)?),
                ))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

/// Key stops of the viridis ramp, evenly spaced over `[0, 1]`.
const VIRIDIS: [Rgb; 9] = [
    Rgb::new(0x44, 0x01, 0x54),
    Rgb::new(0x47, 0x2c, 0x7a),
    Rgb::new(0x3b, 0x51, 0x8b),
    Rgb::new(0x2c, 0x71, 0x8e),
    Rgb::new(0x21, 0x90, 0x8d),
    Rgb::new(0x27, 0xad, 0x81),
    Rgb::new(0x5c, 0xc8, 0x63),
    Rgb::new(0xaa, 0xdc, 0x32),
    Rgb::new(0xfd, 0xe7, 0x25),
];

/// Map a scalar to a color. Input is clamped to `[0, 1]`; NaN maps to the low end.
pub fn scale(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (VIRIDIS.len() - 1) as f64;
    let pos = t * segments;
    let lo = (pos.floor() as usize).min(VIRIDIS.len() - 2);
    VIRIDIS[lo].lerp(VIRIDIS[lo + 1], pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_hits_the_endpoints() {
        assert_eq!(scale(0.0), VIRIDIS[0]);
        assert_eq!(scale(1.0), VIRIDIS[8]);
        assert_eq!(scale(0.5), VIRIDIS[4]);
    }

    #[test]
    fn scale_clamps_out_of_range() {
        assert_eq!(scale(-3.0), VIRIDIS[0]);
        assert_eq!(scale(7.0), VIRIDIS[8]);
        assert_eq!(scale(f64::NAN), VIRIDIS[0]);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("#1f78b4"), Some(Rgb::new(0x1f, 0x78, 0xb4)));
        assert_eq!(Rgb::from_hex("fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#+f+f+f"), None);
        assert_eq!(Rgb::from_hex("+ff"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");
    }
}
