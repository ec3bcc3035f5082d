//! Color math for cell backgrounds.
//!
//! Colors are handled as [`Rgb`] triples and emitted as CSS hex strings,
//! which the page hands straight to inline styles.

/// RGB color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from a hex string (with or without #).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Self { r, g, b })
    }

    /// CSS hex string (#RRGGBB).
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear blend toward `other`, `t` clamped to [0, 1]
    pub fn mix(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: lerp_u8(self.r, other.r, t),
            g: lerp_u8(self.g, other.g, t),
            b: lerp_u8(self.b, other.b, t),
        }
    }

    /// Relative luminance (0.0 to 1.0), 0.299/0.587/0.114 weights.
    pub fn luminance(self) -> f64 {
        let r = f64::from(self.r);
        let g = f64::from(self.g);
        let b = f64::from(self.b);
        (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
    }

    pub fn is_light(self) -> bool {
        self.luminance() > 0.5
    }

    /// Readable text color on this background
    pub fn contrast_text(self) -> Self {
        if self.is_light() {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let a = f64::from(a);
    let b = f64::from(b);
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// Position (0.0 to 1.0) of `value` within `[min, max]`.
///
/// A degenerate range (every value equal) maps to the midpoint.
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        0.5
    } else {
        ((value - min) / span).clamp(0.0, 1.0)
    }
}

/// Min and max over finite values; `None` when there are none
pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Evenly spaced multi-stop gradient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRamp {
    stops: Vec<Rgb>,
}

/// Red -> yellow -> green
pub const HEATMAP_STOPS: [Rgb; 3] = [
    Rgb::new(0xF8, 0x69, 0x6B),
    Rgb::new(0xFF, 0xEB, 0x84),
    Rgb::new(0x63, 0xBE, 0x7B),
];

impl ColorRamp {
    pub fn new(stops: Vec<Rgb>) -> Self {
        Self { stops }
    }

    pub fn heatmap() -> Self {
        Self::new(HEATMAP_STOPS.to_vec())
    }

    /// Color at `position` (clamped to [0, 1])
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn at(&self, position: f64) -> Rgb {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgb::WHITE;
        };
        if self.stops.len() == 1 {
            return *first;
        }

        let position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        let num_segments = self.stops.len() - 1;
        let segment_size = 1.0 / num_segments as f64;

        let segment_index = ((position / segment_size).floor() as usize).min(num_segments - 1);
        let segment_pos =
            ((position - (segment_index as f64 * segment_size)) / segment_size).clamp(0.0, 1.0);

        let from = self.stops.get(segment_index).copied().unwrap_or(*first);
        let to = self.stops.get(segment_index + 1).copied().unwrap_or(*last);
        from.mix(to, segment_pos)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex("#f8696b").unwrap();
        assert_eq!(c, Rgb::new(0xF8, 0x69, 0x6B));
        assert_eq!(c.to_hex(), "#F8696B");
        assert!(Rgb::from_hex("#FFF").is_none());
        assert!(Rgb::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_ramp_endpoints_and_midpoint() {
        let ramp = ColorRamp::heatmap();
        assert_eq!(ramp.at(0.0).to_hex(), "#F8696B");
        assert_eq!(ramp.at(0.5).to_hex(), "#FFEB84");
        assert_eq!(ramp.at(1.0).to_hex(), "#63BE7B");
        assert_eq!(ramp.at(7.0), ramp.at(1.0));
        assert_eq!(ramp.at(f64::NAN), ramp.at(0.0));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_value(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize_value(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize_value(3.0, 3.0, 3.0), 0.5);
    }

    #[test]
    fn test_min_max_skips_non_finite() {
        assert_eq!(min_max([3.0, f64::NAN, -1.0, f64::INFINITY]), Some((-1.0, 3.0)));
        assert_eq!(min_max(std::iter::empty()), None);
    }

    #[test]
    fn test_contrast() {
        assert_eq!(Rgb::new(0x63, 0xBE, 0x7B).contrast_text(), Rgb::BLACK);
        assert_eq!(Rgb::new(0x10, 0x10, 0x40).contrast_text(), Rgb::WHITE);
    }
}
