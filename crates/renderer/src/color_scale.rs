//! Discrete velocity colour scale.
//!
//! Colours are ordered from slowest to fastest. A magnitude is mapped
//! linearly from `[min, max]` onto the bucket indices and rounded to the
//! nearest bucket, so the first and last colours cover half a bucket each.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Default ramp: dark blue through yellow to dark red.
pub const DEFAULT_COLOR_SCALE: [&str; 15] = [
    "rgb(36,104,180)",
    "rgb(60,157,194)",
    "rgb(128,205,193)",
    "rgb(151,218,168)",
    "rgb(198,231,181)",
    "rgb(238,247,217)",
    "rgb(255,238,159)",
    "rgb(252,217,125)",
    "rgb(255,182,100)",
    "rgb(252,150,75)",
    "rgb(250,112,52)",
    "rgb(245,64,32)",
    "rgb(237,45,28)",
    "rgb(220,24,32)",
    "rgb(180,0,35)",
];

/// Ordered list of bucket colours.
///
/// Serializes as the list of CSS colour strings it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColorScale {
    css: Vec<String>,
    colors: Vec<[u8; 4]>,
}

impl ColorScale {
    /// Parse a scale from CSS colour strings.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, RenderError> {
        if entries.is_empty() {
            return Err(RenderError::InvalidColor("colour scale is empty".to_string()));
        }

        let mut css = Vec::with_capacity(entries.len());
        let mut colors = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let color =
                parse_css_color(entry).ok_or_else(|| RenderError::InvalidColor(entry.to_string()))?;
            css.push(entry.to_string());
            colors.push(color);
        }

        Ok(Self { css, colors })
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// A parsed scale always has at least one colour.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// RGBA colour of a bucket.
    pub fn color(&self, bucket: usize) -> Option<[u8; 4]> {
        self.colors.get(bucket).copied()
    }

    /// All bucket colours in order.
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// The CSS strings the scale was parsed from.
    pub fn css(&self) -> &[String] {
        &self.css
    }

    /// Bucket index for a velocity magnitude.
    ///
    /// Rounds half up and clamps to the valid range; magnitudes outside
    /// `[min, max]` land in the first or last bucket.
    pub fn index_for(&self, magnitude: f32, min: f32, max: f32) -> usize {
        let last = self.colors.len().saturating_sub(1);
        let position = (magnitude - min) / (max - min) * last as f32;
        if !position.is_finite() {
            return if magnitude >= max { last } else { 0 };
        }
        let index = (position + 0.5).floor();
        index.clamp(0.0, last as f32) as usize
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        let css: Vec<String> = DEFAULT_COLOR_SCALE.iter().map(|s| s.to_string()).collect();
        let colors = DEFAULT_COLOR_SCALE
            .iter()
            .map(|s| parse_css_color(s).unwrap_or([0, 0, 0, 255]))
            .collect();
        Self { css, colors }
    }
}

impl TryFrom<Vec<String>> for ColorScale {
    type Error = RenderError;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&entries)
    }
}

impl From<ColorScale> for Vec<String> {
    fn from(scale: ColorScale) -> Self {
        scale.css
    }
}

/// Parse `#rrggbb`, `#rgb`, `rgb(r,g,b)` or `rgba(r,g,b,a)` into RGBA.
pub fn parse_css_color(value: &str) -> Option<[u8; 4]> {
    let value = value.trim();
    if value.starts_with('#') {
        return hex_to_rgba(value);
    }

    let (body, has_alpha) = if let Some(body) = value.strip_prefix("rgba(") {
        (body, true)
    } else if let Some(body) = value.strip_prefix("rgb(") {
        (body, false)
    } else {
        return None;
    };
    let body = body.strip_suffix(')')?;
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();

    match (parts.len(), has_alpha) {
        (3, false) => Some([
            parts[0].parse().ok()?,
            parts[1].parse().ok()?,
            parts[2].parse().ok()?,
            255,
        ]),
        (4, true) => {
            let alpha: f32 = parts[3].parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            Some([
                parts[0].parse().ok()?,
                parts[1].parse().ok()?,
                parts[2].parse().ok()?,
                (alpha * 255.0).round() as u8,
            ])
        }
        _ => None,
    }
}

/// Convert hex color string to RGBA
fn hex_to_rgba(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => Some([
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
            255,
        ]),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some([digit(0)?, digit(1)?, digit(2)?, 255])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_forms() {
        assert_eq!(parse_css_color("rgb(36,104,180)"), Some([36, 104, 180, 255]));
        assert_eq!(parse_css_color("rgb( 1, 2 , 3 )"), Some([1, 2, 3, 255]));
        assert_eq!(parse_css_color("rgba(0,0,0,0.5)"), Some([0, 0, 0, 128]));
        assert_eq!(parse_css_color("#ff8000"), Some([255, 128, 0, 255]));
        assert_eq!(parse_css_color("#f80"), Some([255, 136, 0, 255]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_css_color("blue"), None);
        assert_eq!(parse_css_color("rgb(300,0,0)"), None);
        assert_eq!(parse_css_color("rgb(1,2)"), None);
        assert_eq!(parse_css_color("rgba(1,2,3,4)"), None);
        assert_eq!(parse_css_color("#12345"), None);
    }

    #[test]
    fn test_default_scale() {
        let scale = ColorScale::default();
        assert_eq!(scale.len(), 15);
        assert_eq!(scale.color(0), Some([36, 104, 180, 255]));
        assert_eq!(scale.color(14), Some([180, 0, 35, 255]));
    }

    #[test]
    fn test_index_for_rounds_half_up() {
        let scale = ColorScale::parse(&["#000", "#111", "#222", "#333", "#444"]).unwrap();
        // Five buckets over 0..4 maps one m/s to one bucket
        assert_eq!(scale.index_for(0.0, 0.0, 4.0), 0);
        assert_eq!(scale.index_for(0.25, 0.0, 4.0), 0);
        assert_eq!(scale.index_for(0.5, 0.0, 4.0), 1);
        assert_eq!(scale.index_for(2.5, 0.0, 4.0), 3);
        assert_eq!(scale.index_for(4.0, 0.0, 4.0), 4);
    }

    #[test]
    fn test_index_for_clamps() {
        let scale = ColorScale::default();
        assert_eq!(scale.index_for(-3.0, 0.0, 10.0), 0);
        assert_eq!(scale.index_for(100.0, 0.0, 10.0), 14);
    }

    #[test]
    fn test_index_for_degenerate_range() {
        let scale = ColorScale::default();
        assert_eq!(scale.index_for(5.0, 5.0, 5.0), 14);
        assert_eq!(scale.index_for(4.0, 5.0, 5.0), 0);
    }

    #[test]
    fn test_serde_roundtrip_as_strings() {
        let scale = ColorScale::parse(&["#000000", "rgb(255,255,255)"]).unwrap();
        let json = serde_json::to_string(&scale).unwrap();
        assert_eq!(json, r##"["#000000","rgb(255,255,255)"]"##);

        let parsed: ColorScale = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scale);

        assert!(serde_json::from_str::<ColorScale>(r#"["nope"]"#).is_err());
        assert!(serde_json::from_str::<ColorScale>("[]").is_err());
    }
}
