use crate::domain::market_data::Timestamp;
use serde::{Deserialize, Serialize};

/// Inclusive index range of the bars currently in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRange {
    pub start: usize,
    pub end: usize,
}

impl DataRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Value Object - visible window geometry
///
/// `data_range` is `None` only while the series is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub candle_width: f64,
    pub visible_count: usize,
    pub right_offset: f64,
    pub data_range: Option<DataRange>,
}

impl ViewportState {
    pub fn new(candle_width: f64) -> Self {
        Self { candle_width, visible_count: 0, right_offset: 0.0, data_range: None }
    }

    pub fn is_empty(&self) -> bool {
        self.data_range.is_none()
    }
}

/// Value Object - the single shared cursor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosshairState {
    pub index: Option<usize>,
    pub timestamp: Option<Timestamp>,
    pub source: Option<String>,
    pub is_locked: bool,
}

/// Bounds on the pixel width of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    pub const DEFAULT: ZoomLimits = ZoomLimits { min: 2.0, max: 50.0 };

    /// Positive, finite and ordered bounds; malformed input degrades instead of failing.
    pub fn sanitized(min: f64, max: f64) -> Self {
        let min = if min.is_finite() && min > 0.0 { min } else { Self::DEFAULT.min };
        let max = if max.is_finite() && max > 0.0 { max } else { Self::DEFAULT.max };
        if min <= max { Self { min, max } } else { Self { min: max, max: min } }
    }

    pub fn clamp(&self, width: f64) -> f64 {
        if width.is_nan() { self.min } else { width.clamp(self.min, self.max) }
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Value Object - Color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_hex(&self) -> u32 {
        let r = (self.r * 255.0).round() as u32;
        let g = (self.g * 255.0).round() as u32;
        let b = (self.b * 255.0).round() as u32;
        (r << 16) | (g << 8) | b
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn parse(css: &str) -> Option<Self> {
        let digits = css.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    pub fn to_css(&self) -> String {
        format!("#{:06X}", self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_css()
    }
}
