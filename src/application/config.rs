use crate::domain::chart::{
    Color, DEFAULT_CANDLE_WIDTH, DEFAULT_CONTAINER_WIDTH, ViewportStateManager, ZoomLimits,
};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::TimeKeyed;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Style of one moving-average line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub period: u32,
    pub color: Color,
}

static DEFAULT_OVERLAYS: Lazy<Vec<OverlayStyle>> = Lazy::new(|| {
    [
        (17, 0xFF6B6B),
        (45, 0x4ECDC4),
        (117, 0xFFE66D),
        (189, 0x1A535C),
        (305, 0xFF9F1C),
        (494, 0xC2F970),
    ]
    .into_iter()
    .map(|(period, hex)| OverlayStyle { period, color: Color::from_hex(hex) })
    .collect()
});

/// Chart session settings, read from JSON with camelCase keys.
///
/// Missing keys fall back to defaults. Malformed numbers are repaired by
/// [`ChartConfig::validated`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub initial_candle_width: f64,
    pub min_candle_width: f64,
    pub max_candle_width: f64,
    pub container_width: f64,
    pub overlays: Vec<OverlayStyle>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            initial_candle_width: DEFAULT_CANDLE_WIDTH,
            min_candle_width: ZoomLimits::DEFAULT.min,
            max_candle_width: ZoomLimits::DEFAULT.max,
            container_width: DEFAULT_CONTAINER_WIDTH,
            overlays: DEFAULT_OVERLAYS.clone(),
        }
    }
}

impl ChartConfig {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        let config: ChartConfig =
            serde_json::from_str(json).map_err(|e| ChartError::Config(e.to_string()))?;
        Ok(config.validated())
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::sanitized(self.min_candle_width, self.max_candle_width)
    }

    pub fn validated(mut self) -> Self {
        let limits = self.zoom_limits();
        self.min_candle_width = limits.min;
        self.max_candle_width = limits.max;

        if !(self.initial_candle_width.is_finite() && self.initial_candle_width > 0.0) {
            crate::log_warn!(
                LogComponent::Application("Config"),
                "initialCandleWidth {} replaced by {}",
                self.initial_candle_width,
                DEFAULT_CANDLE_WIDTH
            );
            self.initial_candle_width = DEFAULT_CANDLE_WIDTH;
        }
        self.initial_candle_width = limits.clamp(self.initial_candle_width);

        if !(self.container_width.is_finite() && self.container_width > 0.0) {
            crate::log_warn!(
                LogComponent::Application("Config"),
                "containerWidth {} replaced by {}",
                self.container_width,
                DEFAULT_CONTAINER_WIDTH
            );
            self.container_width = DEFAULT_CONTAINER_WIDTH;
        }
        self
    }

    pub fn build_manager<B: TimeKeyed>(&self) -> ViewportStateManager<B> {
        ViewportStateManager::with_geometry(
            self.initial_candle_width,
            self.container_width,
            self.zoom_limits(),
        )
    }
}
