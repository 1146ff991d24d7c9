use super::value_objects::{CrosshairState, DataRange, ViewportState, ZoomLimits};
use crate::domain::errors::SubscriberError;
use crate::domain::events::{ChartEvent, CrosshairMove, DeliveryReport, EventBus, EventKind, SubscriptionId};
use crate::domain::logging::{LogComponent, get_time_provider};
use crate::domain::market_data::{Bar, TimeKeyed, Timestamp};

/// Stand-in for non-positive or non-finite container and bar widths, in pixels.
pub const MIN_GEOMETRY_PX: f64 = 1.0;
pub const DEFAULT_CANDLE_WIDTH: f64 = 8.0;
pub const DEFAULT_CONTAINER_WIDTH: f64 = 800.0;

/// Snapshot of everything the manager owns except the bars themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub crosshair: CrosshairState,
    pub viewport: ViewportState,
    pub container_width: f64,
    pub data_len: usize,
}

/// Owns the bar series, the visible window and the shared crosshair.
///
/// The most recent bar stays flush with the right edge of the container
/// unless the user has panned left. Every mutating call computes the new
/// state in full, stores it, and only then notifies subscribers, so a handler
/// always sees consistent post-mutation state.
///
/// Instances are owned by the host; create one per chart.
#[derive(Debug)]
pub struct ViewportStateManager<B: TimeKeyed = Bar> {
    series: Vec<B>,
    container_width: f64,
    zoom_limits: ZoomLimits,
    viewport: ViewportState,
    crosshair: CrosshairState,
    bus: EventBus,
}

impl<B: TimeKeyed> Default for ViewportStateManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: TimeKeyed> ViewportStateManager<B> {
    pub fn new() -> Self {
        Self::with_geometry(DEFAULT_CANDLE_WIDTH, DEFAULT_CONTAINER_WIDTH, ZoomLimits::DEFAULT)
    }

    pub fn with_geometry(candle_width: f64, container_width: f64, zoom_limits: ZoomLimits) -> Self {
        let zoom_limits = ZoomLimits::sanitized(zoom_limits.min, zoom_limits.max);
        Self {
            series: Vec::new(),
            container_width: sanitize_width(container_width),
            zoom_limits,
            viewport: ViewportState::new(sanitize_width(candle_width)),
            crosshair: CrosshairState::default(),
            bus: EventBus::new(),
        }
    }

    // ---- mutations -------------------------------------------------------

    /// Replace the whole series and re-anchor the window to the last bar.
    pub fn set_data(&mut self, series: Vec<B>) {
        self.series = series;
        crate::log_debug!(LogComponent::Domain("Viewport"), "series replaced: {} bars", self.series.len());

        let stale = self.crosshair.index.is_some_and(|i| i >= self.series.len());
        if stale {
            self.crosshair = CrosshairState::default();
            self.broadcast(ChartEvent::CrosshairClear);
        }
        self.enforce_right_alignment();
    }

    pub fn set_container_width(&mut self, width: f64) {
        self.container_width = sanitize_width(width);
        self.enforce_right_alignment();
    }

    /// Baseline window: last bar at the right edge, no pan. Idempotent.
    pub fn enforce_right_alignment(&mut self) {
        self.viewport = self.right_aligned(self.viewport.candle_width);
        crate::log_trace!(
            LogComponent::Domain("Viewport"),
            "aligned: {:?} ({} visible)",
            self.viewport.data_range,
            self.viewport.visible_count
        );
        self.broadcast(ChartEvent::ViewportAlign(self.viewport.clone()));
    }

    /// Rescale bar width by `scale_factor`, clamped to `[min_width, max_width]`.
    ///
    /// Zoom is anchored to the right edge: `_focus_x` is accepted for parity
    /// with pointer gestures but does not move the anchor, and any pan is
    /// discarded.
    pub fn perform_zoom(&mut self, _focus_x: f64, scale_factor: f64, min_width: f64, max_width: f64) {
        let limits = ZoomLimits::sanitized(min_width, max_width);
        let current = self.viewport.candle_width;
        let scaled = if scale_factor.is_finite() && scale_factor > 0.0 {
            current * scale_factor
        } else {
            current
        };
        self.viewport = self.right_aligned(limits.clamp(scaled));
        crate::log_trace!(
            LogComponent::Domain("Viewport"),
            "zoom x{}: candle width {} -> {}",
            scale_factor,
            current,
            self.viewport.candle_width
        );
        self.broadcast(ChartEvent::ViewportZoom(self.viewport.clone()));
    }

    /// [`perform_zoom`](Self::perform_zoom) with the limits this manager was built with.
    pub fn perform_zoom_default(&mut self, focus_x: f64, scale_factor: f64) {
        let ZoomLimits { min, max } = self.zoom_limits;
        self.perform_zoom(focus_x, scale_factor, min, max);
    }

    /// Shift the window by `delta_x` pixels. Negative deltas reveal history.
    ///
    /// The offset is clamped to `<= 0` first and then to the left limit
    /// `container_width - len * candle_width`. When every bar already fits the
    /// left limit is positive, so the offset is held at `0` and panning does
    /// nothing.
    pub fn handle_pan(&mut self, delta_x: f64) {
        let delta = if delta_x.is_finite() { delta_x } else { 0.0 };
        let len = self.series.len();
        let candle_width = self.viewport.candle_width;

        let clamped = (self.viewport.right_offset + delta).min(0.0);
        let max_left = (self.container_width - len as f64 * candle_width).min(0.0);
        let right_offset = clamped.max(max_left);
        // keep +0.0 so snapshots never show "-0.0"
        let right_offset = if right_offset == 0.0 { 0.0 } else { right_offset };

        let data_range = len.checked_sub(1).map(|end| {
            let start = (-right_offset / candle_width).floor().max(0.0) as usize;
            DataRange { start: start.min(end), end }
        });

        self.viewport = ViewportState {
            candle_width,
            visible_count: data_range.map_or(0, |r| r.len()),
            right_offset,
            data_range,
        };
        self.broadcast(ChartEvent::ViewportPan(self.viewport.clone()));
    }

    /// Point the shared cursor at `index`. Out-of-range requests are ignored
    /// without notifying anyone; returns whether the cursor moved.
    pub fn set_crosshair_index(&mut self, index: i64, source: impl Into<String>) -> bool {
        let Some(bar) = usize::try_from(index).ok().and_then(|i| self.series.get(i)) else {
            return false;
        };
        let index = index as usize;
        let timestamp = bar
            .timestamp()
            .unwrap_or_else(|| Timestamp::from_millis(get_time_provider().current_timestamp()));
        let source = source.into();

        self.crosshair = CrosshairState {
            index: Some(index),
            timestamp: Some(timestamp),
            source: Some(source.clone()),
            is_locked: true,
        };
        self.broadcast(ChartEvent::CrosshairMove(CrosshairMove { index, timestamp, source }));
        true
    }

    pub fn clear_crosshair(&mut self) {
        self.crosshair = CrosshairState::default();
        self.broadcast(ChartEvent::CrosshairClear);
    }

    // ---- coordinates -----------------------------------------------------

    /// Center of bar `index`, measured from the container's left edge.
    pub fn index_to_x(&self, index: usize) -> f64 {
        let candle_width = self.viewport.candle_width;
        let bars_to_right = self.series.len() as f64 - 1.0 - index as f64;
        self.container_width - bars_to_right * candle_width - candle_width / 2.0
            + self.viewport.right_offset
    }

    /// Nearest bar under `x`, clamped into the series. `None` when there is nothing to point at.
    pub fn x_to_index(&self, x: f64) -> Option<usize> {
        let last = self.series.len().checked_sub(1)?;
        if x.is_nan() {
            return None;
        }
        let candle_width = self.viewport.candle_width;
        let bars_to_right =
            (self.container_width - candle_width / 2.0 + self.viewport.right_offset - x) / candle_width;
        let index = (last as f64 - bars_to_right).round();
        Some(index.clamp(0.0, last as f64) as usize)
    }

    // ---- events ----------------------------------------------------------

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ChartEvent) -> Result<(), SubscriberError> + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn broadcast(&mut self, event: ChartEvent) -> DeliveryReport {
        let report = self.bus.publish(&event);
        if report.failed > 0 {
            crate::log_debug!(
                LogComponent::Domain("Viewport"),
                "{}: {} delivered, {} failed",
                event.kind(),
                report.delivered,
                report.failed
            );
        }
        report
    }

    // ---- accessors -------------------------------------------------------

    pub fn state(&self) -> ChartState {
        ChartState {
            crosshair: self.crosshair.clone(),
            viewport: self.viewport.clone(),
            container_width: self.container_width,
            data_len: self.series.len(),
        }
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.clone()
    }

    pub fn crosshair(&self) -> CrosshairState {
        self.crosshair.clone()
    }

    pub fn crosshair_index(&self) -> Option<usize> {
        self.crosshair.index
    }

    /// Bars in `data_range`, inclusive on both ends.
    pub fn visible_data(&self) -> &[B] {
        match self.viewport.data_range {
            Some(DataRange { start, end }) => &self.series[start..=end],
            None => &[],
        }
    }

    pub fn bar(&self, index: usize) -> Option<&B> {
        self.series.get(index)
    }

    pub fn data(&self) -> &[B] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn candle_width(&self) -> f64 {
        self.viewport.candle_width
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        self.zoom_limits
    }

    // ---- internals -------------------------------------------------------

    fn right_aligned(&self, candle_width: f64) -> ViewportState {
        let candle_width = sanitize_width(candle_width);
        let len = self.series.len();
        if len == 0 {
            return ViewportState::new(candle_width);
        }

        // at least one bar stays visible in a container narrower than a bar
        let max_visible = (self.container_width / candle_width).floor().max(1.0) as usize;
        let end = len - 1;
        let start = len.saturating_sub(max_visible);
        ViewportState {
            candle_width,
            visible_count: end - start + 1,
            right_offset: 0.0,
            data_range: Some(DataRange { start, end }),
        }
    }
}

fn sanitize_width(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 { width } else { MIN_GEOMETRY_PX }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(len: u64) -> ViewportStateManager<Timestamp> {
        let mut m = ViewportStateManager::with_geometry(10.0, 100.0, ZoomLimits::DEFAULT);
        m.set_data((0..len).map(Timestamp::from_millis).collect());
        m
    }

    #[test]
    fn malformed_geometry_is_clamped() {
        let mut m = manager(3);
        m.set_container_width(-20.0);
        assert_eq!(m.container_width(), MIN_GEOMETRY_PX);
        m.set_container_width(f64::NAN);
        assert_eq!(m.container_width(), MIN_GEOMETRY_PX);
        // one bar survives a container narrower than a bar
        assert_eq!(m.viewport().data_range, Some(DataRange { start: 2, end: 2 }));
    }

    #[test]
    fn stale_crosshair_is_dropped_on_shorter_series() {
        let mut m = manager(10);
        assert!(m.set_crosshair_index(8, "main"));
        m.set_data((0..5).map(Timestamp::from_millis).collect());
        assert_eq!(m.crosshair_index(), None);

        assert!(m.set_crosshair_index(4, "main"));
        m.set_data((0..5).map(Timestamp::from_millis).collect());
        assert_eq!(m.crosshair_index(), Some(4));
    }

    #[test]
    fn x_to_index_rejects_nan_and_empty() {
        let m = manager(10);
        assert_eq!(m.x_to_index(f64::NAN), None);
        assert_eq!(m.x_to_index(f64::INFINITY), Some(9));
        assert_eq!(m.x_to_index(f64::NEG_INFINITY), Some(0));
        assert_eq!(manager(0).x_to_index(50.0), None);
    }
}
