use quickcheck_macros::quickcheck;
use stock_viewport::domain::market_data::Timestamp;
use stock_viewport::{DataRange, ViewportStateManager, ZoomLimits};

fn manager_with(len: u64) -> ViewportStateManager<Timestamp> {
    let mut m = ViewportStateManager::with_geometry(10.0, 100.0, ZoomLimits::DEFAULT);
    m.set_data((0..len).map(Timestamp::from_millis).collect());
    m
}

#[test]
fn doubling_halves_the_window() {
    let mut m = manager_with(10);
    m.perform_zoom(42.0, 2.0, 2.0, 50.0);
    let vp = m.viewport();
    assert_eq!(vp.candle_width, 20.0);
    assert_eq!(vp.visible_count, 5);
    assert_eq!(vp.data_range, Some(DataRange { start: 5, end: 9 }));
    assert_eq!(vp.right_offset, 0.0);
}

#[test]
fn focus_point_does_not_move_the_anchor() {
    let mut left = manager_with(40);
    let mut right = manager_with(40);
    left.perform_zoom(0.0, 1.5, 2.0, 50.0);
    right.perform_zoom(99.0, 1.5, 2.0, 50.0);
    assert_eq!(left.viewport(), right.viewport());
}

#[test]
fn zoom_resets_pan() {
    let mut m = manager_with(40);
    m.handle_pan(-50.0);
    m.perform_zoom(10.0, 1.0, 2.0, 50.0);
    assert_eq!(m.viewport().right_offset, 0.0);
    assert_eq!(m.viewport().data_range.map(|r| r.end), Some(39));
}

#[test]
fn zoom_stops_at_limits() {
    let mut m = manager_with(10);
    m.perform_zoom(0.0, 100.0, 2.0, 50.0);
    assert_eq!(m.candle_width(), 50.0);
    assert_eq!(m.viewport().data_range, Some(DataRange { start: 8, end: 9 }));
    m.perform_zoom(0.0, 0.0001, 2.0, 50.0);
    assert_eq!(m.candle_width(), 2.0);
    assert_eq!(m.viewport().data_range, Some(DataRange { start: 0, end: 9 }));
}

#[test]
fn default_limits_come_from_construction() {
    let mut m = ViewportStateManager::<Timestamp>::with_geometry(10.0, 100.0, ZoomLimits { min: 5.0, max: 12.0 });
    m.set_data((0..10).map(Timestamp::from_millis).collect());
    m.perform_zoom_default(0.0, 4.0);
    assert_eq!(m.candle_width(), 12.0);
    m.perform_zoom_default(0.0, 0.1);
    assert_eq!(m.candle_width(), 5.0);
}

#[quickcheck]
fn candle_width_stays_within_limits(scale: f64, min: f64, max: f64) -> bool {
    let mut m = manager_with(30);
    m.perform_zoom(0.0, scale, min, max);
    let limits = ZoomLimits::sanitized(min, max);
    let width = m.candle_width();
    width >= limits.min && width <= limits.max
}

#[quickcheck]
fn repeated_zoom_keeps_right_edge(scales: Vec<f64>) -> bool {
    let mut m = manager_with(120);
    scales.iter().all(|&s| {
        m.perform_zoom(0.0, s, 2.0, 50.0);
        let vp = m.viewport();
        vp.right_offset == 0.0 && vp.data_range.map(|r| r.end) == Some(119)
    })
}
