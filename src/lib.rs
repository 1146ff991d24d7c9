//! Viewport and crosshair state for candlestick charts.
//!
//! [`ViewportStateManager`] maps an append-only series of bars onto a pixel
//! window, keeps the newest bar flush with the right edge through zoom and
//! pan, and fans crosshair and viewport changes out to every subscribed pane.
//! Fetching, indicator math and drawing belong to the host.

use wasm_bindgen::prelude::*;

use crate::domain::logging::{LogComponent, get_logger};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod time_utils;

pub use application::{ChartConfig, ChartSession, LoadOutcome, LoadTicket};
pub use domain::chart::{ChartState, CrosshairState, DataRange, ViewportState, ViewportStateManager, ZoomLimits};
pub use domain::errors::{ChartError, ChartResult, SubscriberError};
pub use domain::events::{ChartEvent, CrosshairMove, DeliveryReport, EventBus, EventKind, SubscriptionId};
pub use domain::market_data::{Bar, TimeKeyed, Timestamp};

/// Install the browser logger and panic hook.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();
    domain::logging::init_logger(Box::new(infrastructure::ConsoleLogger::new_development()));

    get_logger().info(LogComponent::Presentation("Initialize"), "viewport module ready");
}
