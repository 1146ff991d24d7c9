use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use js_sys::Function;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::application::{ChartConfig, ChartSession, LoadOutcome, LoadTicket};
use crate::domain::errors::ChartError;
use crate::domain::events::{EventKind, SubscriptionId};
use crate::domain::logging::{LogComponent, LogLevel, get_logger};
use crate::domain::market_data::Symbol;
use crate::time_utils::format_time_label;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A fetch started by the host; pass it back to `completeLoad`.
#[wasm_bindgen]
pub struct LoadHandle {
    ticket: LoadTicket,
}

#[wasm_bindgen]
impl LoadHandle {
    #[wasm_bindgen(getter)]
    pub fn symbol(&self) -> String {
        self.ticket.symbol().value().to_string()
    }
}

/// Viewport and crosshair state for one chart pane, driven from JavaScript.
///
/// Gesture handlers call the mutating methods; panes subscribe to
/// `crosshair:*` / `viewport:*` and receive the payload as a JSON string.
#[wasm_bindgen]
pub struct ChartViewportApi {
    session: ChartSession,
    subscriptions: HashMap<u32, JsSubscription>,
    next_handle: u32,
}

struct JsSubscription {
    id: SubscriptionId,
    active: Rc<Cell<bool>>,
}

#[wasm_bindgen]
impl ChartViewportApi {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ChartViewportApi {
        Self::from_config(ChartConfig::default())
    }

    /// Build from a JSON `ChartConfig`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<ChartViewportApi, JsValue> {
        ChartConfig::from_json(json).map(Self::from_config).map_err(to_js)
    }

    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self, symbol: String) -> Result<LoadHandle, JsValue> {
        let symbol = Symbol::new(symbol).map_err(|e| to_js(ChartError::Payload(e)))?;
        Ok(LoadHandle { ticket: self.session.begin_load(symbol) })
    }

    /// Apply a `/api/stock/{symbol}` response. Returns `false` when a newer load superseded it.
    #[wasm_bindgen(js_name = completeLoad)]
    pub fn complete_load(&mut self, handle: &LoadHandle, json: &str) -> Result<bool, JsValue> {
        match self.session.complete_load_json(&handle.ticket, json).map_err(to_js)? {
            LoadOutcome::Applied { .. } => Ok(true),
            LoadOutcome::Superseded => Ok(false),
        }
    }

    #[wasm_bindgen(js_name = failLoad)]
    pub fn fail_load(&mut self, handle: &LoadHandle, reason: &str) {
        self.session.fail_load(&handle.ticket, reason);
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    #[wasm_bindgen(js_name = setContainerWidth)]
    pub fn set_container_width(&mut self, width: f64) {
        self.session.manager_mut().set_container_width(width);
    }

    /// Zoom with the configured limits unless both bounds are given.
    #[wasm_bindgen(js_name = performZoom)]
    pub fn perform_zoom(&mut self, focus_x: f64, scale_factor: f64, min_width: Option<f64>, max_width: Option<f64>) {
        let manager = self.session.manager_mut();
        match (min_width, max_width) {
            (Some(min), Some(max)) => manager.perform_zoom(focus_x, scale_factor, min, max),
            _ => manager.perform_zoom_default(focus_x, scale_factor),
        }
    }

    #[wasm_bindgen(js_name = handlePan)]
    pub fn handle_pan(&mut self, delta_x: f64) {
        self.session.manager_mut().handle_pan(delta_x);
    }

    #[wasm_bindgen(js_name = enforceRightAlignment)]
    pub fn enforce_right_alignment(&mut self) {
        self.session.manager_mut().enforce_right_alignment();
    }

    /// Non-integral or out-of-range indices are ignored.
    #[wasm_bindgen(js_name = setCrosshairIndex)]
    pub fn set_crosshair_index(&mut self, index: f64, source: String) -> bool {
        if !index.is_finite() || index.fract() != 0.0 {
            return false;
        }
        self.session.manager_mut().set_crosshair_index(index as i64, source)
    }

    #[wasm_bindgen(js_name = clearCrosshair)]
    pub fn clear_crosshair(&mut self) {
        self.session.manager_mut().clear_crosshair();
    }

    #[wasm_bindgen(js_name = crosshairIndex)]
    pub fn crosshair_index(&self) -> Option<u32> {
        self.session.manager().crosshair_index().map(|i| i as u32)
    }

    #[wasm_bindgen(js_name = crosshairLabel)]
    pub fn crosshair_label(&self) -> Option<String> {
        let manager = self.session.manager();
        manager
            .crosshair()
            .timestamp
            .map(|ts| format_time_label(ts, manager.candle_width()))
    }

    #[wasm_bindgen(js_name = indexToX)]
    pub fn index_to_x(&self, index: u32) -> f64 {
        self.session.manager().index_to_x(index as usize)
    }

    #[wasm_bindgen(js_name = xToIndex)]
    pub fn x_to_index(&self, x: f64) -> Option<u32> {
        self.session.manager().x_to_index(x).map(|i| i as u32)
    }

    /// `ViewportState` as JSON.
    pub fn viewport(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.manager().viewport()).map_err(to_js)
    }

    /// `CrosshairState` as JSON.
    pub fn crosshair(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.manager().crosshair()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = visibleBars)]
    pub fn visible_bars(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.manager().visible_data()).map_err(to_js)
    }

    /// Register `callback` for `event` (e.g. `"crosshair:move"`); returns a handle for `unsubscribe`.
    ///
    /// Callbacks run in a microtask once the call that raised the event has
    /// returned, so they may read this object's getters. Order follows
    /// registration. A callback that throws is logged and does not affect
    /// other callbacks.
    pub fn subscribe(&mut self, event: &str, callback: Function) -> Result<u32, JsValue> {
        let kind = EventKind::from_str(event)
            .map_err(|_| to_js(ChartError::Subscriber(format!("unknown event '{event}'"))))?;

        let active = Rc::new(Cell::new(true));
        let still_active = Rc::clone(&active);
        let id = self.session.manager_mut().subscribe(kind, move |ev| {
            let payload = JsValue::from_str(&ev.payload_json()?);
            let callback = callback.clone();
            let still_active = Rc::clone(&still_active);
            spawn_local(async move {
                if still_active.get() {
                    deliver(kind, &callback, &payload);
                }
            });
            Ok(())
        });

        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.subscriptions.insert(handle, JsSubscription { id, active });
        crate::log_debug!(LogComponent::Presentation("WASM"), "subscribed {} as {}", event, id);
        Ok(handle)
    }

    /// Events already queued for this callback are dropped too.
    pub fn unsubscribe(&mut self, handle: u32) -> bool {
        match self.subscriptions.remove(&handle) {
            Some(sub) => {
                sub.active.set(false);
                self.session.manager_mut().unsubscribe(sub.id)
            }
            None => false,
        }
    }
}

fn deliver(kind: EventKind, callback: &Function, payload: &JsValue) {
    if let Err(err) = callback.call1(&JsValue::NULL, payload) {
        get_logger().log_with_metadata(
            LogLevel::Warn,
            LogComponent::Presentation("WASM"),
            &format!("callback threw: {err:?}"),
            kind.into(),
        );
    }
}

impl ChartViewportApi {
    fn from_config(config: ChartConfig) -> Self {
        Self { session: ChartSession::new(config), subscriptions: HashMap::new(), next_handle: 0 }
    }

    pub fn session(&self) -> &ChartSession {
        &self.session
    }
}

impl Default for ChartViewportApi {
    fn default() -> Self {
        Self::new()
    }
}
