#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Promise, Reflect};
use stock_viewport::presentation::ChartViewportApi;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

fn body(days: u32) -> String {
    let candles: Vec<String> = (1..=days)
        .map(|d| format!(r#"{{"time":"2024-01-{d:02}","open":1,"high":2,"low":0.5,"close":1.5}}"#))
        .collect();
    format!(r#"{{"symbol":"AAPL","candles":[{}],"ma":[]}}"#, candles.join(","))
}

fn loaded_api() -> ChartViewportApi {
    let mut api = ChartViewportApi::with_config(r#"{"initialCandleWidth":10,"containerWidth":100}"#).unwrap();
    let handle = api.begin_load("aapl".into()).unwrap();
    assert!(api.complete_load(&handle, &body(20)).unwrap());
    api
}

fn global(name: &str) -> JsValue {
    Reflect::get(&js_sys::global(), &JsValue::from_str(name)).unwrap()
}

/// Let queued callbacks run.
async fn settle() {
    for _ in 0..3 {
        JsFuture::from(Promise::resolve(&JsValue::NULL)).await.unwrap();
    }
}

#[wasm_bindgen_test]
async fn callbacks_receive_json_payloads() {
    let mut api = loaded_api();
    let sub = api.subscribe("crosshair:move", Function::new_with_args("p", "globalThis.__crosshair = p;")).unwrap();

    assert!(api.set_crosshair_index(3.0, "main".into()));
    settle().await;

    assert_eq!(
        global("__crosshair").as_string().unwrap(),
        r#"{"index":3,"timestamp":1704326400000,"source":"main"}"#
    );
    assert_eq!(api.crosshair_label().as_deref(), Some("04.01"));

    assert!(api.unsubscribe(sub));
    assert!(!api.unsubscribe(sub));
}

#[wasm_bindgen_test]
async fn callbacks_can_read_the_getters() {
    let api = JsValue::from(loaded_api());
    Reflect::set(&js_sys::global(), &JsValue::from_str("__api"), &api).unwrap();

    let script = Function::new_no_args(
        "const api = globalThis.__api;
         api.subscribe('viewport:pan', () => {
             globalThis.__bars = JSON.parse(api.visibleBars()).length;
             globalThis.__offset = JSON.parse(api.viewport()).rightOffset;
         });
         api.handlePan(-35);
         globalThis.__barsDuringPan = globalThis.__bars;",
    );
    script.call0(&JsValue::NULL).unwrap();
    settle().await;

    assert!(global("__barsDuringPan").is_undefined());
    assert_eq!(global("__bars").as_f64(), Some(17.0));
    assert_eq!(global("__offset").as_f64(), Some(-35.0));
}

#[wasm_bindgen_test]
async fn throwing_callback_does_not_block_the_next() {
    let mut api = loaded_api();
    api.subscribe("viewport:pan", Function::new_no_args("throw new Error('detached');")).unwrap();
    api.subscribe("viewport:pan", Function::new_with_args("p", "globalThis.__pan = p;")).unwrap();

    api.handle_pan(-35.0);
    settle().await;

    let pan = global("__pan").as_string().unwrap();
    assert!(pan.contains(r#""rightOffset":-35.0"#), "{pan}");
}

#[wasm_bindgen_test]
async fn unsubscribing_drops_queued_deliveries() {
    let mut api = loaded_api();
    let sub = api
        .subscribe("viewport:zoom", Function::new_no_args("globalThis.__zoomed = true;"))
        .unwrap();

    api.perform_zoom(0.0, 2.0, None, None);
    assert!(api.unsubscribe(sub));
    settle().await;

    assert!(global("__zoomed").is_undefined());
}

#[wasm_bindgen_test]
fn rejects_unknown_events_and_fractional_indices() {
    let mut api = ChartViewportApi::new();
    assert!(api.subscribe("crosshair:hover", Function::new_no_args("")).is_err());
    assert!(!api.set_crosshair_index(1.5, "main".into()));
    assert!(!api.set_crosshair_index(f64::NAN, "main".into()));
}

#[wasm_bindgen_test]
fn superseded_load_reports_false() {
    let mut api = ChartViewportApi::new();
    let old = api.begin_load("AAPL".into()).unwrap();
    let new = api.begin_load("MSFT".into()).unwrap();
    assert_eq!(new.symbol(), "MSFT");
    assert!(!api.complete_load(&old, &body(3)).unwrap());
    assert!(api.is_loading());
}
