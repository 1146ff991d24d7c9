use crate::domain::chart::ViewportState;
use crate::domain::errors::SubscriberError;
use crate::domain::logging::{LogComponent, LogLevel, get_logger};
use crate::domain::market_data::Timestamp;
use derive_more::Display;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

/// Event names as seen by host views.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum EventKind {
    #[strum(serialize = "crosshair:move")]
    CrosshairMove,
    #[strum(serialize = "crosshair:clear")]
    CrosshairClear,
    #[strum(serialize = "viewport:align")]
    ViewportAlign,
    #[strum(serialize = "viewport:zoom")]
    ViewportZoom,
    #[strum(serialize = "viewport:pan")]
    ViewportPan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosshairMove {
    pub index: usize,
    pub timestamp: Timestamp,
    pub source: String,
}

/// Events broadcast by the viewport manager, each with its own payload.
///
/// Viewport events carry the post-mutation state so handlers never need to
/// reach back into the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    CrosshairMove(CrosshairMove),
    CrosshairClear,
    ViewportAlign(ViewportState),
    ViewportZoom(ViewportState),
    ViewportPan(ViewportState),
}

impl ChartEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChartEvent::CrosshairMove(_) => EventKind::CrosshairMove,
            ChartEvent::CrosshairClear => EventKind::CrosshairClear,
            ChartEvent::ViewportAlign(_) => EventKind::ViewportAlign,
            ChartEvent::ViewportZoom(_) => EventKind::ViewportZoom,
            ChartEvent::ViewportPan(_) => EventKind::ViewportPan,
        }
    }

    pub fn viewport(&self) -> Option<&ViewportState> {
        match self {
            ChartEvent::ViewportAlign(v) | ChartEvent::ViewportZoom(v) | ChartEvent::ViewportPan(v) => {
                Some(v)
            }
            _ => None,
        }
    }

    /// Payload as JSON, for hosts outside Rust.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        match self {
            ChartEvent::CrosshairMove(m) => serde_json::to_string(m),
            ChartEvent::CrosshairClear => Ok("null".to_string()),
            ChartEvent::ViewportAlign(v) | ChartEvent::ViewportZoom(v) | ChartEvent::ViewportPan(v) => {
                serde_json::to_string(v)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "#{}", _0)]
pub struct SubscriptionId(u64);

pub type EventHandler = Box<dyn FnMut(&ChartEvent) -> Result<(), SubscriberError>>;

struct Subscription {
    id: SubscriptionId,
    handler: EventHandler,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// In-process fan-out keyed by [`EventKind`].
///
/// Handlers for a kind run in registration order. Every delivery is isolated:
/// an `Err` or a panic from one handler is logged and the next one still runs.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Subscription>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&ChartEvent) -> Result<(), SubscriberError> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.handlers.entry(kind).or_default().push(Subscription { id, handler: Box::new(handler) });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subs in self.handlers.values_mut() {
            if let Some(idx) = subs.iter().position(|s| s.id == id) {
                subs.remove(idx);
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn publish(&mut self, event: &ChartEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let kind = event.kind();
        let Some(subs) = self.handlers.get_mut(&kind) else {
            return report;
        };

        for sub in subs.iter_mut() {
            let handler = &mut sub.handler;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    get_logger().log_with_metadata(
                        LogLevel::Warn,
                        LogComponent::Domain("EventBus"),
                        &format!("subscriber {} failed: {}", sub.id, err),
                        kind.as_ref(),
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    get_logger().log_with_metadata(
                        LogLevel::Error,
                        LogComponent::Domain("EventBus"),
                        &format!("subscriber {} panicked: {}", sub.id, panic_message(&*payload)),
                        kind.as_ref(),
                    );
                }
            }
        }
        report
    }
}

impl Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> =
            self.handlers.iter().map(|(k, v)| (k.as_ref(), v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kinds_use_colon_names() {
        let names: Vec<String> = EventKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            ["crosshair:move", "crosshair:clear", "viewport:align", "viewport:zoom", "viewport:pan"]
        );
        assert_eq!(EventKind::from_str("viewport:pan").unwrap(), EventKind::ViewportPan);
        assert!(EventKind::from_str("viewport:scroll").is_err());
    }

    #[test]
    fn delivery_follows_registration_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            bus.subscribe(EventKind::CrosshairClear, move |_| {
                seen.borrow_mut().push(tag);
                Ok(())
            });
        }
        let report = bus.publish(&ChartEvent::CrosshairClear);
        assert_eq!(report, DeliveryReport { delivered: 3, failed: 0 });
        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn other_kinds_are_not_notified() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.subscribe(EventKind::ViewportPan, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        bus.publish(&ChartEvent::CrosshairClear);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let mut bus = EventBus::new();
        let a = bus.subscribe(EventKind::CrosshairClear, |_| Ok(()));
        bus.subscribe(EventKind::CrosshairClear, |_| Ok(()));
        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        assert_eq!(bus.subscriber_count(EventKind::CrosshairClear), 1);
    }

    #[test]
    fn clear_has_a_null_payload() {
        assert_eq!(ChartEvent::CrosshairClear.kind(), EventKind::CrosshairClear);
        assert_eq!(ChartEvent::CrosshairClear.payload_json().unwrap(), "null");
    }
}
