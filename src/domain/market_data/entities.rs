use super::value_objects::{OHLCV, Timestamp};
use serde::{Deserialize, Serialize};

/// Anything the viewport can lay out along the time axis.
///
/// The viewport never looks at prices; it only needs to know when a sample
/// happened, and tolerates samples that do not carry a time at all.
pub trait TimeKeyed: Clone {
    fn timestamp(&self) -> Option<Timestamp>;
}

/// Domain entity - one daily bar of the price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: Option<Timestamp>,
    pub ohlcv: OHLCV,
}

impl Bar {
    pub fn new(time: Timestamp, ohlcv: OHLCV) -> Self {
        Self { time: Some(time), ohlcv }
    }

    /// Bar whose payload lacks a time key.
    pub fn untimed(ohlcv: OHLCV) -> Self {
        Self { time: None, ohlcv }
    }
}

impl TimeKeyed for Bar {
    fn timestamp(&self) -> Option<Timestamp> {
        self.time
    }
}

impl TimeKeyed for Timestamp {
    fn timestamp(&self) -> Option<Timestamp> {
        Some(*self)
    }
}
