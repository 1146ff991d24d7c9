use crate::domain::market_data::Timestamp;
use chrono::DateTime;

/// Format a bar time for the crosshair label according to bar width.
///
/// - `candle_width >= 20.0` -> `YYYY-MM-DD`
/// - `6.0 <= candle_width < 20.0` -> `DD.MM`
/// - `candle_width < 6.0` -> `MM.YYYY`
pub fn format_time_label(timestamp: Timestamp, candle_width: f64) -> String {
    let Some(date) = i64::try_from(timestamp.value()).ok().and_then(DateTime::from_timestamp_millis) else {
        return timestamp.value().to_string();
    };
    if candle_width >= 20.0 {
        date.format("%Y-%m-%d").to_string()
    } else if candle_width >= 6.0 {
        date.format("%d.%m").to_string()
    } else {
        date.format("%m.%Y").to_string()
    }
}
