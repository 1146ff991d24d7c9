use derive_more::Display;

/// Errors raised at the crate's edges. The viewport manager itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ChartError {
    #[display(fmt = "Config Error: {}", _0)]
    Config(String),
    #[display(fmt = "Payload Error: {}", _0)]
    Payload(String),
    #[display(fmt = "Subscriber Error: {}", _0)]
    Subscriber(String),
}

impl std::error::Error for ChartError {}

impl From<serde_json::Error> for ChartError {
    fn from(error: serde_json::Error) -> Self {
        ChartError::Payload(error.to_string())
    }
}

/// Failure reported by an event subscriber.
pub type SubscriberError = Box<dyn std::error::Error>;

pub type ChartResult<T> = Result<T, ChartError>;
