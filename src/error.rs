//! Error types for the taskbus client library.
//!
//! Broker protocol errors (failed declares, permission errors, connection
//! refusals) propagate unmodified from the underlying client libraries via
//! `#[from]` conversions. The only errors raised by this crate itself are
//! the two shape-validation failures, both reported before any network call
//! is made.

use thiserror::Error;

/// Errors returned by the AMQP and key/value client layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding keys were neither a single routing key nor an ordered list
    /// of routing keys.
    #[error("binding keys must be a routing key or an ordered list of routing keys, got {0}")]
    UnsupportedBindingKeys(&'static str),

    /// The channel argument was not an ordered sequence of channel names.
    #[error("channels must be an ordered sequence of channel names, got {0}")]
    ChannelsNotASequence(&'static str),

    /// Any error surfaced by the AMQP client library.
    #[error(transparent)]
    Amqp(#[from] lapin::Error),

    /// Any error surfaced by the Redis client library.
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Human-readable name of a JSON value's shape, used in validation errors.
pub(crate) fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
