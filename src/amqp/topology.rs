//! Exchange and queue topology helpers shared by both AMQP roles.

use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tracing::debug;

use crate::error::{json_shape, Error, Result};

/// Routing keys used to bind a queue to an exchange.
///
/// Either a single key or an ordered list of keys; every other shape is a
/// programming error. Static call sites use the `From` conversions; dynamic
/// inputs (e.g. a JSON job description) go through `TryFrom<serde_json::Value>`,
/// which rejects unsupported shapes before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKeys {
    /// One routing key.
    Single(String),
    /// An ordered list of routing keys, bound in order.
    Many(Vec<String>),
}

impl BindingKeys {
    /// The keys in binding order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            BindingKeys::Single(key) => std::slice::from_ref(key),
            BindingKeys::Many(keys) => keys,
        }
    }
}

impl From<&str> for BindingKeys {
    fn from(key: &str) -> Self {
        BindingKeys::Single(key.to_string())
    }
}

impl From<String> for BindingKeys {
    fn from(key: String) -> Self {
        BindingKeys::Single(key)
    }
}

impl From<Vec<String>> for BindingKeys {
    fn from(keys: Vec<String>) -> Self {
        BindingKeys::Many(keys)
    }
}

impl From<Vec<&str>> for BindingKeys {
    fn from(keys: Vec<&str>) -> Self {
        BindingKeys::Many(keys.into_iter().map(str::to_string).collect())
    }
}

impl TryFrom<serde_json::Value> for BindingKeys {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(key) => Ok(BindingKeys::Single(key)),
            serde_json::Value::Array(items) => {
                let mut keys = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(key) => keys.push(key),
                        other => {
                            return Err(Error::UnsupportedBindingKeys(json_shape(&other)))
                        }
                    }
                }
                Ok(BindingKeys::Many(keys))
            }
            other => Err(Error::UnsupportedBindingKeys(json_shape(&other))),
        }
    }
}

/// Declare an exchange. Idempotent: redeclaring with the same name and kind
/// is a no-op on the broker side.
pub(crate) async fn declare_exchange(
    channel: &Channel,
    exchange: &str,
    kind: ExchangeKind,
) -> Result<()> {
    channel
        .exchange_declare(
            exchange,
            kind,
            ExchangeDeclareOptions::default(),
            FieldTable::default(),
        )
        .await?;
    Ok(())
}

/// Declare a queue and return the resolved (possibly server-assigned) name.
///
/// `used_for_log == true` declares an exclusive auto-delete queue, the shape
/// wanted for per-subscriber log fanout: each consumer gets its own queue
/// and the broker drops it when the consumer disconnects. Otherwise the
/// queue is durable so persistent messages survive a broker restart.
pub(crate) async fn declare_queue(
    channel: &Channel,
    queue: &str,
    used_for_log: bool,
) -> Result<String> {
    let options = if used_for_log {
        QueueDeclareOptions {
            exclusive: true,
            auto_delete: true,
            ..QueueDeclareOptions::default()
        }
    } else {
        QueueDeclareOptions {
            durable: true,
            ..QueueDeclareOptions::default()
        }
    };

    let declared = channel
        .queue_declare(queue, options, FieldTable::default())
        .await?;

    // The broker assigns a name when the caller passed "".
    Ok(declared.name().as_str().to_string())
}

/// Declare a queue and bind it to an exchange, once per routing key.
///
/// Returns the resolved queue name. Shape validation of `binding_keys`
/// happens at conversion time, before this function is reached.
pub(crate) async fn bind_queue(
    channel: &Channel,
    queue: &str,
    used_for_log: bool,
    exchange: &str,
    binding_keys: &BindingKeys,
) -> Result<String> {
    let queue = declare_queue(channel, queue, used_for_log).await?;

    for key in binding_keys.as_slice() {
        channel
            .queue_bind(
                &queue,
                exchange,
                key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        debug!(queue = %queue, exchange = %exchange, routing_key = %key, "queue bound");
    }

    Ok(queue)
}
