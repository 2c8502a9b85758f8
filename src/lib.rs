//! Taskbus Client Library
//!
//! Thin publish/subscribe convenience layers over two broker client
//! libraries: an AMQP broker (exchange/queue routing via `lapin`) and the
//! Redis native pub/sub channel (via `redis`).
//!
//! All routing, persistence, acknowledgment semantics, and pattern matching
//! are delegated to the broker. This crate adds no retry, no pooling, and no
//! delivery guarantees of its own. It only packages the handful of calls a
//! task pipeline needs: declare an exchange, bind a queue, publish a
//! persistent message, drain a subscription.
//!
//! The two modules are independent and structurally parallel:
//!
//! - `amqp`: exchange/queue topology, one-shot persistent publisher, and a
//!   prefetch-1 consumer with per-message acknowledgment.
//! - `kv`: fire-and-forget channel publisher and a subscription drained
//!   until cancellation or the in-band `"KILL"` sentinel.
//!
//! Callers that want concurrent publishing and subscribing run the two roles
//! on separate tasks; the handles here provide no internal locking.

pub mod amqp;
pub mod config;
pub mod error;
pub mod kv;

pub use config::{AmqpConfig, RedisConfig};
pub use error::{Error, Result};

/// Default exchange name used by task pipelines.
pub const DEFAULT_EXCHANGE: &str = "task_exchange";

/// Default queue name used by task pipelines.
pub const DEFAULT_QUEUE: &str = "task_queue";
