//! Redis pub/sub convenience layer.
//!
//! Fire-and-forget channel publishing and a subscription handle drained one
//! message at a time. Redis pub/sub has no delivery guarantee: a message
//! published while no subscriber is listening is dropped.
//!
//! The two roles share nothing but [`RedisConfig`](crate::config::RedisConfig);
//! each opens its own connection.

pub mod publisher;
pub mod subscriber;

pub use publisher::Publisher;
pub use subscriber::{Channels, Subscriber};

/// In-band payload that tells a subscriber to unsubscribe and stop.
///
/// A cooperative shutdown signal sharing the channel namespace with data
/// messages; see [`Subscriber::recv`]. Callers that cannot tolerate the
/// collision risk use the cancellation token instead.
pub const KILL_SENTINEL: &str = "KILL";
