//! AMQP exchange/queue convenience layer.
//!
//! Wraps `lapin` with the small set of operations a task pipeline needs:
//! connect, declare an exchange, declare and bind a queue, publish a
//! persistent message, and consume with prefetch 1 and per-message
//! acknowledgment.
//!
//! There is no shared base service: [`Publisher`] and [`Subscriber`] are two
//! separate concrete roles, each constructed from an [`AmqpConnection`] the
//! caller opens explicitly and hands over.

pub mod connection;
pub mod publisher;
pub mod subscriber;
pub mod topology;

pub use connection::AmqpConnection;
pub use publisher::Publisher;
pub use subscriber::Subscriber;
pub use topology::BindingKeys;

pub use lapin::ExchangeKind;
