//! One-shot persistent message publisher.

use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, ExchangeKind};
use tracing::{info, instrument};

use crate::amqp::connection::AmqpConnection;
use crate::amqp::topology;
use crate::error::Result;

/// Publishes a single persistent message and closes its connection.
///
/// `publish` takes `self` by value: the connection is gone once the message
/// has been handed to the broker, so a publisher cannot be reused. One
/// instance per message is the intended usage.
pub struct Publisher {
    conn: AmqpConnection,
}

impl Publisher {
    /// Create a publisher over an open connection.
    pub fn new(conn: AmqpConnection) -> Self {
        Self { conn }
    }

    /// Declare the exchange, publish `payload` with the persistence flag
    /// set, then close the connection.
    ///
    /// No broker confirmation is awaited; persistence of the delivered
    /// message is the broker's responsibility. The connection is closed on
    /// the error path too, so the one-shot lifecycle holds whether or not
    /// the message was handed to the broker.
    #[instrument(skip(self, payload))]
    pub async fn publish(
        self,
        payload: &[u8],
        routing_key: &str,
        exchange: &str,
        kind: ExchangeKind,
    ) -> Result<()> {
        let sent = Self::send(&self.conn, payload, routing_key, exchange, kind).await;
        let closed = self.conn.close().await;
        sent.and(closed)
    }

    async fn send(
        conn: &AmqpConnection,
        payload: &[u8],
        routing_key: &str,
        exchange: &str,
        kind: ExchangeKind,
    ) -> Result<()> {
        topology::declare_exchange(conn.channel(), exchange, kind).await?;

        let properties = BasicProperties::default().with_delivery_mode(2); // persistent

        conn.channel()
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await?;

        info!(
            exchange = %exchange,
            routing_key = %routing_key,
            bytes = payload.len(),
            "message published"
        );

        Ok(())
    }
}
