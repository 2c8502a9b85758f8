//! AMQP connection handle.

use lapin::options::BasicAckOptions;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::info;

use crate::amqp::topology::{self, BindingKeys};
use crate::config::AmqpConfig;
use crate::error::Result;

/// An open AMQP connection plus the single channel all operations run on.
///
/// Opened with one connection attempt and no retry; an unreachable broker or
/// rejected credentials propagate the `lapin` error to the caller. The
/// handle is passed by value to [`Publisher`](crate::amqp::Publisher) or
/// [`Subscriber`](crate::amqp::Subscriber) at construction time and lives
/// until [`close`](AmqpConnection::close) or process exit.
pub struct AmqpConnection {
    connection: Connection,
    channel: Channel,
}

impl AmqpConnection {
    /// Open a connection and channel to the configured broker.
    pub async fn connect(config: &AmqpConfig) -> Result<Self> {
        let connection =
            Connection::connect(&config.uri(), ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        info!(host = %config.host, port = config.port, "connected to AMQP broker");

        Ok(Self { connection, channel })
    }

    /// The channel used for declares, binds, publishes, and consumes.
    pub(crate) fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Declare an exchange. Idempotent for a given name and kind.
    pub async fn declare_exchange(&self, exchange: &str, kind: ExchangeKind) -> Result<()> {
        topology::declare_exchange(&self.channel, exchange, kind).await
    }

    /// Declare a queue and return its resolved name.
    ///
    /// See [`Subscriber::subscribe`](crate::amqp::Subscriber::subscribe) for
    /// the meaning of `used_for_log`. Pass an empty `queue` to receive a
    /// server-assigned name.
    pub async fn declare_queue(&self, queue: &str, used_for_log: bool) -> Result<String> {
        topology::declare_queue(&self.channel, queue, used_for_log).await
    }

    /// Declare a queue and bind it to `exchange`, once per binding key.
    /// Returns the resolved queue name.
    pub async fn bind_queue(
        &self,
        queue: &str,
        used_for_log: bool,
        exchange: &str,
        binding_keys: &BindingKeys,
    ) -> Result<String> {
        topology::bind_queue(&self.channel, queue, used_for_log, exchange, binding_keys).await
    }

    /// Acknowledge a delivery by tag.
    ///
    /// Must be called exactly once per delivered message; the broker holds
    /// the message for redelivery until then, and with prefetch 1 it also
    /// withholds the next delivery.
    pub async fn acknowledge(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.connection.close(200, "closed by client").await?;
        Ok(())
    }
}
