//! Fire-and-forget channel publisher.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, instrument};

use crate::config::RedisConfig;
use crate::error::Result;

/// Publishes messages to named channels.
pub struct Publisher {
    conn: MultiplexedConnection,
}

impl Publisher {
    /// Open a connection to the configured store.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())?;
        let conn = client.get_multiplexed_async_connection().await?;

        info!(host = %config.host, port = config.port, "connected to Redis");

        Ok(Self { conn })
    }

    /// Publish `payload` on `channel`.
    ///
    /// No acknowledgment and no persistence; subscribers not currently
    /// listening never see the message.
    #[instrument(skip(self, payload))]
    pub async fn publish(&mut self, channel: &str, payload: &str) -> Result<()> {
        let receivers: i64 = self.conn.publish(channel, payload).await?;
        debug!(channel = %channel, receivers, "message published");
        Ok(())
    }
}
