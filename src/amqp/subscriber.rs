//! Blocking-style consumer with prefetch 1 and per-message acknowledgment.

use std::future::Future;

use futures::StreamExt;
use lapin::options::{BasicConsumeOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::ExchangeKind;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::amqp::connection::AmqpConnection;
use crate::amqp::topology::{self, BindingKeys};
use crate::error::Result;

/// Consumes messages from a queue bound to an exchange.
///
/// The receive loop is unbounded: it runs until the broker closes the
/// consumer or the caller's [`CancellationToken`] fires. Prefetch is fixed
/// at 1, so a slow handler is never flooded; the broker withholds the next
/// delivery until the current one is acknowledged.
pub struct Subscriber {
    conn: AmqpConnection,
}

impl Subscriber {
    /// Create a subscriber over an open connection.
    pub fn new(conn: AmqpConnection) -> Self {
        Self { conn }
    }

    /// Declare the exchange, bind `queue` to it per `binding_keys`, then
    /// consume deliveries until cancellation.
    ///
    /// Each delivery is handed to `handler` as `(routing_key, payload)` and
    /// acknowledged exactly once afterwards. With `used_for_log == true` the
    /// queue is exclusive and auto-delete (pass an empty `queue` to get a
    /// server-assigned name); otherwise it is durable.
    #[allow(clippy::too_many_arguments)]
    pub async fn subscribe<F, Fut>(
        &self,
        binding_keys: impl Into<BindingKeys>,
        queue: &str,
        used_for_log: bool,
        exchange: &str,
        kind: ExchangeKind,
        mut handler: F,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        F: FnMut(String, Vec<u8>) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let binding_keys = binding_keys.into();
        let channel = self.conn.channel();

        topology::declare_exchange(channel, exchange, kind).await?;
        let queue = topology::bind_queue(channel, queue, used_for_log, exchange, &binding_keys)
            .await?;

        // One unacknowledged message at a time: distribute by processing
        // capacity instead of round-robin.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let mut consumer = channel
            .basic_consume(
                &queue,
                "taskbus-consumer",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue = %queue, exchange = %exchange, "waiting for messages");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(queue = %queue, "receive loop cancelled");
                    break;
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            let tag = delivery.delivery_tag;
                            let routing_key = delivery.routing_key.as_str().to_string();
                            handler(routing_key, delivery.data.clone()).await;
                            self.conn.acknowledge(tag).await?;
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "consumer error");
                        }
                        None => {
                            info!(queue = %queue, "consumer closed by broker");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
