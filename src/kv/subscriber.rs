//! Channel subscriber draining a shared subscription handle.

use futures::StreamExt;
use redis::aio::PubSub;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RedisConfig;
use crate::error::{json_shape, Error, Result};
use crate::kv::KILL_SENTINEL;

/// An ordered sequence of channel names or patterns.
///
/// Static call sites use the `From` conversions; dynamic inputs go through
/// `TryFrom<serde_json::Value>`, which rejects anything that is not an array
/// of strings before the store is contacted. A bare string is rejected too:
/// a subscription argument is always a sequence, even for a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels(Vec<String>);

impl Channels {
    /// The names in subscription order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Channels {
    fn from(channels: Vec<String>) -> Self {
        Channels(channels)
    }
}

impl From<Vec<&str>> for Channels {
    fn from(channels: Vec<&str>) -> Self {
        Channels(channels.into_iter().map(str::to_string).collect())
    }
}

impl TryFrom<serde_json::Value> for Channels {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Array(items) => {
                let mut channels = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(channel) => channels.push(channel),
                        other => return Err(Error::ChannelsNotASequence(json_shape(&other))),
                    }
                }
                Ok(Channels(channels))
            }
            other => Err(Error::ChannelsNotASequence(json_shape(&other))),
        }
    }
}

/// Receives messages from subscribed channels and patterns.
///
/// Owns the subscription handle outright; the publisher role shares nothing
/// with it. Memberships accumulate across `subscribe`/`psubscribe` calls and
/// are dropped together when the [`KILL_SENTINEL`] arrives, the caller's
/// token is cancelled, or the process exits.
pub struct Subscriber {
    pubsub: PubSub,
    channels: Vec<String>,
    patterns: Vec<String>,
    finished: bool,
}

impl Subscriber {
    /// Open a connection and subscription handle to the configured store.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())?;
        let pubsub = client.get_async_pubsub().await?;

        info!(host = %config.host, port = config.port, "connected to Redis pub/sub");

        Ok(Self {
            pubsub,
            channels: Vec::new(),
            patterns: Vec::new(),
            finished: false,
        })
    }

    /// Join channels by exact name. Restarts an exhausted sequence.
    pub async fn subscribe(&mut self, channels: Channels) -> Result<()> {
        for channel in channels.as_slice() {
            self.pubsub.subscribe(channel).await?;
            self.channels.push(channel.clone());
        }
        self.finished = false;
        Ok(())
    }

    /// Join channels by name pattern. Restarts an exhausted sequence.
    pub async fn psubscribe(&mut self, patterns: Channels) -> Result<()> {
        for pattern in patterns.as_slice() {
            self.pubsub.psubscribe(pattern).await?;
            self.patterns.push(pattern.clone());
        }
        self.finished = false;
        Ok(())
    }

    /// Wait for the next `(channel, payload)` pair.
    ///
    /// Returns `Ok(None)` once the subscription is over: either the
    /// [`KILL_SENTINEL`] payload arrived on any joined channel (the
    /// subscriber unsubscribes from everything first) or `cancel` fired.
    /// Every other payload is yielded unchanged. Callers drain the
    /// subscription with `while let Some((channel, payload)) = sub.recv(..)`.
    /// Once over, every further call returns `Ok(None)` immediately; only a
    /// fresh subscription restarts the sequence.
    pub async fn recv(&mut self, cancel: &CancellationToken) -> Result<Option<(String, String)>> {
        if self.finished {
            return Ok(None);
        }

        let msg = {
            let mut messages = self.pubsub.on_message();
            tokio::select! {
                _ = cancel.cancelled() => None,
                msg = messages.next() => msg,
            }
        };

        let Some(msg) = msg else {
            // Cancelled, or the server side ended the stream.
            self.unsubscribe_all().await?;
            return Ok(None);
        };

        let channel = msg.get_channel_name().to_string();
        let payload: String = msg.get_payload()?;

        if payload == KILL_SENTINEL {
            info!(channel = %channel, "kill sentinel received, unsubscribing");
            self.unsubscribe_all().await?;
            return Ok(None);
        }

        Ok(Some((channel, payload)))
    }

    /// Drop every channel and pattern membership and mark the sequence
    /// exhausted.
    async fn unsubscribe_all(&mut self) -> Result<()> {
        self.finished = true;
        for channel in std::mem::take(&mut self.channels) {
            self.pubsub.unsubscribe(&channel).await?;
        }
        for pattern in std::mem::take(&mut self.patterns) {
            self.pubsub.punsubscribe(&pattern).await?;
        }
        Ok(())
    }
}
