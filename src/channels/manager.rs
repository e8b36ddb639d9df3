//! Channel manager: starts all channels, merges inbound streams, routes
//! outbound deliveries by channel name.

use futures::stream;
use tracing::{info, warn};

use crate::channels::channel::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

/// Registry of the channels the service talks through.
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        info!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    /// Names of all registered channels, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    /// Start every channel and merge their inbound streams into one.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let stream = channel.start().await?;
            info!(channel = channel.name(), "Channel started");
            streams.push(stream);
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Deliver a response to a conversation on a named channel.
    pub async fn deliver(
        &self,
        channel_name: &str,
        conversation_id: &str,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self
            .channels
            .iter()
            .find(|c| c.name() == channel_name)
            .ok_or_else(|| ChannelError::UnknownChannel(channel_name.to_string()))?;
        channel.deliver(conversation_id, response).await
    }

    /// Reply on the channel a message arrived on.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.deliver(&msg.channel, &msg.conversation_id, response)
            .await
    }

    /// Health-check every channel; returns `(name, healthy)` pairs.
    pub async fn health_check_all(&self) -> Vec<(String, bool)> {
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let healthy = channel.health_check().await.is_ok();
            if !healthy {
                warn!(channel = channel.name(), "Channel health check failed");
            }
            results.push((channel.name().to_string(), healthy));
        }
        results
    }

    /// Shut down every channel, logging failures rather than aborting.
    pub async fn shutdown_all(&self) {
        for channel in &self.channels {
            if let Err(error) = channel.shutdown().await {
                warn!(channel = channel.name(), %error, "Channel shutdown failed");
            }
        }
    }
}
