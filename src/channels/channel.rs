//! Core channel types: inbound messages, outbound replies, the transport trait.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::ChannelError;
use crate::template::InteractiveMessage;

/// One inbound message from a conversation.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Name of the channel the message arrived on.
    pub channel: String,
    /// Opaque conversation identifier (chat GUID on BlueBubbles).
    pub conversation_id: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, conversation_id: &str, content: &str) -> Self {
        Self {
            channel: channel.to_string(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            received_at: Utc::now(),
        }
    }
}

/// One outbound reply.
///
/// `content` is the plain-text rendering every channel can deliver;
/// a channel with native interactive-message support may render
/// `template` instead. The choice belongs to the channel alone.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub content: String,
    pub template: Option<InteractiveMessage>,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            template: None,
        }
    }

    pub fn with_template(content: impl Into<String>, template: InteractiveMessage) -> Self {
        Self {
            content: content.into(),
            template: Some(template),
        }
    }
}

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message transport the engine can receive from and deliver to.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable channel name, used to route deliveries.
    fn name(&self) -> &str;

    /// Start consuming the channel. Called once per channel; returns
    /// the inbound message stream.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a reply to a conversation on this channel.
    async fn deliver(
        &self,
        conversation_id: &str,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Verify the channel's transport is reachable.
    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Release transport resources on shutdown.
    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
