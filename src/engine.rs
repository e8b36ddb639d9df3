//! Flow engine — the orchestration around the state machine: trigger
//! detection, message dispatch, and manual control.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::catalog::FieldCatalog;
use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::error::{Error, FlowError};
use crate::flow::machine::{self, Decision};
use crate::flow::state::ConversationFlow;
use crate::flow::store::FlowStore;
use crate::render;

/// Watches the merged inbound stream, advances flows, and sends each
/// rendered reply back on the channel the message arrived on.
pub struct FlowEngine {
    catalog: FieldCatalog,
    store: Arc<FlowStore>,
    channels: Arc<ChannelManager>,
    trigger_keywords: Vec<String>,
    /// Channel used for deliveries requested through the control
    /// surface, which has no originating message to route by.
    default_channel: String,
}

impl FlowEngine {
    pub fn new(
        catalog: FieldCatalog,
        store: Arc<FlowStore>,
        channels: Arc<ChannelManager>,
        trigger_keywords: Vec<String>,
        default_channel: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            store,
            channels,
            trigger_keywords: trigger_keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
            default_channel: default_channel.into(),
        })
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until ctrl-c or until every channel stream ends.
    pub async fn run(&self) -> Result<(), Error> {
        let mut messages = self.channels.start_all().await?;
        info!("Flow engine ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = messages.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            if let Err(error) = self.dispatch(&message).await {
                error!(
                    conversation_id = %message.conversation_id,
                    %error,
                    "Failed to handle message"
                );
            }
        }

        self.channels.shutdown_all().await;
        Ok(())
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Handle one inbound message end to end.
    ///
    /// An active flow advances under its conversation guard; the text
    /// reaches validation as sent, so a whitespace-only answer
    /// re-prompts the field. With no active flow a trigger keyword
    /// starts one and any other non-blank text gets the greeting;
    /// blank text draws no reply.
    pub async fn dispatch(&self, message: &IncomingMessage) -> Result<(), Error> {
        let reply = match self.store.lock(&message.conversation_id).await {
            Some(mut flow) => {
                let decision = machine::advance(&mut flow, &self.catalog, &message.content);
                debug!(
                    conversation_id = %message.conversation_id,
                    state = %flow.state,
                    cursor = flow.cursor,
                    "Flow advanced"
                );
                self.render_decision(&message.conversation_id, decision)
            }
            None => {
                let text = message.content.trim();
                if text.is_empty() {
                    None
                } else if self.is_trigger(text) {
                    match self.begin(&message.conversation_id, &message.channel).await {
                        // Lost a race with a concurrent trigger; the
                        // winner already sent the prompts.
                        Err(Error::Flow(FlowError::AlreadyExists { .. })) => {
                            debug!(
                                conversation_id = %message.conversation_id,
                                "Trigger raced an active flow"
                            );
                        }
                        other => other?,
                    }
                    None
                } else {
                    Some(render::greeting())
                }
            }
        };

        if let Some(reply) = reply {
            self.channels
                .respond(message, OutgoingResponse::text(reply))
                .await?;
        }
        Ok(())
    }

    fn render_decision(&self, conversation_id: &str, decision: Decision) -> Option<String> {
        match decision {
            Decision::Ignore => Some(render::handoff_pending()),
            Decision::Invalid { field, reason } => Some(render::invalid_reprompt(&reason, &field)),
            Decision::NextPrompt { field } => Some(render::field_prompt(&field)),
            Decision::Completed { answers } => {
                info!(
                    conversation_id = %conversation_id,
                    fields = answers.len(),
                    "Form completed, ready for hand-off"
                );
                Some(render::completion_summary(&self.catalog, &answers))
            }
        }
    }

    fn is_trigger(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.trigger_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword))
    }

    // ── Manual control ──────────────────────────────────────────────

    /// Start a flow from the control surface. Reports
    /// [`FlowError::AlreadyExists`] without touching an active flow.
    pub async fn start(&self, conversation_id: &str) -> Result<(), Error> {
        self.begin(conversation_id, &self.default_channel).await
    }

    /// Tear down a conversation's flow. Idempotent; returns whether a
    /// flow was removed.
    pub async fn reset(&self, conversation_id: &str) -> bool {
        self.store.reset(conversation_id).await
    }

    /// Snapshot one conversation's flow.
    pub async fn status(&self, conversation_id: &str) -> Result<ConversationFlow, FlowError> {
        self.store.get(conversation_id).await
    }

    /// Snapshot every active flow, oldest first.
    pub async fn flows(&self) -> Vec<ConversationFlow> {
        self.store.all().await
    }

    /// Health of every registered channel, by name.
    pub async fn channel_health(&self) -> Vec<(String, bool)> {
        self.channels.health_check_all().await
    }

    /// Create the flow and send the form template plus the first
    /// field's prompt.
    async fn begin(&self, conversation_id: &str, channel: &str) -> Result<(), Error> {
        let flow = self.store.create(conversation_id, &self.catalog).await?;
        info!(conversation_id = %conversation_id, channel = %channel, "Form flow started");

        let template = render::intake_template(&self.catalog);
        let intro = OutgoingResponse::with_template(template.format_for_imessage(), template);
        self.channels.deliver(channel, conversation_id, intro).await?;

        if let Ok(first) = self.catalog.field_at(flow.cursor) {
            let prompt = OutgoingResponse::text(render::field_prompt(first));
            self.channels.deliver(channel, conversation_id, prompt).await?;
        }
        Ok(())
    }
}
