//! BlueBubbles channel — iMessage in via webhook events, out via the
//! BlueBubbles server's REST API.

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use futures::stream;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::channels::channel::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::config::Config;
use crate::error::ChannelError;

pub const CHANNEL_NAME: &str = "bluebubbles";

// ── REST client ─────────────────────────────────────────────────────

/// Thin client for the BlueBubbles server REST API. The server
/// password travels as a query parameter on every request.
#[derive(Clone)]
pub struct BlueBubblesClient {
    base_url: String,
    password: SecretString,
    method: String,
    client: reqwest::Client,
}

impl BlueBubblesClient {
    pub fn new(
        base_url: impl Into<String>,
        password: SecretString,
        method: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            password,
            method: method.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.bluebubbles_url.clone(),
            config.server_password.clone(),
            config.send_method.clone(),
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Send a plain text message to a chat.
    pub async fn send_text(&self, chat_guid: &str, text: &str) -> Result<(), ChannelError> {
        let payload = json!({
            "chatGuid": chat_guid,
            "tempGuid": Uuid::new_v4().to_string(),
            "message": text,
            "method": self.method,
        });

        let response = self
            .client
            .post(self.api_url("message/text"))
            .query(&[("password", self.password.expose_secret())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL_NAME.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: CHANNEL_NAME.to_string(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        debug!(chat_guid = %chat_guid, "Message sent via BlueBubbles");
        Ok(())
    }

    /// Ping the server to verify connectivity and the password.
    pub async fn ping(&self) -> Result<(), ChannelError> {
        let response = self
            .client
            .get(self.api_url("ping"))
            .query(&[("password", self.password.expose_secret())])
            .send()
            .await
            .map_err(|_| ChannelError::HealthCheckFailed {
                name: CHANNEL_NAME.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed {
                name: CHANNEL_NAME.to_string(),
            })
        }
    }
}

// ── Webhook wire types ──────────────────────────────────────────────

/// Event posted to `/webhook` by the BlueBubbles server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    #[serde(rename = "new-message")]
    NewMessage { data: MessagePayload },
    /// Any other event type (typing indicators, read receipts, …).
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    /// Absent for attachment-only messages.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "isFromMe")]
    pub is_from_me: bool,
    #[serde(default)]
    pub chats: Vec<ChatRef>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRef {
    pub guid: String,
}

// ── Webhook router ──────────────────────────────────────────────────

#[derive(Clone)]
struct WebhookState {
    incoming_tx: mpsc::UnboundedSender<IncomingMessage>,
    secret: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct WebhookAuth {
    password: Option<String>,
}

async fn webhook_handler(
    State(state): State<WebhookState>,
    Query(auth): Query<WebhookAuth>,
    Json(event): Json<WebhookEvent>,
) -> impl IntoResponse {
    if let Some(secret) = &state.secret {
        if auth.password.as_deref() != Some(secret.expose_secret()) {
            warn!("Webhook request rejected: bad or missing password");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            );
        }
    }

    let WebhookEvent::NewMessage { data } = event else {
        return (StatusCode::OK, Json(json!({"status": "ignored"})));
    };
    if data.is_from_me {
        return (StatusCode::OK, Json(json!({"status": "ignored"})));
    }
    let Some(chat) = data.chats.first() else {
        debug!("Webhook message without a chat guid ignored");
        return (StatusCode::OK, Json(json!({"status": "ignored"})));
    };
    // Only textless (attachment-only) messages are dropped; whitespace
    // text still counts as an answer attempt and flows through as sent.
    let Some(text) = data.text.as_deref().filter(|t| !t.is_empty()) else {
        return (StatusCode::OK, Json(json!({"status": "ignored"})));
    };

    debug!(conversation_id = %chat.guid, "Webhook message received");
    let msg = IncomingMessage::new(CHANNEL_NAME, &chat.guid, text);
    if state.incoming_tx.send(msg).is_err() {
        warn!("Inbound queue closed; dropping webhook message");
    }
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

// ── Channel ─────────────────────────────────────────────────────────

/// BlueBubbles iMessage channel.
///
/// `router()` exposes `POST /webhook`, which feeds the stream returned
/// by `start()`. iMessage has no native interactive-message rendering
/// here, so `deliver` always sends the response's text fallback.
pub struct BlueBubblesChannel {
    client: BlueBubblesClient,
    webhook_secret: Option<SecretString>,
    incoming_tx: mpsc::UnboundedSender<IncomingMessage>,
    /// Receiver side of the inbound queue, consumed once in `start()`.
    incoming_rx: Mutex<Option<mpsc::UnboundedReceiver<IncomingMessage>>>,
}

impl BlueBubblesChannel {
    pub fn new(client: BlueBubblesClient, webhook_secret: Option<SecretString>) -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        Self {
            client,
            webhook_secret,
            incoming_tx,
            incoming_rx: Mutex::new(Some(incoming_rx)),
        }
    }

    /// Build the webhook router. Call once and merge with the app router.
    pub fn router(&self) -> Router {
        let state = WebhookState {
            incoming_tx: self.incoming_tx.clone(),
            secret: self.webhook_secret.clone(),
        };
        Router::new()
            .route("/webhook", post(webhook_handler))
            .with_state(state)
    }
}

#[async_trait]
impl Channel for BlueBubblesChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let rx = self
            .incoming_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: CHANNEL_NAME.to_string(),
                reason: "start() already called".to_string(),
            })?;

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn deliver(
        &self,
        conversation_id: &str,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.client.send_text(conversation_id, &response.content).await
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        self.client.ping().await
    }
}
