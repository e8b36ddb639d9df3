//! Flow state store — in-memory, per-conversation form progress.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

use crate::catalog::FieldCatalog;
use crate::error::FlowError;
use crate::flow::state::ConversationFlow;

/// In-memory store of active conversation flows.
///
/// Each flow lives in its own `Arc<Mutex<…>>` cell so read-modify-write
/// sequences for one conversation serialize on that conversation's
/// lock while unrelated conversations proceed in parallel. Nothing is
/// persisted; a restart drops all flows.
pub struct FlowStore {
    flows: RwLock<HashMap<String, Arc<Mutex<ConversationFlow>>>>,
}

impl FlowStore {
    /// Create an empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            flows: RwLock::new(HashMap::new()),
        })
    }

    /// Create a fresh flow for the conversation, awaiting the catalog's
    /// first field. Fails without touching the existing record if one
    /// is already active.
    pub async fn create(
        &self,
        conversation_id: &str,
        catalog: &FieldCatalog,
    ) -> Result<ConversationFlow, FlowError> {
        let mut flows = self.flows.write().await;
        if flows.contains_key(conversation_id) {
            return Err(FlowError::AlreadyExists {
                conversation_id: conversation_id.to_string(),
            });
        }
        let flow = ConversationFlow::begin(conversation_id, catalog);
        flows.insert(
            conversation_id.to_string(),
            Arc::new(Mutex::new(flow.clone())),
        );
        info!(conversation_id = %conversation_id, "Flow created");
        Ok(flow)
    }

    /// Snapshot of one conversation's flow.
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationFlow, FlowError> {
        let cell = self.cell(conversation_id).await.ok_or_else(|| FlowError::NotFound {
            conversation_id: conversation_id.to_string(),
        })?;
        let flow = cell.lock().await.clone();
        Ok(flow)
    }

    /// Replace one conversation's record wholesale.
    pub async fn update(
        &self,
        conversation_id: &str,
        flow: ConversationFlow,
    ) -> Result<(), FlowError> {
        let cell = self.cell(conversation_id).await.ok_or_else(|| FlowError::NotFound {
            conversation_id: conversation_id.to_string(),
        })?;
        *cell.lock().await = flow;
        debug!(conversation_id = %conversation_id, "Flow updated");
        Ok(())
    }

    /// Delete one conversation's flow. Idempotent; returns whether a
    /// record was removed.
    pub async fn reset(&self, conversation_id: &str) -> bool {
        let removed = self.flows.write().await.remove(conversation_id).is_some();
        if removed {
            info!(conversation_id = %conversation_id, "Flow reset");
        }
        removed
    }

    /// Take the conversation's exclusive guard, or `None` when no flow
    /// is active. Callers hold this across the whole read-modify-write
    /// so same-conversation mutations serialize.
    pub async fn lock(&self, conversation_id: &str) -> Option<OwnedMutexGuard<ConversationFlow>> {
        let cell = self.cell(conversation_id).await?;
        Some(cell.lock_owned().await)
    }

    /// Snapshot of all active flows, oldest first.
    pub async fn all(&self) -> Vec<ConversationFlow> {
        let cells: Vec<Arc<Mutex<ConversationFlow>>> =
            self.flows.read().await.values().cloned().collect();
        let mut flows = Vec::with_capacity(cells.len());
        for cell in cells {
            flows.push(cell.lock().await.clone());
        }
        flows.sort_by_key(|flow| flow.created_at);
        flows
    }

    /// Number of active flows.
    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }

    async fn cell(&self, conversation_id: &str) -> Option<Arc<Mutex<ConversationFlow>>> {
        self.flows.read().await.get(conversation_id).cloned()
    }
}
