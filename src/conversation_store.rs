//! # Conversation Store Module
//!
//! Holds each user's in-progress [`Flow`]. Records live in a teloxide dialogue
//! [`Storage`] (in-memory unless another backend is injected) and every access
//! goes through a per-user async lock, so two events of the same user are
//! handled one after the other while different users never wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::dispatching::dialogue::{ErasedStorage, InMemStorage, Storage};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::dialogue::Flow;
use crate::errors::ConversationError;

pub struct ConversationStore {
    storage: Arc<ErasedStorage<Flow>>,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl ConversationStore {
    /// Store over any dialogue storage backend
    pub fn new<S>(storage: Arc<S>) -> Self
    where
        S: Storage<Flow> + Send + Sync + 'static,
        S::Error: std::error::Error + Send + Sync + 'static,
    {
        Self {
            storage: storage.erase(),
            locks: DashMap::new(),
        }
    }

    /// Process-local store; flows are lost on restart
    pub fn in_memory() -> Self {
        Self::new(InMemStorage::<Flow>::new())
    }

    /// Wait for exclusive access to one user's record
    pub async fn lock(&self, user_id: i64) -> ConversationGuard<'_> {
        let slot = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let permit = slot.lock_owned().await;
        ConversationGuard {
            store: self,
            user_id,
            _permit: permit,
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Exclusive handle on a user's record, released on drop
pub struct ConversationGuard<'a> {
    store: &'a ConversationStore,
    user_id: i64,
    _permit: OwnedMutexGuard<()>,
}

impl ConversationGuard<'_> {
    pub async fn get(&self) -> Result<Option<Flow>, ConversationError> {
        self.store
            .storage
            .clone()
            .get_dialogue(ChatId(self.user_id))
            .await
            .map_err(ConversationError::Storage)
    }

    /// Replace the user's record, entering a new flow discards the old one
    pub async fn set(&self, flow: Flow) -> Result<(), ConversationError> {
        self.store
            .storage
            .clone()
            .update_dialogue(ChatId(self.user_id), flow)
            .await
            .map_err(ConversationError::Storage)
    }

    /// Remove the user's record; clearing an absent record is a no-op
    pub async fn clear(&self) -> Result<(), ConversationError> {
        if self.get().await?.is_none() {
            return Ok(());
        }
        self.store
            .storage
            .clone()
            .remove_dialogue(ChatId(self.user_id))
            .await
            .map_err(ConversationError::Storage)
    }
}
