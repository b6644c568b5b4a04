//! Shared persistence layer: a single JSON document in a remote gist, or in memory.
//!
//! Every mutation loads the whole document, applies a change and writes the
//! whole document back. There is no locking: concurrent writers race and the
//! last write wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::conversation::ConversationEntry;
use crate::models::user::UserRecord;

pub mod document;
pub mod gist;
pub mod memory;

pub use document::{Blob, ResumeBlob, SharedDocument};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gist API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The stored content is not a JSON object. Writes are refused so the
    /// content is not replaced by an empty document.
    #[error("Stored document is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// Where the shared document physically lives.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<SharedDocument, StoreError>;

    async fn save(&self, document: &SharedDocument) -> Result<(), StoreError>;
}

/// Read-modify-write helpers over a `DocumentBackend`.
#[derive(Clone)]
pub struct SharedStore {
    backend: Arc<dyn DocumentBackend>,
}

impl SharedStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn read(&self) -> Result<SharedDocument, StoreError> {
        self.backend.load().await
    }

    /// Loads the document, applies `change`, stamps `updated_at` and saves.
    /// A failed save is retried once before the error is returned. Nothing is
    /// saved when the load fails, including `StoreError::Corrupt`.
    pub async fn update<T, F>(&self, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SharedDocument) -> T + Send,
        T: Send,
    {
        let mut document = self.backend.load().await?;
        let result = change(&mut document);
        document.updated_at = Some(Utc::now());

        if let Err(first) = self.backend.save(&document).await {
            warn!(
                "Saving shared document to {} failed ({first}), retrying once",
                self.backend.name()
            );
            self.backend.save(&document).await?;
        }

        Ok(result)
    }

    pub async fn register_user(
        &self,
        name: String,
        email: Option<String>,
    ) -> Result<UserRecord, StoreError> {
        let user = UserRecord::new(name, email);
        let stored = user.clone();
        self.update(move |doc| {
            doc.users.insert(stored.id, stored);
        })
        .await?;
        info!("Registered visitor {} ({})", user.id, user.name);
        Ok(user)
    }

    /// Appends an exchange to the visitor's log and bumps `last_active`.
    /// Returns false, logging nothing, when the visitor has been deleted.
    pub async fn append_conversation(
        &self,
        user_id: Uuid,
        entry: ConversationEntry,
    ) -> Result<bool, StoreError> {
        self.update(move |doc| {
            let Some(user) = doc.users.get_mut(&user_id) else {
                return false;
            };
            user.last_active = entry.at;
            doc.conversations.entry(user_id).or_default().push(entry);
            true
        })
        .await
    }

    /// Removes the user and their conversation log. Returns whether the user existed.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<bool, StoreError> {
        self.update(move |doc| {
            doc.conversations.remove(&user_id);
            doc.users.remove(&user_id).is_some()
        })
        .await
    }

    /// Drops every conversation log. Returns how many messages were removed.
    pub async fn clear_conversations(&self) -> Result<usize, StoreError> {
        self.update(|doc| {
            let removed = doc.message_count();
            doc.conversations.clear();
            removed
        })
        .await
    }

    pub async fn set_resume(&self, resume: ResumeBlob) -> Result<(), StoreError> {
        self.update(move |doc| doc.resume = Some(resume)).await
    }

    pub async fn set_avatar(&self, avatar: Blob) -> Result<(), StoreError> {
        self.update(move |doc| doc.avatar = Some(avatar)).await
    }
}
