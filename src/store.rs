//! Session-scoped storage for saved phone numbers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNumber {
    pub id: String,
    pub phone_number: String,
    pub contact_name: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("phone number must not be empty")]
    EmptyPhoneNumber,

    /// Raised by durable backends when the underlying storage fails.
    /// [`MemoryStore`] never produces it.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// The whole persistence contract. Each call is atomic with respect to the
/// others; a durable backend only has to implement these three.
#[async_trait]
pub trait SavedNumberStore: Send + Sync {
    async fn list(&self, session_id: &str) -> Result<Vec<SavedNumber>, StoreError>;

    async fn save(
        &self,
        phone_number: &str,
        contact_name: Option<&str>,
        session_id: &str,
    ) -> Result<SavedNumber, StoreError>;

    /// Returns false both when `id` is unknown and when it belongs to another
    /// session; callers cannot tell the two apart.
    async fn delete(&self, id: &str, session_id: &str) -> Result<bool, StoreError>;
}

/// Label used when a number is saved without a name.
pub fn default_contact_name(phone_number: &str) -> String {
    format!("Contact ({})", phone_number)
}

/// In-process store. Records live until deleted or the process exits.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<SavedNumber>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedNumberStore for MemoryStore {
    async fn list(&self, session_id: &str) -> Result<Vec<SavedNumber>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn save(
        &self,
        phone_number: &str,
        contact_name: Option<&str>,
        session_id: &str,
    ) -> Result<SavedNumber, StoreError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(StoreError::EmptyPhoneNumber);
        }

        let contact_name = contact_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_contact_name(phone_number));

        let record = SavedNumber {
            id: Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            contact_name,
            session_id: session_id.to_string(),
            created_at: Utc::now(),
        };

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str, session_id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records
            .iter()
            .position(|r| r.id == id && r.session_id == session_id)
        {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
