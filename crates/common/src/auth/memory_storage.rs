//! Ephemeral token storage for tests and throwaway sessions

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::storage::{StorageError, TokenStorage};

#[derive(Debug, Default)]
struct Slots {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory [`TokenStorage`]; nothing survives the process
///
/// Operations never fail. A single mutex guards all three slots.
#[derive(Debug, Default)]
pub struct InMemoryTokenStorage {
    slots: Mutex<Slots>,
}

impl InMemoryTokenStorage {
    /// Create empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for InMemoryTokenStorage {
    fn save_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.slots.lock().access_token = Some(token.to_string());
        Ok(())
    }

    fn get_access_token(&self) -> Option<String> {
        self.slots.lock().access_token.clone()
    }

    fn delete_access_token(&self) -> Result<(), StorageError> {
        self.slots.lock().access_token = None;
        Ok(())
    }

    fn save_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.slots.lock().refresh_token = Some(token.to_string());
        Ok(())
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.slots.lock().refresh_token.clone()
    }

    fn delete_refresh_token(&self) -> Result<(), StorageError> {
        self.slots.lock().refresh_token = None;
        Ok(())
    }

    fn save_expires_at(&self, expires_at: DateTime<Utc>) -> Result<(), StorageError> {
        self.slots.lock().expires_at = Some(expires_at);
        Ok(())
    }

    fn get_expires_at(&self) -> Option<DateTime<Utc>> {
        self.slots.lock().expires_at
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        *self.slots.lock() = Slots::default();
        Ok(())
    }
}
