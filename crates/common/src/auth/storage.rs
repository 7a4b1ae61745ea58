//! Secure token storage contract
//!
//! Three slots (access token, refresh token, expiry) plus a bulk clear.
//! Every implementation serializes its own slot operations internally, so a
//! single storage instance can be shared across tasks. Writes to different
//! slots are separate atomic operations, not one transaction.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Tokens are reported expired this many seconds before their actual expiry
pub const EXPIRY_MARGIN_SECONDS: i64 = 600;

/// Storage backend failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backend rejected a write
    #[error("Token storage save failed: {0}")]
    SaveFailed(String),

    /// The backend rejected a delete
    #[error("Token storage delete failed: {0}")]
    DeleteFailed(String),

    /// A stored value could not be interpreted
    #[error("Unexpected data format in token storage: {0}")]
    UnexpectedDataFormat(String),
}

/// Pluggable persistence for the session triple
///
/// Getters return `None` both when a slot is empty and when the backend
/// cannot be read; mutating operations report backend failures.
pub trait TokenStorage: Send + Sync {
    /// Persist the access token, replacing any previous value
    ///
    /// # Errors
    /// Returns `StorageError::SaveFailed` if the backend rejects the write
    fn save_access_token(&self, token: &str) -> Result<(), StorageError>;

    /// Read the access token
    fn get_access_token(&self) -> Option<String>;

    /// Remove the access token (no error when absent)
    ///
    /// # Errors
    /// Returns `StorageError::DeleteFailed` if the backend rejects the delete
    fn delete_access_token(&self) -> Result<(), StorageError>;

    /// Persist the refresh token, replacing any previous value
    ///
    /// # Errors
    /// Returns `StorageError::SaveFailed` if the backend rejects the write
    fn save_refresh_token(&self, token: &str) -> Result<(), StorageError>;

    /// Read the refresh token
    fn get_refresh_token(&self) -> Option<String>;

    /// Remove the refresh token (no error when absent)
    ///
    /// # Errors
    /// Returns `StorageError::DeleteFailed` if the backend rejects the delete
    fn delete_refresh_token(&self) -> Result<(), StorageError>;

    /// Persist the access token expiry
    ///
    /// # Errors
    /// Returns `StorageError::SaveFailed` if the backend rejects the write
    fn save_expires_at(&self, expires_at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Read the access token expiry
    fn get_expires_at(&self) -> Option<DateTime<Utc>>;

    /// Remove all three slots; succeeds when nothing is stored
    ///
    /// # Errors
    /// Returns `StorageError::DeleteFailed` if the backend rejects a delete
    fn clear_all(&self) -> Result<(), StorageError>;

    /// True if no expiry is stored or it falls within the safety margin
    fn is_expired(&self) -> bool {
        is_expiry_due(self.get_expires_at(), Utc::now())
    }
}

/// Expiry check shared by every backend
///
/// A missing expiry counts as expired. A present one counts as expired
/// when it lies less than [`EXPIRY_MARGIN_SECONDS`] after `now`.
#[must_use]
pub fn is_expiry_due(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(expires_at) => expires_at - now < Duration::seconds(EXPIRY_MARGIN_SECONDS),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::storage.
    use super::*;

    /// Validates the expiry margin boundaries.
    ///
    /// Assertions:
    /// - Missing expiry is expired.
    /// - Past expiry and expiry inside the margin are expired.
    /// - Expiry beyond the margin is not expired.
    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();

        assert!(is_expiry_due(None, now));
        assert!(is_expiry_due(Some(now - Duration::seconds(10)), now));
        assert!(is_expiry_due(Some(now + Duration::seconds(599)), now));
        assert!(!is_expiry_due(Some(now + Duration::seconds(EXPIRY_MARGIN_SECONDS)), now));
        assert!(!is_expiry_due(Some(now + Duration::seconds(3600)), now));
    }
}
