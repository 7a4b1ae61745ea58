//! Session data types
//!
//! The observable authentication state, the identity-provider profile, and
//! the wire shape of token endpoint responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the engine currently stands with the user's session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationState {
    /// Not yet evaluated (before session restore)
    #[default]
    Unknown,
    /// A session is established and a user profile is loaded
    Authenticated,
    /// No usable session
    Unauthenticated,
}

impl AuthenticationState {
    /// True for [`AuthenticationState::Authenticated`]
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

/// Identity-provider profile
///
/// Decoding accepts `id` or OIDC `sub` for the identifier and `image` or
/// OIDC `picture` for the avatar. Encoding always uses the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawUser")]
pub struct User {
    /// Stable subject identifier
    pub id: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Primary email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl User {
    /// Create a user with only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None, email: None, image: None }
    }
}

/// Failure decoding a [`User`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserDecodeError {
    /// Neither `id` nor `sub` was present
    #[error("missing identifier: expected `id` or `sub`")]
    MissingUserId,
}

#[derive(Deserialize)]
struct RawUser {
    id: Option<String>,
    sub: Option<String>,
    name: Option<String>,
    email: Option<String>,
    image: Option<String>,
    picture: Option<String>,
}

impl TryFrom<RawUser> for User {
    type Error = UserDecodeError;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        let id = raw.id.or(raw.sub).ok_or(UserDecodeError::MissingUserId)?;
        Ok(Self { id, name: raw.name, email: raw.email, image: raw.image.or(raw.picture) })
    }
}

/// Token endpoint success body (RFC 6749 §5.1)
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer credential
    pub access_token: String,

    /// Present when the server issued (or rotated) a refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Usually `Bearer`; read but unused
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Everything a UI observes about the engine, published as one value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Current authentication state
    pub state: AuthenticationState,
    /// Profile of the signed-in user
    pub user: Option<User>,
    /// Last user-visible failure message
    pub error_message: Option<String>,
    /// True while an interactive authentication is in progress
    pub is_authenticating: bool,
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    /// Validates `id` and `sub` decode identically.
    #[test]
    fn test_user_decodes_id_or_sub() {
        let from_sub: User = serde_json::from_str(r#"{"sub":"u1","name":"A"}"#).unwrap();
        let from_id: User = serde_json::from_str(r#"{"id":"u1","name":"A"}"#).unwrap();

        assert_eq!(from_sub, from_id);
        assert_eq!(from_id.id, "u1");
        assert_eq!(from_id.name.as_deref(), Some("A"));
    }

    /// Validates `picture` is accepted as the avatar and `image` wins when
    /// both are present.
    #[test]
    fn test_user_picture_alias() {
        let user: User =
            serde_json::from_str(r#"{"sub":"u1","picture":"http://x/p.png"}"#).unwrap();
        assert_eq!(user.image.as_deref(), Some("http://x/p.png"));

        let user: User = serde_json::from_str(
            r#"{"id":"u1","image":"http://x/i.png","picture":"http://x/p.png"}"#,
        )
        .unwrap();
        assert_eq!(user.image.as_deref(), Some("http://x/i.png"));
    }

    /// Validates decoding fails without any identifier.
    #[test]
    fn test_user_missing_identifier() {
        let err = serde_json::from_str::<User>(r#"{"name":"A"}"#).unwrap_err();
        assert!(err.to_string().contains("missing identifier"));
    }

    /// Validates encoding always emits canonical keys.
    ///
    /// Assertions:
    /// - Keys are exactly `id`, `name`, `email` and `image`.
    /// - Neither `sub` nor `picture` appears.
    #[test]
    fn test_user_encodes_canonical_keys() {
        let user = User {
            id: "1".into(),
            name: Some("A".into()),
            email: Some("a@x.com".into()),
            image: Some("http://x/i.png".into()),
        };
        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["email", "id", "image", "name"]);
        assert!(!object.contains_key("sub"));
        assert!(!object.contains_key("picture"));
    }

    /// Validates optional token response fields default to `None`.
    #[test]
    fn test_token_response_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();

        assert_eq!(response.access_token, "a");
        assert!(response.refresh_token.is_none());
        assert!(response.expires_in.is_none());
        assert!(response.token_type.is_none());
        assert!(!format!("{response:?}").contains("\"a\""));
    }

    /// Validates the initial snapshot.
    #[test]
    fn test_snapshot_default() {
        let snapshot = AuthSnapshot::default();
        assert_eq!(snapshot.state, AuthenticationState::Unknown);
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_authenticating);
    }
}
