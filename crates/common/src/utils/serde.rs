//! Serialization helpers shared by configuration types

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serde adapter storing a `Duration` as whole seconds
///
/// # Usage
/// ```rust
/// use std::time::Duration;
///
/// use rxauth_common::utils::duration_secs;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_secs")]
///     interval: Duration,
/// }
/// ```
pub mod duration_secs {
    use super::*;

    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a Duration as seconds (u64), dropping sub-second precision
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize seconds (u64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
