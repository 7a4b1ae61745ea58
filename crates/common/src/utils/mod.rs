//! Common utility functions
//!
//! - **[`serde`]**: Serialization helpers for common data types

pub mod serde;

pub use self::serde::duration_secs;
