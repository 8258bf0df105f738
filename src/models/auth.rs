//! Locally stored sign-in records.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored username/password pair.
///
/// CloudBox authentication is a demo simulation: credentials live in the
/// local state store in plaintext and are never verified server-side.
/// This is deliberately insecure and out of scope for hardening.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Credential {
    /// Unique account name; the store is keyed by it.
    pub username: String,

    /// Contact address captured at registration, if any.
    pub email: Option<String>,

    /// Plaintext password (see module note above).
    pub password: String,
}
