//! Local persistent state: credentials, the reset override, and the
//! current session.
//!
//! The web client kept all of this in browser local storage. Here it is an
//! explicit, injectable pair of traits so services can run against an
//! in-memory fake in tests and a SQLite file in the CLI. Values are stored
//! exactly as the simulation demands (plaintext), an acknowledged demo
//! mechanism rather than a pattern to reuse.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::auth::Credential;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` is already registered")]
    DuplicateUsername(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Username-keyed credential records plus the single global reset override.
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    /// Store a new credential. Fails with [`StoreError::DuplicateUsername`]
    /// without mutating anything when the username is taken.
    async fn insert_credential(&self, credential: &Credential) -> StoreResult<()>;

    /// Look up a credential by username.
    async fn credential(&self, username: &str) -> StoreResult<Option<Credential>>;

    /// Set the global override password ("forgot password" flow).
    async fn set_reset_override(&self, password: &str) -> StoreResult<()>;

    /// Current override password, if one was ever set.
    async fn reset_override(&self) -> StoreResult<Option<String>>;
}

/// The single current-username session value, read at startup and cleared
/// on logout.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn current_user(&self) -> StoreResult<Option<String>>;
    async fn set_current_user(&self, username: &str) -> StoreResult<()>;
    async fn clear_current_user(&self) -> StoreResult<()>;
}
