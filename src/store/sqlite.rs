//! SQLite-backed store, the durable stand-in for the browser's local
//! storage. One table for credentials, one generic key/value table for the
//! reset override and the session.

use super::{CredentialStore, SessionStore, StoreError, StoreResult};
use crate::models::auth::Credential;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

const KEY_RESET_OVERRIDE: &str = "reset_password_override";
const KEY_CURRENT_USER: &str = "current_user";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the store file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::connect(options).await
    }

    /// Fresh in-memory database, for tests.
    pub async fn in_memory() -> StoreResult<Self> {
        let options: SqliteConnectOptions = "sqlite::memory:".parse().map_err(StoreError::Sqlx)?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> StoreResult<Self> {
        // A single connection keeps the in-memory variant coherent and is
        // plenty for a per-user state file.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS credentials (
                 username TEXT PRIMARY KEY,
                 email    TEXT,
                 password TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS local_state (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO local_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn value(&self, key: &str) -> StoreResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM local_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn clear_value(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM local_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl CredentialStore for SqliteStore {
    async fn insert_credential(&self, credential: &Credential) -> StoreResult<()> {
        let inserted = sqlx::query(
            "INSERT INTO credentials (username, email, password) VALUES (?, ?, ?)",
        )
        .bind(&credential.username)
        .bind(&credential.email)
        .bind(&credential.password)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::DuplicateUsername(credential.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn credential(&self, username: &str) -> StoreResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT username, email, password FROM credentials WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credential)
    }

    async fn set_reset_override(&self, password: &str) -> StoreResult<()> {
        self.set_value(KEY_RESET_OVERRIDE, password).await
    }

    async fn reset_override(&self) -> StoreResult<Option<String>> {
        self.value(KEY_RESET_OVERRIDE).await
    }
}

impl SessionStore for SqliteStore {
    async fn current_user(&self) -> StoreResult<Option<String>> {
        self.value(KEY_CURRENT_USER).await
    }

    async fn set_current_user(&self, username: &str) -> StoreResult<()> {
        self.set_value(KEY_CURRENT_USER, username).await
    }

    async fn clear_current_user(&self) -> StoreResult<()> {
        self.clear_value(KEY_CURRENT_USER).await
    }
}

/// Return true if a SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
