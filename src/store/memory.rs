//! In-memory store, primarily for tests and ephemeral runs.

use super::{CredentialStore, SessionStore, StoreError, StoreResult};
use crate::models::auth::Credential;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    credentials: HashMap<String, Credential>,
    reset_override: Option<String>,
    current_user: Option<String>,
}

/// Volatile implementation of both store traits.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    async fn insert_credential(&self, credential: &Credential) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.credentials.contains_key(&credential.username) {
            return Err(StoreError::DuplicateUsername(credential.username.clone()));
        }
        inner
            .credentials
            .insert(credential.username.clone(), credential.clone());
        Ok(())
    }

    async fn credential(&self, username: &str) -> StoreResult<Option<Credential>> {
        Ok(self.inner.lock().unwrap().credentials.get(username).cloned())
    }

    async fn set_reset_override(&self, password: &str) -> StoreResult<()> {
        self.inner.lock().unwrap().reset_override = Some(password.to_string());
        Ok(())
    }

    async fn reset_override(&self) -> StoreResult<Option<String>> {
        Ok(self.inner.lock().unwrap().reset_override.clone())
    }
}

impl SessionStore for MemoryStore {
    async fn current_user(&self) -> StoreResult<Option<String>> {
        Ok(self.inner.lock().unwrap().current_user.clone())
    }

    async fn set_current_user(&self, username: &str) -> StoreResult<()> {
        self.inner.lock().unwrap().current_user = Some(username.to_string());
        Ok(())
    }

    async fn clear_current_user(&self) -> StoreResult<()> {
        self.inner.lock().unwrap().current_user = None;
        Ok(())
    }
}
