//! Simulated authentication over the injectable local store.
//!
//! There is no server involved: "login" compares against locally stored
//! plaintext pairs (or the single reset-override password), and the
//! session is one current-username value. A demo mechanism by design.

use crate::models::auth::Credential;
use crate::store::{CredentialStore, SessionStore, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password must not be empty")]
    MissingFields,
    #[error("`{0}` does not look like an email address")]
    InvalidEmail(String),
    #[error("username `{0}` is already registered")]
    UsernameTaken(String),
    #[error("no account found for `{0}`")]
    UnknownUser(String),
    #[error("incorrect password for `{0}`")]
    WrongPassword(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AuthService<S> {
    store: S,
}

impl<S: CredentialStore + SessionStore> AuthService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an account and sign it in immediately.
    ///
    /// Validation happens before the store is touched: empty fields and
    /// malformed email addresses are rejected locally. A taken username
    /// is refused without mutating the stored credentials.
    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if let Some(email) = email {
            if !looks_like_email(email) {
                return Err(AuthError::InvalidEmail(email.to_string()));
            }
        }

        let credential = Credential {
            username: username.to_string(),
            email: email.map(str::to_string),
            password: password.to_string(),
        };
        match self.store.insert_credential(&credential).await {
            Ok(()) => {}
            Err(StoreError::DuplicateUsername(name)) => {
                return Err(AuthError::UsernameTaken(name));
            }
            Err(other) => return Err(other.into()),
        }

        self.store.set_current_user(username).await?;
        Ok(())
    }

    /// Sign in with a stored password or the global reset override.
    ///
    /// An unknown username is a distinct outcome from a wrong password,
    /// and the override never vouches for accounts that were never
    /// registered.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some(credential) = self.store.credential(username).await? else {
            return Err(AuthError::UnknownUser(username.to_string()));
        };

        if credential.password != password {
            let override_matches = matches!(
                self.store.reset_override().await?,
                Some(reset) if reset == password
            );
            if !override_matches {
                return Err(AuthError::WrongPassword(username.to_string()));
            }
        }

        self.store.set_current_user(username).await?;
        Ok(())
    }

    /// Clear the session.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.clear_current_user().await?;
        Ok(())
    }

    /// Username restored from the local store, if anyone is signed in.
    pub async fn current_user(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store.current_user().await?)
    }

    /// Set the global override password (the demo "forgot password" flow).
    pub async fn reset_password(&self, new_password: &str) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        self.store.set_reset_override(new_password).await?;
        Ok(())
    }
}

/// Loose address-shape check: a non-empty local part and a dotted domain.
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
