//! Centralized application configuration.
//! Merges environment variables with CLI overrides.

use std::env;

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the CloudBox metadata/API service.
    pub api_url: String,
    /// Path of the SQLite file holding credentials and session state.
    pub store_path: String,
}

impl AppConfig {
    /// Resolve configuration: CLI overrides win, then environment
    /// variables, then local defaults.
    pub fn resolve(api_url: Option<String>, store_path: Option<String>) -> Self {
        let env_api_url =
            env::var("CLOUDBOX_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let env_store_path =
            env::var("CLOUDBOX_STORE_PATH").unwrap_or_else(|_| "./data/cloudbox.db".into());

        Self {
            api_url: api_url.unwrap_or(env_api_url),
            store_path: store_path.unwrap_or(env_store_path),
        }
    }
}
