//! Backend liveness monitor.
//!
//! Polls `GET /health` on a fixed 10-second cadence (no backoff, no
//! jitter, independent of every other operation) and publishes the
//! binary online/offline state over a `watch` channel. The probe itself
//! carries a 2-second timeout, so a hung backend reads as offline within
//! one tick.

use crate::services::api_client::ApiClient;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    /// Initial state, before the first probe lands. Never republished.
    Checking,
    Online,
    Offline,
}

impl BackendStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BackendStatus::Checking => "checking",
            BackendStatus::Online => "online",
            BackendStatus::Offline => "offline",
        }
    }
}

pub struct HealthMonitor {
    client: ApiClient,
}

impl HealthMonitor {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One probe: any successful response is online, anything else
    /// (timeout included) is offline.
    pub async fn probe(&self) -> BackendStatus {
        match self.client.health().await {
            Ok(()) => BackendStatus::Online,
            Err(err) => {
                debug!("health probe failed: {}", err);
                BackendStatus::Offline
            }
        }
    }

    /// Poll until every receiver is gone, sending only transitions. The
    /// first probe fires immediately, then one per interval.
    pub async fn run(self, status_tx: watch::Sender<BackendStatus>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            if status_tx.is_closed() {
                break;
            }
            let status = self.probe().await;
            status_tx.send_if_modified(|current| {
                if *current == status {
                    return false;
                }
                info!("backend is {}", status.label());
                *current = status;
                true
            });
        }
    }
}
