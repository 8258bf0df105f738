//! Client-side core of the CloudBox photo app: the gallery view pipeline,
//! upload orchestration, simulated authentication over a local store, the
//! metadata-service API client, and the backend health monitor.
//!
//! The binary in `main.rs` is a thin CLI over these modules; everything
//! here is usable (and tested) as a library.

pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod view;
