//! Core data models for the CloudBox client.
//!
//! `ImageRecord` mirrors the metadata service's wire format; `Credential`
//! is the locally stored sign-in record. Both serialize naturally as JSON
//! via `serde`, and `Credential` maps to the local SQLite store via
//! `sqlx::FromRow`.

pub mod auth;
pub mod image;
