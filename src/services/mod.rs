//! Service layer: the API client and the flows built on top of it, plus
//! the store-backed authentication simulation.

pub mod api_client;
pub mod auth_service;
pub mod gallery_service;
pub mod health_service;
pub mod upload_service;
