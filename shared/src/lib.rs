//! Shared types for the bike rental backend
//!
//! Common types used by the server and its clients: the unified error
//! system, domain models and request/response DTOs.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
