//! Data models
//!
//! Shared between the rental server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUID strings.

pub mod bike;
pub mod history;
pub mod order;
pub mod payment;
pub mod user;

// Re-exports
pub use bike::*;
pub use history::*;
pub use order::*;
pub use payment::*;
pub use user::*;
