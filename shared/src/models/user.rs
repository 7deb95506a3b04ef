//! User Model

use serde::{Deserialize, Serialize};

/// Customer account, read-only from the order flow's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub fullname: String,
    pub phone: String,
    pub address: String,
    pub role: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}
