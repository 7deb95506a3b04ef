//! Bike Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bike entity
///
/// `is_available` is the reservation flag: `false` while the bike belongs
/// to an active order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Bike {
    pub id: String,
    pub renter_id: String,
    pub category_id: String,
    /// Category display name (joined from `categories`)
    #[serde(default)]
    pub category_name: String,
    pub name: String,
    /// Rental price per hour in currency unit
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_hour: Decimal,
    pub condition: String,
    pub description: String,
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
