//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::history::History;
use super::payment::Payment;

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub payment_id: String,
    /// Σ price_per_hour × total_hour, fixed at creation
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payment: Decimal,
    /// Number of bikes
    pub total_qty: i32,
    pub total_hour: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item, one per reserved bike
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderDetail {
    pub id: String,
    pub order_id: String,
    pub bike_id: String,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "customer_id is required"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "bike_ids must not be empty"))]
    pub bike_ids: Vec<String>,
    /// Rental length, at most 30 days
    #[validate(range(min = 1, max = 720, message = "total_hour must be between 1 and 720"))]
    pub total_hour: i32,
    #[validate(length(min = 1, message = "payment_type is required"))]
    pub payment_type: String,
}

impl CreateOrderRequest {
    /// First bike id that appears more than once, if any
    pub fn duplicate_bike(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.bike_ids
            .iter()
            .find(|id| !seen.insert(id.as_str()))
            .map(String::as_str)
    }
}

/// Checkout response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payments: Decimal,
    pub payments: Payment,
    /// Hosted checkout URL the customer is redirected to
    pub payment_link: String,
}

/// Full order view: line items, payment and rental history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub bike_ids: Vec<String>,
    pub payment: Payment,
    pub history: History,
}
