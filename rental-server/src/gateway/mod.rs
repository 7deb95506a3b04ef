//! Payment gateway integration
//!
//! [`PaymentGateway`] is the seam between the order flow and the hosted
//! checkout provider. [`MidtransGateway`] is the production implementation.

pub mod midtrans;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

pub use midtrans::MidtransGateway;

/// Checkout line item (one per bike)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutItem {
    pub id: String,
    pub name: String,
    /// Unit price in whole currency units
    pub price: i64,
    /// Rental hours
    pub quantity: i32,
    pub category: String,
}

/// Hosted checkout request
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// External reference, equal to the local order id
    pub order_id: String,
    /// Whole currency units; must equal Σ price × quantity of `items`
    pub gross_amount: i64,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: Vec<CheckoutItem>,
}

/// Authoritative transaction state as reported by the gateway
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionStatus {
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Timeout or connection failure; retrying later may succeed
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),

    /// Gateway answered with a non-success status
    #[error("Payment gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Gateway answered with something we could not parse
    #[error("Malformed payment gateway response: {0}")]
    Malformed(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        let code = match &err {
            GatewayError::Unavailable(_) => ErrorCode::GatewayUnavailable,
            GatewayError::Rejected { .. } | GatewayError::Malformed(_) => ErrorCode::GatewayError,
        };
        let app = AppError::with_message(code, err.to_string());
        match err {
            GatewayError::Rejected { status, .. } => app.with_detail("gateway_status", status),
            _ => app,
        }
    }
}

/// Hosted-checkout payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout and return the URL the customer pays at
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<String, GatewayError>;

    /// Query the current transaction status for an order
    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, GatewayError>;
}
