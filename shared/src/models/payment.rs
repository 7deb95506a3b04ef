//! Payment Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Payment status, mirrored from the gateway vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Checkout created, money not moved yet
    #[default]
    Pending,
    /// Money captured
    Settlement,
    /// Rejected by the gateway or its fraud screening
    Deny,
    /// Canceled before settlement
    Cancel,
    /// Checkout expired unpaid
    Expire,
}

impl PaymentStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "settlement" => Some(Self::Settlement),
            "deny" => Some(Self::Deny),
            "cancel" => Some(Self::Cancel),
            "expire" => Some(Self::Expire),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settlement => "settlement",
            Self::Deny => "deny",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
        }
    }

    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Payment entity (1:1 with an order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub payment_status: PaymentStatus,
    pub payment_type: String,
    /// Hosted checkout URL returned by the gateway
    pub payment_link: Option<String>,
    /// Gross amount in currency unit
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Asynchronous payment notification pushed by the gateway
///
/// Only `order_id` is trusted: the handler re-queries the gateway for the
/// authoritative status, the remaining fields are kept for logging.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentNotification {
    #[validate(length(min = 1, message = "order_id is required"))]
    pub order_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
}
