//! Rental History Model

use serde::{Deserialize, Serialize};

/// Physical rental lifecycle of an order
///
/// ```text
/// pending payment ──┬──> rented ──> done
///                   ├──> denied
///                   └──> canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RentStatus {
    #[default]
    #[serde(rename = "pending payment")]
    PendingPayment,
    #[serde(rename = "rented")]
    Rented,
    #[serde(rename = "denied")]
    Denied,
    #[serde(rename = "canceled")]
    Canceled,
    #[serde(rename = "done")]
    Done,
}

impl RentStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending payment" => Some(Self::PendingPayment),
            "rented" => Some(Self::Rented),
            "denied" => Some(Self::Denied),
            "canceled" => Some(Self::Canceled),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending payment",
            Self::Rented => "rented",
            Self::Denied => "denied",
            Self::Canceled => "canceled",
            Self::Done => "done",
        }
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: RentStatus) -> bool {
        matches!(
            (self, next),
            (
                Self::PendingPayment,
                Self::Rented | Self::Denied | Self::Canceled
            ) | (Self::Rented, Self::Done)
        )
    }

    /// The rental ended without the customer ever getting the bikes
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Denied | Self::Canceled)
    }
}

impl std::fmt::Display for RentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// History entity (1:1 with an order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub id: String,
    pub order_id: String,
    pub rent_status: RentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
