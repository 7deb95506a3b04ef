//! Gateway status vocabulary → local Payment / History state

use shared::models::{PaymentStatus, RentStatus};

/// Parsed gateway transaction outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// `settlement` cleared by fraud screening
    Settled,
    Denied,
    Canceled,
    Expired,
    Pending,
    /// Anything else, including settlement under fraud review
    Unrecognized,
}

impl GatewayOutcome {
    /// A settlement without a fraud verdict counts as accepted; any
    /// verdict other than `accept` holds it back.
    pub fn parse(transaction_status: &str, fraud_status: Option<&str>) -> Self {
        match transaction_status {
            "settlement" => match fraud_status {
                None | Some("accept") => Self::Settled,
                Some(_) => Self::Unrecognized,
            },
            "deny" => Self::Denied,
            "cancel" => Self::Canceled,
            // Midtrans sends `expire`; `expired` is accepted as a spelling variant
            "expire" | "expired" => Self::Expired,
            "pending" => Self::Pending,
            _ => Self::Unrecognized,
        }
    }

    /// Target Payment status, and History status when it changes
    pub fn target(&self) -> Option<(PaymentStatus, Option<RentStatus>)> {
        match self {
            Self::Settled => Some((PaymentStatus::Settlement, Some(RentStatus::Rented))),
            Self::Denied => Some((PaymentStatus::Deny, Some(RentStatus::Denied))),
            Self::Canceled => Some((PaymentStatus::Cancel, Some(RentStatus::Canceled))),
            Self::Expired => Some((PaymentStatus::Expire, Some(RentStatus::Canceled))),
            Self::Pending => Some((PaymentStatus::Pending, None)),
            Self::Unrecognized => None,
        }
    }
}
