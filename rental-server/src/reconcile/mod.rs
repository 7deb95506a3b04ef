//! Payment notification reconciliation
//!
//! The notification body is only a trigger. The authoritative status is
//! re-queried from the gateway, mapped through [`GatewayOutcome`] and
//! applied to Payment and History in one transaction.
//!
//! Transitions only leave `pending payment`. Repeating a notification
//! refreshes `payment_type` and nothing else; a notification contradicting
//! a settled state is logged and dropped.

pub mod mapping;

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::RentStatus;
use shared::util::now_millis;

use crate::db::RentalStore;
use crate::error::ServiceResult;
use crate::gateway::PaymentGateway;
use crate::orders::release_order_bikes;

pub use mapping::GatewayOutcome;

/// What a notification did to local state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Status moved forward
    Applied,
    /// Already in the target state; payment type refreshed
    Refreshed,
    /// Unrecognized or conflicting status; nothing written
    Ignored,
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn RentalStore>,
    gateway: Arc<dyn PaymentGateway>,
    release_bikes_on_failure: bool,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn RentalStore>,
        gateway: Arc<dyn PaymentGateway>,
        release_bikes_on_failure: bool,
    ) -> Self {
        Self {
            store,
            gateway,
            release_bikes_on_failure,
        }
    }

    /// Reconcile one order against the gateway's view of its transaction
    pub async fn notify(&self, order_id: &str) -> ServiceResult<NotifyOutcome> {
        let status = self.gateway.transaction_status(order_id).await?;
        let outcome =
            GatewayOutcome::parse(&status.transaction_status, status.fraud_status.as_deref());

        let now = now_millis();
        let mut tx = self.store.begin().await?;

        let order = tx.lock_order(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
        })?;
        let payment = tx.find_payment(&order.payment_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::PaymentNotFound).with_detail("order_id", order_id)
        })?;
        let history = tx.find_history_by_order(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::HistoryNotFound).with_detail("order_id", order_id)
        })?;

        let Some((target_payment, target_rent)) = outcome.target() else {
            tracing::warn!(
                order_id = %order_id,
                transaction_status = %status.transaction_status,
                fraud_status = ?status.fraud_status,
                "Unrecognized gateway status, leaving order unchanged"
            );
            return Ok(NotifyOutcome::Ignored);
        };

        let payment_type = status
            .payment_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| payment.payment_type.clone());

        let already_applied = payment.payment_status == target_payment
            && match target_rent {
                None => true,
                // A returned rental still reflects its settlement
                Some(RentStatus::Rented) => {
                    matches!(history.rent_status, RentStatus::Rented | RentStatus::Done)
                }
                Some(rent) => history.rent_status == rent,
            };

        if already_applied {
            tx.update_payment(&payment.id, target_payment, &payment_type, now)
                .await?;
            tx.commit().await?;
            tracing::info!(
                order_id = %order_id,
                payment_status = %target_payment,
                "Duplicate notification, payment type refreshed"
            );
            return Ok(NotifyOutcome::Refreshed);
        }

        let open = !payment.payment_status.is_terminal()
            && target_rent.is_none_or(|rent| history.rent_status.can_transition_to(rent));
        if !open {
            tracing::warn!(
                order_id = %order_id,
                payment_status = %payment.payment_status,
                rent_status = %history.rent_status,
                gateway_status = %status.transaction_status,
                "Notification conflicts with settled order state, ignored"
            );
            return Ok(NotifyOutcome::Ignored);
        }

        tx.update_payment(&payment.id, target_payment, &payment_type, now)
            .await?;

        let mut released = 0;
        if let Some(rent) = target_rent {
            tx.update_rent_status(&history.id, rent, now).await?;
            if rent.is_failed() && self.release_bikes_on_failure {
                released = release_order_bikes(&mut *tx, order_id, now).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            payment_status = %target_payment,
            rent_status = ?target_rent,
            released,
            "Payment status reconciled"
        );
        Ok(NotifyOutcome::Applied)
    }
}
