//! Order workflow
//!
//! `create_order` claims bikes, prices the order and persists Payment,
//! Order, OrderDetails and History in one transaction, then asks the
//! gateway for a checkout URL. The gateway call sits outside the
//! transaction; when it fails the order is canceled in a second
//! transaction and its bikes are released. Once the checkout exists the
//! URL is always returned, even if storing it on the payment fails.
//!
//! `complete_return` moves a rented order to `done` and frees its bikes.

pub mod pricing;

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Bike, CreateOrderRequest, CreateOrderResponse, History, Order, OrderDetail, OrderView,
    Payment, PaymentStatus, RentStatus,
};
use shared::util::now_millis;
use validator::Validate;

use crate::db::{ClaimOutcome, RentalStore, RentalTx, RepoError};
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{CheckoutRequest, PaymentGateway};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Reject malformed requests before any side effect
fn validate_request(req: &CreateOrderRequest) -> Result<(), AppError> {
    if req.bike_ids.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if let Some(dup) = req.duplicate_bike() {
        return Err(AppError::new(ErrorCode::OrderDuplicateBike).with_detail("bike_id", dup));
    }
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

/// Set every bike of `order_id` back to available
pub(crate) async fn release_order_bikes(
    tx: &mut dyn RentalTx,
    order_id: &str,
    now: i64,
) -> ServiceResult<usize> {
    let details = tx.find_order_details(order_id).await?;
    for detail in &details {
        tx.release_bike(&detail.bike_id, now)
            .await
            .map_err(|e| -> ServiceError {
                match e {
                    RepoError::NotFound(_) => AppError::new(ErrorCode::BikeNotFound)
                        .with_detail("bike_id", detail.bike_id.clone())
                        .into(),
                    other => other.into(),
                }
            })?;
    }
    Ok(details.len())
}

#[derive(Clone)]
pub struct OrderWorkflow {
    store: Arc<dyn RentalStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl OrderWorkflow {
    pub fn new(store: Arc<dyn RentalStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Reserve bikes, persist the order and open a hosted checkout
    pub async fn create_order(&self, req: CreateOrderRequest) -> ServiceResult<CreateOrderResponse> {
        validate_request(&req)?;

        let now = now_millis();
        let mut tx = self.store.begin().await?;

        let customer = tx.find_user(&req.customer_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::UserNotFound)
                .with_detail("customer_id", req.customer_id.clone())
        })?;

        // Claim in input order; any failure drops `tx` and rolls back earlier claims
        let mut bikes: Vec<Bike> = Vec::with_capacity(req.bike_ids.len());
        for bike_id in &req.bike_ids {
            let outcome = tx
                .claim_bike(bike_id, now)
                .await
                .map_err(|e| -> ServiceError {
                    match e {
                        // Lost a lock race against another order
                        RepoError::Conflict(_) => AppError::new(ErrorCode::BikeUnavailable)
                            .with_detail("bike_id", bike_id.clone())
                            .into(),
                        other => other.into(),
                    }
                })?;
            match outcome {
                ClaimOutcome::Claimed(bike) => bikes.push(bike),
                ClaimOutcome::Unavailable => {
                    return Err(AppError::new(ErrorCode::BikeUnavailable)
                        .with_detail("bike_id", bike_id.clone())
                        .into());
                }
                ClaimOutcome::Missing => {
                    return Err(AppError::new(ErrorCode::BikeNotFound)
                        .with_detail("bike_id", bike_id.clone())
                        .into());
                }
            }
        }

        let total = pricing::total_price(&bikes, req.total_hour)?;
        let items = pricing::checkout_items(&bikes, req.total_hour)?;
        let gross_amount = pricing::gross_amount(&items)?;

        // The payment records what the gateway charges
        let mut payment = Payment {
            id: new_id(),
            payment_status: PaymentStatus::Pending,
            payment_type: req.payment_type.clone(),
            payment_link: None,
            amount: Decimal::from(gross_amount),
            created_at: now,
            updated_at: now,
        };
        tx.insert_payment(&payment).await?;

        let order = Order {
            id: new_id(),
            user_id: customer.id.clone(),
            payment_id: payment.id.clone(),
            total_payment: total,
            total_qty: bikes.len() as i32,
            total_hour: req.total_hour,
            created_at: now,
            updated_at: now,
        };
        tx.insert_order(&order).await?;

        for bike in &bikes {
            tx.insert_order_detail(&OrderDetail {
                id: new_id(),
                order_id: order.id.clone(),
                bike_id: bike.id.clone(),
            })
            .await?;
        }

        tx.insert_history(&History {
            id: new_id(),
            order_id: order.id.clone(),
            rent_status: RentStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        })
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            customer_id = %customer.id,
            bikes = bikes.len(),
            total = %total,
            "Order created"
        );

        let checkout = CheckoutRequest {
            order_id: order.id.clone(),
            gross_amount,
            customer_email: customer.email.clone(),
            customer_phone: customer.phone.clone(),
            items,
        };

        let url = match self.gateway.create_checkout(&checkout).await {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(
                    order_id = %order.id,
                    error = %err,
                    "Checkout creation failed, canceling order"
                );
                if let Err(e) = self.cancel_unpaid(&order.id).await {
                    tracing::error!(
                        order_id = %order.id,
                        error = ?e,
                        "Failed to cancel order after checkout failure"
                    );
                }
                let app: AppError = err.into();
                return Err(app.with_detail("order_id", order.id).into());
            }
        };

        let linked_at = now_millis();
        match self.store_payment_link(&payment.id, &url, linked_at).await {
            Ok(()) => payment.updated_at = linked_at,
            Err(e) => tracing::warn!(
                order_id = %order.id,
                error = ?e,
                "Failed to store payment link, returning it anyway"
            ),
        }
        payment.payment_link = Some(url.clone());

        Ok(CreateOrderResponse {
            order_id: order.id,
            total_payments: total,
            payments: payment,
            payment_link: url,
        })
    }

    async fn store_payment_link(&self, payment_id: &str, url: &str, now: i64) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.set_payment_link(payment_id, url, now).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Compensation for a failed checkout: cancel payment and rental, free bikes
    async fn cancel_unpaid(&self, order_id: &str) -> ServiceResult<()> {
        let now = now_millis();
        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        let payment = tx
            .find_payment(&order.payment_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        let history = tx
            .find_history_by_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::HistoryNotFound))?;

        if payment.payment_status.is_terminal()
            || !history.rent_status.can_transition_to(RentStatus::Canceled)
        {
            return Ok(());
        }

        tx.update_payment(&payment.id, PaymentStatus::Cancel, &payment.payment_type, now)
            .await?;
        tx.update_rent_status(&history.id, RentStatus::Canceled, now)
            .await?;
        let released = release_order_bikes(&mut *tx, order_id, now).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, released, "Order canceled after checkout failure");
        Ok(())
    }

    /// Return the bikes of a rented order
    pub async fn complete_return(&self, order_id: &str) -> ServiceResult<History> {
        let now = now_millis();
        let mut tx = self.store.begin().await?;

        tx.lock_order(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
        })?;
        let mut history = tx.find_history_by_order(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::HistoryNotFound).with_detail("order_id", order_id)
        })?;

        let current = history.rent_status;
        if current == RentStatus::Done {
            tracing::info!(order_id = %order_id, "Order already returned");
            return Ok(history);
        }
        if !current.can_transition_to(RentStatus::Done) {
            return Err(AppError::with_message(
                ErrorCode::RentalStatusConflict,
                format!("Cannot return an order in status '{current}'"),
            )
            .with_detail("order_id", order_id)
            .with_detail("rent_status", current.as_db())
            .into());
        }

        let released = release_order_bikes(&mut *tx, order_id, now).await?;
        tx.update_rent_status(&history.id, RentStatus::Done, now)
            .await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, released, "Bikes returned");

        history.rent_status = RentStatus::Done;
        history.updated_at = now;
        Ok(history)
    }

    /// Order with its line items, payment and rental history
    pub async fn get_order(&self, order_id: &str) -> ServiceResult<OrderView> {
        let order = self.store.find_order(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
        })?;
        let payment = self
            .store
            .find_payment(&order.payment_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        let history = self
            .store
            .find_history_by_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::HistoryNotFound))?;
        let bike_ids = self
            .store
            .find_order_details(order_id)
            .await?
            .into_iter()
            .map(|d| d.bike_id)
            .collect();

        Ok(OrderView {
            order,
            bike_ids,
            payment,
            history,
        })
    }
}
