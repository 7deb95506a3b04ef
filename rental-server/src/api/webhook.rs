//! Midtrans notification handler
//!
//! POST /api/v1/webhook/midtrans - payment status push.
//! The body only names the order; the status itself is re-queried from
//! Midtrans, so forged or stale payloads cannot move an order.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use shared::error::{ApiResponse, AppError};
use shared::models::PaymentNotification;
use validator::Validate;

use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn handle_notification(
    State(state): State<AppState>,
    payload: Result<Json<PaymentNotification>, JsonRejection>,
) -> ServiceResult<ApiResponse<()>> {
    let Json(notification) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    notification
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    tracing::info!(
        order_id = %notification.order_id,
        transaction_status = ?notification.transaction_status,
        "Received Midtrans notification"
    );

    let outcome = state.reconciler.notify(&notification.order_id).await?;
    tracing::debug!(order_id = %notification.order_id, ?outcome, "Notification handled");

    Ok(ApiResponse::ok_with_message(
        "success update transaction status",
    ))
}
