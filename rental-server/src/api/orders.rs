//! Order API handlers
//!
//! POST /api/v1/orders              - reserve bikes, open checkout
//! GET  /api/v1/orders/{id}         - order with payment and history
//! POST /api/v1/orders/{id}/return  - return the bikes of a rented order

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use shared::error::{ApiResponse, AppError};
use shared::models::{CreateOrderRequest, CreateOrderResponse, History, OrderView};

use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, ApiResponse<CreateOrderResponse>)> {
    let Json(req) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let created = state.orders.create_order(req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Order created", created),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ServiceResult<ApiResponse<OrderView>> {
    let view = state.orders.get_order(&order_id).await?;
    Ok(ApiResponse::success(view))
}

pub async fn complete_return(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ServiceResult<ApiResponse<History>> {
    let history = state.orders.complete_return(&order_id).await?;
    Ok(ApiResponse::success_with_message("Bikes returned", history))
}
