//! Order endpoints: create, list, detail, status advance, soft delete

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::error::ApiResponse;
use shared::models::{Order, OrderCreate, OrderStatus, UserIdentity};

use super::ApiResult;
use crate::services;
use crate::state::AppState;

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<Order> {
    let order = services::orders::create(
        state.store.as_ref(),
        &state.dispatcher,
        identity,
        payload,
    )
    .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders — the caller's own orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<Order>> {
    let orders = services::orders::list_for_customer(state.store.as_ref(), identity).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = services::orders::get(state.store.as_ref(), identity, order_id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> ApiResult<Order> {
    let order = services::orders::transition(
        state.store.as_ref(),
        &state.dispatcher,
        identity,
        order_id,
        payload.status,
    )
    .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// DELETE /api/orders/{id} — soft delete, answers with the marked row
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order =
        services::orders::soft_delete(state.store.as_ref(), &state.dispatcher, identity, order_id)
            .await?;
    Ok(Json(ApiResponse::success(order)))
}
