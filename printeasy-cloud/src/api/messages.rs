//! Order chat endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::{Message, MessageCreate, UserIdentity};

use super::ApiResult;
use crate::services;
use crate::state::AppState;

/// GET /api/orders/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Vec<Message>> {
    let messages = services::messages::list(state.store.as_ref(), identity, order_id).await?;
    Ok(Json(ApiResponse::success(messages)))
}

/// POST /api/orders/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
    Json(payload): Json<MessageCreate>,
) -> ApiResult<Message> {
    let message = services::messages::post(
        state.store.as_ref(),
        &state.dispatcher,
        identity,
        order_id,
        payload,
    )
    .await?;
    Ok(Json(ApiResponse::success(message)))
}
