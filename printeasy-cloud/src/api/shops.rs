//! Shop endpoints: public storefront reads, owner availability toggle

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::availability::UnifiedStatus;
use shared::error::ApiResponse;
use shared::models::{Order, Shop, UserIdentity};

use super::ApiResult;
use crate::services;
use crate::state::AppState;

/// GET /api/shops/{id} — public storefront info
pub async fn get_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
) -> ApiResult<Shop> {
    let shop = services::shops::get(state.store.as_ref(), shop_id).await?;
    Ok(Json(ApiResponse::success(shop)))
}

/// GET /api/shops/{id}/status — unified availability verdict, derived fresh
pub async fn get_status(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
) -> ApiResult<UnifiedStatus> {
    let status = services::shops::status(state.store.as_ref(), shop_id).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// GET /api/shops/{id}/orders — owner or admin view
pub async fn list_shop_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(shop_id): Path<i64>,
) -> ApiResult<Vec<Order>> {
    let orders =
        services::orders::list_for_shop(state.store.as_ref(), identity, shop_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineToggle {
    pub is_online: bool,
}

/// PATCH /api/shops/{id}/online — manual availability switch, answers with
/// the freshly derived verdict
pub async fn toggle_online(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(shop_id): Path<i64>,
    Json(payload): Json<OnlineToggle>,
) -> ApiResult<UnifiedStatus> {
    let status = services::shops::toggle_online(
        state.store.as_ref(),
        &state.dispatcher,
        identity,
        shop_id,
        payload.is_online,
    )
    .await?;
    Ok(Json(ApiResponse::success(status)))
}
