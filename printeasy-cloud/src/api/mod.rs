//! API routes for printeasy-cloud

pub mod health;
pub mod messages;
pub mod orders;
pub mod shops;
pub mod ws;

use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use shared::error::{ApiResponse, AppError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

/// Handler result: enveloped payload or an error with its code
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public storefront reads + WebSocket (does its own token check)
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/shops/{id}", get(shops::get_shop))
        .route("/api/shops/{id}/status", get(shops::get_status))
        .route("/api/ws", get(ws::handle_ws));

    // Everything else requires a valid user token
    let protected = Router::new()
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_my_orders),
        )
        .route(
            "/api/orders/{id}",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/api/orders/{id}/status", patch(orders::update_status))
        .route(
            "/api/orders/{id}/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        .route("/api/shops/{id}/orders", get(shops::list_shop_orders))
        .route("/api/shops/{id}/online", patch(shops::toggle_online))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
