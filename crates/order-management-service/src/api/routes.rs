//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::{handlers, state::AppState};

/// 构建订单相关路由
///
/// 包含下单、订单详情、凭证上传与履约流转
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(handlers::order::place_order))
        .route("/orders/{id}", get(handlers::order::get_order))
        .route("/orders/{id}/receipt", post(handlers::payment::upload_receipt))
        .route("/orders/{id}/delivery", post(handlers::order::confirm_delivery))
        .route(
            "/orders/{id}/receipt-confirmation",
            post(handlers::order::confirm_receipt),
        )
        .route("/orders/{id}/complete", post(handlers::order::complete_order))
}

/// 构建支付审核路由
fn payment_routes() -> Router<AppState> {
    Router::new().route(
        "/payments/{id}/validate",
        post(handlers::payment::validate_receipt),
    )
}

/// 构建积分相关路由
fn points_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders/{id}/redemption",
            post(handlers::points::redeem_points).get(handlers::points::get_order_redemption),
        )
        .route(
            "/orders/{id}/redemption-eligibility",
            get(handlers::points::get_redemption_eligibility),
        )
        .route(
            "/points/{user_id}/{seller_id}",
            get(handlers::points::get_points_balance),
        )
        .route(
            "/points/{user_id}/{seller_id}/history",
            get(handlers::points::get_points_history),
        )
}

/// 构建对外 API 路由（挂载于 /api/v1）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(order_routes())
        .merge(payment_routes())
        .merge(points_routes())
}

/// 构建内部运维路由（挂载于 /api/internal）
pub fn internal_routes() -> Router<AppState> {
    Router::new().route("/orders/expire", post(handlers::system::expire_orders))
}
