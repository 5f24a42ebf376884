//! 订单 API 处理器
//!
//! 下单、订单详情与履约状态流转

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::error::Result;
use crate::api::request::{BuyerActionBody, PlaceOrderBody, SellerActionBody};
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::service::{FulfillmentResponse, OrderDetailDto, PlaceOrderResponse};

/// 下单
///
/// POST /api/v1/orders
pub async fn place_order(
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderBody>,
) -> Result<Json<ApiResponse<PlaceOrderResponse>>> {
    body.validate()?;

    let response = state.order_service.place_order(body.into()).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 订单详情
///
/// GET /api/v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetailDto>>> {
    let detail = state.query_service.get_order(order_id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 商家确认送达
///
/// POST /api/v1/orders/{id}/delivery
pub async fn confirm_delivery(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<SellerActionBody>,
) -> Result<Json<ApiResponse<FulfillmentResponse>>> {
    body.validate()?;

    let response = state
        .fulfillment_service
        .confirm_delivery(order_id, &body.seller_id)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 买家确认收货
///
/// POST /api/v1/orders/{id}/receipt-confirmation
pub async fn confirm_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<BuyerActionBody>,
) -> Result<Json<ApiResponse<FulfillmentResponse>>> {
    body.validate()?;

    let response = state
        .fulfillment_service
        .confirm_receipt(order_id, &body.buyer_id)
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 完成订单
///
/// POST /api/v1/orders/{id}/complete
pub async fn complete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<FulfillmentResponse>>> {
    let response = state.fulfillment_service.complete_order(order_id).await?;
    Ok(Json(ApiResponse::success(response)))
}
