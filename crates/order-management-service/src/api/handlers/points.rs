//! 积分 API 处理器
//!
//! 积分抵扣、抵扣资格、余额与流水查询

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::api::error::Result;
use crate::api::request::{EligibilityQuery, HistoryQuery, RedeemPointsBody};
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::models::{PointsLedgerEntry, Redemption};
use crate::service::{PointsBalanceDto, RedeemPointsResponse, RedemptionEligibility};

/// 使用积分抵扣订单金额
///
/// POST /api/v1/orders/{id}/redemption
pub async fn redeem_points(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<RedeemPointsBody>,
) -> Result<Json<ApiResponse<RedeemPointsResponse>>> {
    body.validate()?;

    let response = state
        .loyalty_service
        .redeem_points(body.into_request(order_id))
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 查询订单生效中的积分抵扣
///
/// GET /api/v1/orders/{id}/redemption
pub async fn get_order_redemption(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<ApiResponse<Option<Redemption>>>> {
    let redemption = state.query_service.get_order_redemption(order_id).await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// 查询积分抵扣资格
///
/// GET /api/v1/orders/{id}/redemption-eligibility?sellerId=
pub async fn get_redemption_eligibility(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Query(query): Query<EligibilityQuery>,
) -> Result<Json<ApiResponse<RedemptionEligibility>>> {
    query.validate()?;

    let eligibility = state
        .query_service
        .get_redemption_eligibility(order_id, &query.seller_id)
        .await?;
    Ok(Json(ApiResponse::success(eligibility)))
}

/// 查询积分余额
///
/// GET /api/v1/points/{userId}/{sellerId}
pub async fn get_points_balance(
    State(state): State<AppState>,
    Path((user_id, seller_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PointsBalanceDto>>> {
    let balance = state
        .query_service
        .get_points_balance(&user_id, &seller_id)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// 查询积分流水
///
/// GET /api/v1/points/{userId}/{sellerId}/history?limit=
pub async fn get_points_history(
    State(state): State<AppState>,
    Path((user_id, seller_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<PointsLedgerEntry>>>> {
    let history = state
        .query_service
        .get_points_history(&user_id, &seller_id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(history)))
}
