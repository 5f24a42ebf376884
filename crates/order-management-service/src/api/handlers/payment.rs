//! 支付 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::error::Result;
use crate::api::request::{UploadReceiptBody, ValidateReceiptBody};
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::service::{UploadReceiptResponse, ValidateReceiptResponse};

/// 上传转账凭证
///
/// POST /api/v1/orders/{id}/receipt
pub async fn upload_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<UploadReceiptBody>,
) -> Result<Json<ApiResponse<UploadReceiptResponse>>> {
    body.validate()?;

    let response = state
        .payment_service
        .upload_receipt(body.into_request(order_id))
        .await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 审核转账凭证
///
/// POST /api/v1/payments/{id}/validate
pub async fn validate_receipt(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
    Json(body): Json<ValidateReceiptBody>,
) -> Result<Json<ApiResponse<ValidateReceiptResponse>>> {
    body.validate()?;

    let response = state
        .payment_service
        .validate_receipt(body.into_request(payment_id))
        .await?;
    Ok(Json(ApiResponse::success(response)))
}
