//! 系统 API 处理器
//!
//! 健康检查、就绪检查与内部运维接口

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::api::error::Result;
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::service::ExpireSweepResponse;

/// 存活检查
///
/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "order-management"
    }))
}

/// 就绪检查（数据库可用）
///
/// GET /ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            warn!(error = %e, "数据库就绪检查失败");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "database": "unavailable" })),
            )
        }
    }
}

/// 手动触发过期订单清理
///
/// POST /api/internal/orders/expire
pub async fn expire_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpireSweepResponse>>> {
    let cancelled_count = state
        .expiration_service
        .cancel_expired_orders(state.settings.reaper_batch_size)
        .await?;

    info!(cancelled_count, "手动触发过期订单清理完成");

    Ok(Json(ApiResponse::success(ExpireSweepResponse {
        cancelled_count,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "order-management");
    }
}
