//! API 错误类型
//!
//! 将服务层错误映射为 HTTP 状态码与统一错误响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::OrderError;

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("参数验证失败: {0}")]
    Validation(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        let Self::Order(err) = self else {
            return StatusCode::BAD_REQUEST;
        };

        match err {
            OrderError::OrderNotFound(_) | OrderError::PaymentNotFound(_) => StatusCode::NOT_FOUND,

            OrderError::OrderNotEligible { .. }
            | OrderError::AlreadyRedeemed(_)
            | OrderError::ConcurrentModification => StatusCode::CONFLICT,

            OrderError::EmptyCart { .. }
            | OrderError::ProductUnavailable(_)
            | OrderError::InvalidAttachment
            | OrderError::InsufficientPoints { .. }
            | OrderError::DiscountExceedsOrder { .. }
            | OrderError::RewardsInactive(_) => StatusCode::UNPROCESSABLE_ENTITY,

            OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
            OrderError::Validation(_) => StatusCode::BAD_REQUEST,

            OrderError::Database(_) | OrderError::Migration(_) | OrderError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Order(err) => err.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Order(OrderError::Database(e)) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Order(OrderError::Migration(e)) => {
                tracing::error!(error = %e, "数据库迁移失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Order(OrderError::Internal(e)) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Handler Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
