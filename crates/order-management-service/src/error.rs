//! 订单服务错误类型
//!
//! 定义订单、支付审核、积分账本的业务错误和系统错误

use thiserror::Error;

/// 订单服务错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    // === 下单相关错误 ===
    #[error("购物车为空: buyer_id={buyer_id}, seller_id={seller_id}")]
    EmptyCart { buyer_id: String, seller_id: String },

    #[error("商品已下架或库存不足: product_id={0}")]
    ProductUnavailable(i64),

    // === 订单与支付 ===
    #[error("订单不存在: {0}")]
    OrderNotFound(i64),

    #[error("支付记录不存在: {0}")]
    PaymentNotFound(i64),

    #[error("订单状态不允许此操作: order_id={order_id}, {reason}")]
    OrderNotEligible { order_id: i64, reason: String },

    #[error("缺少有效的转账凭证")]
    InvalidAttachment,

    #[error("无权操作该订单: {0}")]
    Forbidden(String),

    // === 积分相关错误 ===
    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("抵扣金额超出订单允许范围: discount={discount_cents}, max={max_discount_cents}")]
    DiscountExceedsOrder {
        discount_cents: i64,
        max_discount_cents: i64,
    },

    #[error("订单已使用积分抵扣: order_id={0}")]
    AlreadyRedeemed(i64),

    #[error("商家积分计划未启用: seller_id={0}")]
    RewardsInactive(String),

    // === 系统错误 ===
    #[error("并发冲突，请重试")]
    ConcurrentModification,

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 订单服务 Result 类型别名
pub type Result<T> = std::result::Result<T, OrderError>;

impl OrderError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::ConcurrentModification)
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Migration(_)
                | Self::Internal(_)
                | Self::ConcurrentModification
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCart { .. } => "EMPTY_CART",
            Self::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::OrderNotEligible { .. } => "ORDER_NOT_ELIGIBLE",
            Self::InvalidAttachment => "INVALID_ATTACHMENT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::DiscountExceedsOrder { .. } => "DISCOUNT_EXCEEDS_ORDER",
            Self::AlreadyRedeemed(_) => "ALREADY_REDEEMED",
            Self::RewardsInactive(_) => "REWARDS_INACTIVE",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn not_eligible(order_id: i64, reason: impl Into<String>) -> Self {
        Self::OrderNotEligible {
            order_id,
            reason: reason.into(),
        }
    }
}
