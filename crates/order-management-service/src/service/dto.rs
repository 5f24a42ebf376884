//! 服务层数据传输对象
//!
//! 定义各业务操作的入参与返回值，与持久化模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus, PointsBalance,
    Redemption, TransferMetadata,
};

// ==================== 下单 ====================

/// 下单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub buyer_id: String,
    pub seller_id: String,
    pub payment_method: PaymentMethod,
    /// 付款期限（分钟），为空时使用配置默认值
    #[serde(default)]
    pub expiration_minutes: Option<i64>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_notes: Option<String>,
}

impl PlaceOrderRequest {
    pub fn new(
        buyer_id: impl Into<String>,
        seller_id: impl Into<String>,
        payment_method: PaymentMethod,
        expiration_minutes: Option<i64>,
    ) -> Self {
        Self {
            buyer_id: buyer_id.into(),
            seller_id: seller_id.into(),
            payment_method,
            expiration_minutes,
            delivery_address: None,
            delivery_notes: None,
        }
    }
}

/// 下单结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: i64,
    pub order_no: String,
    pub payment_id: i64,
    pub total_cents: i64,
    pub expires_at: DateTime<Utc>,
}

// ==================== 支付审核 ====================

/// 上传转账凭证请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptRequest {
    pub order_id: i64,
    pub receipt_ref: String,
    #[serde(default)]
    pub transfer_metadata: Option<TransferMetadata>,
}

/// 上传转账凭证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceiptResponse {
    pub payment_id: i64,
    pub status: PaymentStatus,
}

/// 审核转账凭证请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReceiptRequest {
    pub payment_id: i64,
    /// 审核人，必须为订单所属商家
    pub reviewer_id: String,
    pub approved: bool,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// 审核结果
///
/// 对已审核的支付重复调用时 `already_reviewed = true`，返回既有结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateReceiptResponse {
    pub payment_id: i64,
    pub order_id: i64,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// 该订单确认收款时发放的积分
    pub points_awarded: i64,
    pub already_reviewed: bool,
}

impl ValidateReceiptResponse {
    /// 由当前持久化状态构造（无副作用的重复调用）
    ///
    /// `points_awarded` 为确认收款时已发放的积分
    pub fn settled(payment: &Payment, order: &Order, points_awarded: i64) -> Self {
        Self {
            payment_id: payment.id,
            order_id: order.id,
            payment_status: payment.status,
            order_status: order.status,
            points_awarded,
            already_reviewed: true,
        }
    }
}

// ==================== 履约 ====================

/// 履约状态变更结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentResponse {
    pub order_id: i64,
    pub status: OrderStatus,
}

// ==================== 积分 ====================

/// 积分抵扣请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsRequest {
    pub order_id: i64,
    pub seller_id: String,
    pub points_to_use: i64,
}

/// 积分抵扣结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsResponse {
    pub redemption_id: i64,
    pub order_id: i64,
    pub points_used: i64,
    pub discount_cents: i64,
    pub new_total_cents: i64,
    pub new_balance: i64,
}

/// 积分抵扣资格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionEligibility {
    pub order_id: i64,
    pub can_redeem: bool,
    pub available_points: i64,
    pub max_points_usable: i64,
    pub max_discount_cents: i64,
    /// 每积分抵扣金额，积分计划未启用时为 0
    pub point_value_cents: i64,
    /// 不可抵扣原因（错误码）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RedemptionEligibility {
    /// 不可抵扣
    pub fn ineligible(order_id: i64, available_points: i64, reason: &str) -> Self {
        Self {
            order_id,
            can_redeem: false,
            available_points,
            max_points_usable: 0,
            max_discount_cents: 0,
            point_value_cents: 0,
            reason: Some(reason.to_string()),
        }
    }
}

/// 积分余额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsBalanceDto {
    pub user_id: String,
    pub seller_id: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
}

impl PointsBalanceDto {
    /// 无积分记录时的零余额
    pub fn empty(user_id: &str, seller_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            seller_id: seller_id.to_string(),
            balance: 0,
            total_earned: 0,
            total_spent: 0,
        }
    }
}

impl From<PointsBalance> for PointsBalanceDto {
    fn from(balance: PointsBalance) -> Self {
        Self {
            user_id: balance.user_id,
            seller_id: balance.seller_id,
            balance: balance.balance,
            total_earned: balance.total_earned,
            total_spent: balance.total_spent,
        }
    }
}

// ==================== 查询 ====================

/// 订单详情
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailDto {
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption: Option<Redemption>,
}

/// 过期清理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireSweepResponse {
    pub cancelled_count: u64,
}
