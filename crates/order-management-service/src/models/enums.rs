//! 订单服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化，
//! 数据库中以小写下划线字符串存储

use serde::{Deserialize, Serialize};

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// 货到付款 - 无凭证，由商家直接确认收款
    Cash,
    /// 银行转账 - 买家上传转账凭证后由商家审核
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
        }
    }
}

/// 订单状态
///
/// 主流程：placed -> seller_confirmed -> delivered -> buyer_confirmed_received -> completed；
/// 仅 placed 状态可被过期清理转为 cancelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum OrderStatus {
    /// 已下单，等待付款确认
    #[default]
    Placed,
    /// 商家已确认收款
    SellerConfirmed,
    /// 商家已送达
    Delivered,
    /// 买家已确认收货
    BuyerConfirmedReceived,
    /// 已完成
    Completed,
    /// 已取消（仅由过期清理产生）
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::SellerConfirmed => "seller_confirmed",
            Self::Delivered => "delivered",
            Self::BuyerConfirmedReceived => "buyer_confirmed_received",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// 检查状态迁移是否合法
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Placed, Self::SellerConfirmed)
                | (Self::Placed, Self::Cancelled)
                | (Self::SellerConfirmed, Self::Delivered)
                | (Self::Delivered, Self::BuyerConfirmedReceived)
                | (Self::BuyerConfirmedReceived, Self::Completed)
        )
    }

    /// 是否允许使用积分抵扣（履约开始前）
    pub fn allows_redemption(&self) -> bool {
        matches!(self, Self::Placed | Self::SellerConfirmed)
    }
}

/// 支付状态
///
/// pending -> pending_review -> {confirmed | rejected}；
/// rejected 后买家可重新上传凭证回到 pending_review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PaymentStatus {
    /// 待付款
    #[default]
    Pending,
    /// 凭证待审核
    PendingReview,
    /// 已确认
    Confirmed,
    /// 已拒绝
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingReview => "pending_review",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    /// 是否已审核（确认或拒绝）
    pub fn is_reviewed(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }

    /// 是否允许上传（或重新上传）转账凭证
    pub fn accepts_receipt(&self) -> bool {
        !matches!(self, Self::Confirmed)
    }

    /// 指定支付方式下是否可以进入审核
    ///
    /// 转账必须先上传凭证；现金支付无凭证，可直接由商家确认
    pub fn is_reviewable(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Transfer => matches!(self, Self::PendingReview),
            PaymentMethod::Cash => matches!(self, Self::Pending | Self::PendingReview),
        }
    }
}

/// 积分流水类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum PointsTransactionType {
    /// 获得（+）
    Earned,
    /// 消耗（-）
    Spent,
}

impl PointsTransactionType {
    /// 返回该流水类型的数量符号
    pub fn sign(&self) -> i64 {
        match self {
            Self::Earned => 1,
            Self::Spent => -1,
        }
    }
}

/// 积分抵扣状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum RedemptionStatus {
    /// 已生效
    Applied,
    /// 已撤销（订单取消时退回积分）
    Reversed,
}
