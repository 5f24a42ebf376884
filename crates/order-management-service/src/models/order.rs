//! 订单相关实体定义
//!
//! 包含订单、订单明细以及下单时读取的购物车快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{OrderStatus, PaymentMethod, PaymentStatus};

/// 订单
///
/// 金额一律以最小货币单位（分）存储；创建后 total_cents 只会因积分抵扣而减少
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// 业务订单号
    pub order_no: String,
    pub buyer_id: String,
    pub seller_id: String,
    /// 下单时明细小计之和
    pub subtotal_cents: i64,
    /// 当前应付金额（扣除积分抵扣后）
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// 付款截止时间
    pub expires_at: DateTime<Utc>,
    #[sqlx(default)]
    pub delivery_address: Option<String>,
    #[sqlx(default)]
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 是否已过付款截止时间
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// 是否满足过期取消条件：未付款、无待审核凭证且已过期
    pub fn is_cancellable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Placed
            && matches!(
                self.payment_status,
                PaymentStatus::Pending | PaymentStatus::Rejected
            )
            && self.is_expired_at(now)
    }

    /// 已抵扣金额
    pub fn discount_cents(&self) -> i64 {
        self.subtotal_cents - self.total_cents
    }
}

/// 订单明细
///
/// 下单时的商品快照，之后不再变更
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// 商品标题快照
    pub title: String,
    /// 单价快照
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub subtotal_cents: i64,
}

/// 购物车行
///
/// 从购物车取出并关联当前商品信息，价格在此刻快照进订单
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub seller_id: String,
    pub title: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub is_active: bool,
    /// null 表示不限库存
    #[sqlx(default)]
    pub stock: Option<i32>,
}

impl CartLine {
    /// 小计，溢出时返回 None
    pub fn subtotal_cents(&self) -> Option<i64> {
        self.price_cents.checked_mul(i64::from(self.quantity))
    }

    /// 当前是否可购买
    pub fn is_available(&self) -> bool {
        self.is_active
            && self.quantity > 0
            && self.stock.is_none_or(|stock| stock >= self.quantity)
    }
}

/// 新建订单参数
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_no: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub expires_at: DateTime<Utc>,
    pub delivery_address: Option<String>,
    pub delivery_notes: Option<String>,
}
