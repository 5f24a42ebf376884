//! 积分体系实体定义
//!
//! 包含商家积分配置、等级、积分流水、积分余额与积分抵扣记录

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{PointsTransactionType, RedemptionStatus};

/// 默认最大抵扣比例（订单金额的百分比）
pub const DEFAULT_MAX_REDEMPTION_PERCENT: i32 = 50;

/// 商家积分配置
///
/// 每个商家一行，比例与倍率使用定点小数避免浮点误差
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardsConfig {
    pub seller_id: String,
    pub is_active: bool,
    /// 每单位金额（分）可获得的积分
    pub points_per_currency_unit: Decimal,
    /// 获得积分的最低订单金额（分）
    pub min_purchase_cents: i64,
    /// 积分最多可抵扣订单金额的百分比
    pub max_redemption_percent: i32,
    /// 每积分抵扣金额（分），为空时取 round(1 / points_per_currency_unit)
    #[sqlx(default)]
    pub point_value_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商家积分等级
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardTier {
    pub id: i64,
    pub seller_id: String,
    pub name: String,
    /// 等级门槛（分）
    pub min_purchase_cents: i64,
    /// 积分倍率
    pub multiplier: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// 积分流水
///
/// 只追加、不修改；points_earned 与 points_spent 互斥
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointsLedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub seller_id: String,
    #[sqlx(default)]
    pub order_id: Option<i64>,
    pub points_earned: i64,
    pub points_spent: i64,
    pub transaction_type: PointsTransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PointsLedgerEntry {
    /// 带符号的积分变动
    pub fn signed_points(&self) -> i64 {
        let amount = match self.transaction_type {
            PointsTransactionType::Earned => self.points_earned,
            PointsTransactionType::Spent => self.points_spent,
        };
        self.transaction_type.sign() * amount
    }
}

/// 新积分流水
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub user_id: String,
    pub seller_id: String,
    pub order_id: Option<i64>,
    pub transaction_type: PointsTransactionType,
    pub points: i64,
    pub description: String,
}

impl NewLedgerEntry {
    pub fn earned(
        user_id: impl Into<String>,
        seller_id: impl Into<String>,
        order_id: Option<i64>,
        points: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            seller_id: seller_id.into(),
            order_id,
            transaction_type: PointsTransactionType::Earned,
            points,
            description: description.into(),
        }
    }

    pub fn spent(
        user_id: impl Into<String>,
        seller_id: impl Into<String>,
        order_id: Option<i64>,
        points: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            seller_id: seller_id.into(),
            order_id,
            transaction_type: PointsTransactionType::Spent,
            points,
            description: description.into(),
        }
    }

    /// 拆分为 (points_earned, points_spent)
    pub fn split_points(&self) -> (i64, i64) {
        match self.transaction_type {
            PointsTransactionType::Earned => (self.points, 0),
            PointsTransactionType::Spent => (0, self.points),
        }
    }
}

/// 积分余额
///
/// 按 (user_id, seller_id) 聚合，始终等于流水的带符号合计
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointsBalance {
    pub user_id: String,
    pub seller_id: String,
    pub balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub updated_at: DateTime<Utc>,
}

/// 积分抵扣记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: i64,
    pub user_id: String,
    pub seller_id: String,
    pub order_id: i64,
    pub points_used: i64,
    pub discount_cents: i64,
    pub status: RedemptionStatus,
    pub applied_at: DateTime<Utc>,
    #[sqlx(default)]
    pub points_refunded_at: Option<DateTime<Utc>>,
}
