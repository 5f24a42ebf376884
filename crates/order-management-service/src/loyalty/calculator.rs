//! 积分计算
//!
//! 纯函数实现，不访问数据库：
//! - 等级选择：取门槛不高于订单金额的最高有效等级
//! - 积分发放：floor(订单金额 × 积分比例 × 等级倍率)，只舍不入
//! - 积分抵扣：每积分价值、最大抵扣额与可用积分上限

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{OrderError, Result};
use crate::models::{RewardTier, RewardsConfig};

/// 一次积分发放的计算结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsAccrual {
    pub points: i64,
    pub tier_name: Option<String>,
    pub multiplier: Decimal,
}

impl PointsAccrual {
    fn zero() -> Self {
        Self {
            points: 0,
            tier_name: None,
            multiplier: Decimal::ONE,
        }
    }

    /// 流水描述，写明所用等级
    pub fn description(&self, order_no: &str) -> String {
        match &self.tier_name {
            Some(tier) => format!(
                "订单 {} 获得积分（等级 {}，倍率 {}）",
                order_no,
                tier,
                self.multiplier.normalize()
            ),
            None => format!("订单 {} 获得积分", order_no),
        }
    }
}

/// 积分抵扣上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionLimits {
    /// 每积分抵扣金额（分）
    pub point_value_cents: i64,
    /// 本单最多可抵扣金额（分）
    pub max_discount_cents: i64,
    /// 本单最多可使用积分（同时受余额约束）
    pub max_points_usable: i64,
}

/// 选择适用等级
///
/// 在有效等级中取门槛不高于订单金额的最高等级
pub fn select_tier(tiers: &[RewardTier], total_cents: i64) -> Option<&RewardTier> {
    tiers
        .iter()
        .filter(|tier| tier.is_active && tier.min_purchase_cents <= total_cents)
        .max_by_key(|tier| tier.min_purchase_cents)
}

/// floor(total × rate × multiplier)，溢出时返回 None
pub fn compute_points(total_cents: i64, rate: Decimal, multiplier: Decimal) -> Option<i64> {
    Decimal::from(total_cents)
        .checked_mul(rate)?
        .checked_mul(multiplier)?
        .floor()
        .to_i64()
}

/// 计算订单确认时应发放的积分
///
/// 未配置、未启用或未达最低消费时返回 0 积分，不视为错误
pub fn compute_accrual(
    config: Option<&RewardsConfig>,
    tiers: &[RewardTier],
    total_cents: i64,
) -> Result<PointsAccrual> {
    let Some(config) = config.filter(|c| c.is_active) else {
        return Ok(PointsAccrual::zero());
    };

    if total_cents < config.min_purchase_cents || config.points_per_currency_unit <= Decimal::ZERO
    {
        return Ok(PointsAccrual::zero());
    }

    let tier = select_tier(tiers, total_cents);
    let multiplier = tier.map(|t| t.multiplier).unwrap_or(Decimal::ONE);

    let points = compute_points(total_cents, config.points_per_currency_unit, multiplier)
        .ok_or_else(|| {
            OrderError::Internal(format!("积分计算溢出: total_cents={}", total_cents))
        })?;

    Ok(PointsAccrual {
        points: points.max(0),
        tier_name: tier.map(|t| t.name.clone()),
        multiplier,
    })
}

/// 每积分抵扣金额（分）
///
/// 优先使用商家配置的固定值，否则取 round(1 / 积分比例)，四舍五入
pub fn point_value_cents(config: &RewardsConfig) -> Option<i64> {
    if let Some(value) = config.point_value_cents {
        return (value > 0).then_some(value);
    }

    if config.points_per_currency_unit <= Decimal::ZERO {
        return None;
    }

    Decimal::ONE
        .checked_div(config.points_per_currency_unit)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|value| *value > 0)
}

/// 本单最大抵扣金额
///
/// 同时受商家比例上限和"抵扣后至少支付 1 分"约束
pub fn max_discount_cents(config: &RewardsConfig, total_cents: i64) -> i64 {
    let percent = i128::from(config.max_redemption_percent.clamp(0, 100));
    let by_percent = (i128::from(total_cents) * percent / 100) as i64;
    by_percent.min(total_cents - 1).max(0)
}

/// 校验抵扣金额
pub fn check_discount(config: &RewardsConfig, discount_cents: i64, total_cents: i64) -> Result<()> {
    let max = max_discount_cents(config, total_cents);
    if discount_cents >= total_cents || discount_cents > max {
        return Err(OrderError::DiscountExceedsOrder {
            discount_cents,
            max_discount_cents: max,
        });
    }
    Ok(())
}

/// 计算抵扣上限
///
/// 积分计划无法换算价值时返回 None
pub fn redemption_limits(
    config: &RewardsConfig,
    balance: i64,
    total_cents: i64,
) -> Option<RedemptionLimits> {
    let point_value_cents = point_value_cents(config)?;
    let max_discount_cents = max_discount_cents(config, total_cents);
    let max_points_usable = (max_discount_cents / point_value_cents).min(balance.max(0));

    Some(RedemptionLimits {
        point_value_cents,
        max_discount_cents,
        max_points_usable,
    })
}
