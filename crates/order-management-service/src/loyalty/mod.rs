//! 积分引擎
//!
//! 计算部分为纯函数（`calculator`），持久化由 `service::LoyaltyService` 在事务内完成

pub mod calculator;

pub use calculator::{
    PointsAccrual, RedemptionLimits, check_discount, compute_accrual, compute_points,
    max_discount_cents, point_value_cents, redemption_limits, select_tier,
};
