//! 查询服务
//!
//! 只读聚合：订单详情、积分余额与流水、积分抵扣资格。
//! 依赖仓储 Trait 而非具体实现，单元测试中使用 mock 仓储

use std::sync::Arc;

use tracing::instrument;

use crate::error::{OrderError, Result};
use crate::loyalty::redemption_limits;
use crate::models::{PointsLedgerEntry, Redemption};
use crate::repository::{OrderRepositoryTrait, PointsRepositoryTrait, RewardsRepositoryTrait};
use crate::service::dto::{OrderDetailDto, PointsBalanceDto, RedemptionEligibility};

/// 积分流水默认条数
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
/// 积分流水最大条数
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// 查询服务
pub struct OrderQueryService<OR, PR, RR>
where
    OR: OrderRepositoryTrait,
    PR: PointsRepositoryTrait,
    RR: RewardsRepositoryTrait,
{
    order_repo: Arc<OR>,
    points_repo: Arc<PR>,
    rewards_repo: Arc<RR>,
}

impl<OR, PR, RR> OrderQueryService<OR, PR, RR>
where
    OR: OrderRepositoryTrait,
    PR: PointsRepositoryTrait,
    RR: RewardsRepositoryTrait,
{
    pub fn new(order_repo: Arc<OR>, points_repo: Arc<PR>, rewards_repo: Arc<RR>) -> Self {
        Self {
            order_repo,
            points_repo,
            rewards_repo,
        }
    }

    /// 获取订单详情（含明细、支付记录与生效中的积分抵扣）
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetailDto> {
        let order = self
            .order_repo
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let items = self.order_repo.get_order_items(order_id).await?;
        let payment = self.order_repo.get_payment_by_order(order_id).await?;
        let redemption = self.points_repo.get_applied_redemption(order_id).await?;

        Ok(OrderDetailDto {
            order,
            items,
            payment,
            redemption,
        })
    }

    /// 获取订单生效中的积分抵扣
    #[instrument(skip(self))]
    pub async fn get_order_redemption(&self, order_id: i64) -> Result<Option<Redemption>> {
        if self.order_repo.get_order(order_id).await?.is_none() {
            return Err(OrderError::OrderNotFound(order_id));
        }
        self.points_repo.get_applied_redemption(order_id).await
    }

    /// 查询积分余额，无记录时返回零余额
    #[instrument(skip(self))]
    pub async fn get_points_balance(&self, user_id: &str, seller_id: &str) -> Result<PointsBalanceDto> {
        let balance = self.points_repo.get_balance(user_id, seller_id).await?;
        Ok(balance
            .map(PointsBalanceDto::from)
            .unwrap_or_else(|| PointsBalanceDto::empty(user_id, seller_id)))
    }

    /// 查询积分流水（按时间倒序）
    #[instrument(skip(self))]
    pub async fn get_points_history(
        &self,
        user_id: &str,
        seller_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<PointsLedgerEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.points_repo.list_history(user_id, seller_id, limit).await
    }

    /// 计算订单的积分抵扣资格
    ///
    /// 不可抵扣时返回带原因码的结果而非错误；订单不存在仍返回 OrderNotFound
    #[instrument(skip(self))]
    pub async fn get_redemption_eligibility(
        &self,
        order_id: i64,
        seller_id: &str,
    ) -> Result<RedemptionEligibility> {
        let order = self
            .order_repo
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if order.seller_id != seller_id {
            return Ok(RedemptionEligibility::ineligible(order_id, 0, "FORBIDDEN"));
        }

        let available = self
            .points_repo
            .get_balance(&order.buyer_id, &order.seller_id)
            .await?
            .map(|b| b.balance)
            .unwrap_or(0);

        if !order.status.allows_redemption() {
            return Ok(RedemptionEligibility::ineligible(
                order_id,
                available,
                "ORDER_NOT_ELIGIBLE",
            ));
        }

        if self
            .points_repo
            .get_applied_redemption(order_id)
            .await?
            .is_some()
        {
            return Ok(RedemptionEligibility::ineligible(
                order_id,
                available,
                "ALREADY_REDEEMED",
            ));
        }

        let config = self
            .rewards_repo
            .get_config(&order.seller_id)
            .await?
            .filter(|c| c.is_active);
        let Some(limits) = config
            .as_ref()
            .and_then(|c| redemption_limits(c, available, order.total_cents))
        else {
            return Ok(RedemptionEligibility::ineligible(
                order_id,
                available,
                "REWARDS_INACTIVE",
            ));
        };

        let reason = if available <= 0 {
            Some("INSUFFICIENT_POINTS")
        } else if limits.max_points_usable <= 0 {
            Some("DISCOUNT_EXCEEDS_ORDER")
        } else {
            None
        };

        Ok(RedemptionEligibility {
            order_id,
            can_redeem: reason.is_none(),
            available_points: available,
            max_points_usable: limits.max_points_usable,
            max_discount_cents: limits.max_points_usable * limits.point_value_cents,
            point_value_cents: limits.point_value_cents,
            reason: reason.map(str::to_string),
        })
    }
}
