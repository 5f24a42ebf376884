//! 积分服务
//!
//! - 积分发放：仅由支付审核通过时在同一事务内调用，不对外暴露
//! - 积分抵扣：校验余额与抵扣上限后扣减订单金额和积分余额
//!
//! 所有余额变动都与一条积分流水在同一事务内写入

use market_shared::observability::metrics;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::error::{OrderError, Result};
use crate::loyalty::{check_discount, compute_accrual, point_value_cents};
use crate::models::{NewLedgerEntry, Order, PaymentStatus};
use crate::notification::{NotificationBuilder, NotificationSender};
use crate::repository::{OrderRepository, PointsRepository, RewardsRepository};
use crate::service::dto::{RedeemPointsRequest, RedeemPointsResponse};

/// 一次积分发放的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsAward {
    pub points: i64,
    pub new_balance: i64,
    pub tier_name: Option<String>,
}

/// 积分服务
pub struct LoyaltyService {
    pool: PgPool,
    sender: NotificationSender,
}

impl LoyaltyService {
    pub fn new(pool: PgPool, sender: NotificationSender) -> Self {
        Self { pool, sender }
    }

    // ==================== 积分发放 ====================

    /// 在调用方事务中为已确认订单发放积分
    ///
    /// 未配置积分计划、未启用或未达最低消费时返回 None；
    /// 计算结果为 0 时同样不写流水
    pub async fn accrue_points_in_tx(
        tx: &mut PgConnection,
        order: &Order,
    ) -> Result<Option<PointsAward>> {
        let config = RewardsRepository::get_config_in_tx(tx, &order.seller_id).await?;
        let tiers = RewardsRepository::list_tiers_in_tx(tx, &order.seller_id).await?;

        let accrual = compute_accrual(config.as_ref(), &tiers, order.total_cents)?;
        if accrual.points <= 0 {
            return Ok(None);
        }

        let new_balance =
            PointsRepository::credit_in_tx(tx, &order.buyer_id, &order.seller_id, accrual.points)
                .await?;
        PointsRepository::insert_ledger_in_tx(
            tx,
            &NewLedgerEntry::earned(
                &order.buyer_id,
                &order.seller_id,
                Some(order.id),
                accrual.points,
                accrual.description(&order.order_no),
            ),
        )
        .await?;

        info!(
            order_id = order.id,
            buyer_id = %order.buyer_id,
            points = accrual.points,
            tier = ?accrual.tier_name,
            new_balance,
            "积分已发放"
        );

        Ok(Some(PointsAward {
            points: accrual.points,
            new_balance,
            tier_name: accrual.tier_name,
        }))
    }

    // ==================== 积分抵扣 ====================

    /// 使用积分抵扣订单金额
    ///
    /// 订单行锁保证同一订单的抵扣串行执行，部分唯一索引兜底重复抵扣
    #[instrument(skip(self), fields(order_id = request.order_id, seller_id = %request.seller_id))]
    pub async fn redeem_points(&self, request: RedeemPointsRequest) -> Result<RedeemPointsResponse> {
        let points = request.points_to_use;
        if points <= 0 {
            return Err(OrderError::Validation(format!(
                "抵扣积分必须大于 0: {}",
                points
            )));
        }

        let mut tx = self.pool.begin().await?;

        // 1. 锁定订单并校验归属与状态
        let order = OrderRepository::lock_order_in_tx(&mut tx, request.order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(request.order_id))?;

        if order.seller_id != request.seller_id {
            return Err(OrderError::Forbidden(format!(
                "订单 {} 不属于商家 {}",
                order.id, request.seller_id
            )));
        }
        if !order.status.allows_redemption() {
            return Err(OrderError::not_eligible(
                order.id,
                format!("当前状态 {} 不允许积分抵扣", order.status.as_str()),
            ));
        }
        if PointsRepository::get_applied_redemption_in_tx(&mut tx, order.id)
            .await?
            .is_some()
        {
            return Err(OrderError::AlreadyRedeemed(order.id));
        }

        // 2. 商家积分计划
        let config = RewardsRepository::get_config_in_tx(&mut tx, &order.seller_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| OrderError::RewardsInactive(order.seller_id.clone()))?;
        let value_per_point = point_value_cents(&config)
            .ok_or_else(|| OrderError::RewardsInactive(order.seller_id.clone()))?;

        // 3. 余额与抵扣上限
        let available =
            PointsRepository::get_balance_in_tx(&mut tx, &order.buyer_id, &order.seller_id).await?;
        if available < points {
            return Err(OrderError::InsufficientPoints {
                required: points,
                available,
            });
        }

        let discount_cents = points.checked_mul(value_per_point).ok_or_else(|| {
            OrderError::Validation(format!("抵扣积分过大: {}", points))
        })?;
        check_discount(&config, discount_cents, order.total_cents)?;

        // 4. 写入抵扣记录、订单金额、余额与流水
        let redemption = PointsRepository::create_redemption_in_tx(
            &mut tx,
            &order.buyer_id,
            &order.seller_id,
            order.id,
            points,
            discount_cents,
        )
        .await?;

        let rows = OrderRepository::apply_discount_in_tx(
            &mut tx,
            order.id,
            order.total_cents,
            discount_cents,
        )
        .await?;
        if rows == 0 {
            return Err(OrderError::ConcurrentModification);
        }
        let new_total_cents = order.total_cents - discount_cents;

        // 未确认的支付按抵扣后金额收款
        let rows =
            OrderRepository::apply_payment_discount_in_tx(&mut tx, order.id, discount_cents).await?;
        if rows == 0 && order.payment_status != PaymentStatus::Confirmed {
            return Err(OrderError::ConcurrentModification);
        }

        let new_balance =
            PointsRepository::debit_in_tx(&mut tx, &order.buyer_id, &order.seller_id, points)
                .await?
                .ok_or(OrderError::InsufficientPoints {
                    required: points,
                    available,
                })?;
        PointsRepository::insert_ledger_in_tx(
            &mut tx,
            &NewLedgerEntry::spent(
                &order.buyer_id,
                &order.seller_id,
                Some(order.id),
                points,
                format!("订单 {} 使用积分抵扣 {} 分", order.order_no, discount_cents),
            ),
        )
        .await?;

        tx.commit().await?;

        self.sender
            .dispatch(vec![NotificationBuilder::points_redeemed(
                &order.buyer_id,
                order.id,
                points,
                discount_cents,
                new_total_cents,
            )])
            .await;

        metrics::record_points_redeemed(points as u64);

        info!(
            redemption_id = redemption.id,
            points,
            discount_cents,
            new_total_cents,
            new_balance,
            "积分抵扣成功"
        );

        Ok(RedeemPointsResponse {
            redemption_id: redemption.id,
            order_id: order.id,
            points_used: points,
            discount_cents,
            new_total_cents,
            new_balance,
        })
    }
}
