//! 过期订单清理服务
//!
//! 取消超过付款期限且没有待审核凭证的订单（placed / pending 或 placed / rejected）。
//! 每个订单在独立的短事务中处理：
//!
//! 1. `FOR UPDATE SKIP LOCKED` 认领订单，正在被审核的订单直接跳过
//! 2. 写入时以条件更新重新校验取消条件
//! 3. 支付记录置为 rejected，释放库存，退回抵扣积分
//!
//! 抵扣记录保持 applied：取消后的订单金额仍为抵扣后的值，
//! `total_cents = 明细合计 - applied 抵扣` 在取消前后都成立
//!
//! 单个订单失败只记录日志，不中断整轮清理

use chrono::{DateTime, Utc};
use market_shared::observability::metrics;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use crate::error::{OrderError, Result};
use crate::models::{NewLedgerEntry, PaymentStatus};
use crate::notification::{NotificationBuilder, NotificationRecord, NotificationSender};
use crate::repository::{CartRepository, OrderRepository, PointsRepository};

/// 系统取消时写入支付记录的拒绝原因
pub const EXPIRED_REJECTION_REASON: &str = "超过付款期限未支付，系统自动取消";

/// 过期订单清理服务
pub struct ExpirationService {
    pool: PgPool,
    order_repo: OrderRepository,
    sender: NotificationSender,
}

impl ExpirationService {
    pub fn new(pool: PgPool, sender: NotificationSender) -> Self {
        Self {
            order_repo: OrderRepository::new(pool.clone()),
            pool,
            sender,
        }
    }

    /// 取消所有已过期订单，返回本轮成功取消的数量
    #[instrument(skip(self))]
    pub async fn cancel_expired_orders(&self, batch_size: i64) -> Result<u64> {
        let batch_size = batch_size.max(1);
        let now = Utc::now();
        let mut cancelled = 0u64;

        loop {
            let ids = self.order_repo.find_expired_order_ids(now, batch_size).await?;
            if ids.is_empty() {
                break;
            }

            let mut progressed = 0u64;
            for order_id in &ids {
                match self.cancel_one(*order_id, now).await {
                    Ok(true) => progressed += 1,
                    Ok(false) => {
                        debug!(order_id, "订单已被其他事务处理，跳过");
                    }
                    Err(e) => {
                        error!(order_id, error = %e, "取消过期订单失败");
                    }
                }
            }
            cancelled += progressed;

            // 候选不足一批，或本批全部被跳过（被锁定或失败）时结束，
            // 避免反复读取同一批无法处理的订单
            if (ids.len() as i64) < batch_size || progressed == 0 {
                break;
            }
        }

        if cancelled > 0 {
            metrics::record_orders_expired(cancelled);
            info!(cancelled, "过期订单清理完成");
        }

        Ok(cancelled)
    }

    /// 在独立事务中取消单个订单
    ///
    /// 订单已被锁定、已离开待付款状态或条件更新未命中时返回 false
    async fn cancel_one(&self, order_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(order) = OrderRepository::try_lock_order_in_tx(&mut tx, order_id).await? else {
            return Ok(false);
        };
        if !order.is_cancellable_at(now) {
            return Ok(false);
        }

        if OrderRepository::cancel_expired_in_tx(&mut tx, order.id, now).await? == 0 {
            return Ok(false);
        }

        let payment = OrderRepository::lock_payment_by_order_in_tx(&mut tx, order.id)
            .await?
            .ok_or_else(|| {
                OrderError::Internal(format!("订单缺少支付记录: order_id={}", order.id))
            })?;
        // 已被商家拒绝的支付保留原拒绝原因
        if payment.status == PaymentStatus::Pending {
            let rows = OrderRepository::review_payment_in_tx(
                &mut tx,
                payment.id,
                PaymentStatus::Pending,
                PaymentStatus::Rejected,
                None,
                Some(EXPIRED_REJECTION_REASON),
            )
            .await?;
            if rows == 0 {
                return Err(OrderError::ConcurrentModification);
            }
        } else if payment.status != PaymentStatus::Rejected {
            return Err(OrderError::ConcurrentModification);
        }

        CartRepository::release_stock_in_tx(&mut tx, order.id).await?;

        let mut records: Vec<NotificationRecord> =
            vec![NotificationBuilder::order_expired(&order.buyer_id, order.id, &order.order_no)];

        // 退回抵扣积分，抵扣记录与订单金额保持不变
        if let Some(redemption) =
            PointsRepository::get_applied_redemption_in_tx(&mut tx, order.id).await?
        {
            if PointsRepository::mark_points_refunded_in_tx(&mut tx, redemption.id).await? == 0 {
                return Err(OrderError::ConcurrentModification);
            }
            let new_balance = PointsRepository::credit_in_tx(
                &mut tx,
                &redemption.user_id,
                &redemption.seller_id,
                redemption.points_used,
            )
            .await?;
            PointsRepository::insert_ledger_in_tx(
                &mut tx,
                &NewLedgerEntry::earned(
                    &redemption.user_id,
                    &redemption.seller_id,
                    Some(order.id),
                    redemption.points_used,
                    format!("订单 {} 超时取消，退回抵扣积分", order.order_no),
                ),
            )
            .await?;
            records.push(NotificationBuilder::points_earned(
                &redemption.user_id,
                order.id,
                redemption.points_used,
                new_balance,
            ));

            info!(
                order_id = order.id,
                redemption_id = redemption.id,
                points = redemption.points_used,
                "已退回抵扣积分"
            );
        }

        tx.commit().await?;

        self.sender.dispatch(records).await;

        info!(
            order_id = order.id,
            order_no = %order.order_no,
            expires_at = %order.expires_at,
            "过期订单已取消"
        );

        Ok(true)
    }
}
