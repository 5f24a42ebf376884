//! 积分仓储
//!
//! 提供积分余额、积分流水、积分抵扣记录的数据访问。
//! 余额变动必须与流水写入处于同一事务

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::PointsRepositoryTrait;
use crate::error::{OrderError, Result};
use crate::models::{
    NewLedgerEntry, PointsBalance, PointsLedgerEntry, PointsTransactionType, Redemption,
    RedemptionStatus,
};

/// 积分仓储
pub struct PointsRepository {
    pool: PgPool,
}

impl PointsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 余额 ====================

    /// 获取积分余额
    pub async fn get_balance(&self, user_id: &str, seller_id: &str) -> Result<Option<PointsBalance>> {
        let balance = sqlx::query_as::<_, PointsBalance>(
            r#"
            SELECT user_id, seller_id, balance, total_earned, total_spent, updated_at
            FROM user_points
            WHERE user_id = $1 AND seller_id = $2
            "#,
        )
        .bind(user_id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// 在事务中读取余额，无记录时为 0
    pub async fn get_balance_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        seller_id: &str,
    ) -> Result<i64> {
        let balance = sqlx::query_scalar::<_, i64>(
            "SELECT balance FROM user_points WHERE user_id = $1 AND seller_id = $2",
        )
        .bind(user_id)
        .bind(seller_id)
        .fetch_optional(tx)
        .await?;

        Ok(balance.unwrap_or(0))
    }

    /// 在事务中增加积分，返回新余额
    pub async fn credit_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        seller_id: &str,
        points: i64,
    ) -> Result<i64> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO user_points (user_id, seller_id, balance, total_earned, total_spent, updated_at)
            VALUES ($1, $2, $3, $3, 0, NOW())
            ON CONFLICT (user_id, seller_id) DO UPDATE
            SET balance = user_points.balance + EXCLUDED.balance,
                total_earned = user_points.total_earned + EXCLUDED.total_earned,
                updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(seller_id)
        .bind(points)
        .fetch_one(tx)
        .await?;

        Ok(balance)
    }

    /// 在事务中扣减积分
    ///
    /// 余额不足时不做任何修改并返回 None
    pub async fn debit_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        seller_id: &str,
        points: i64,
    ) -> Result<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE user_points
            SET balance = balance - $3,
                total_spent = total_spent + $3,
                updated_at = NOW()
            WHERE user_id = $1 AND seller_id = $2 AND balance >= $3
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(seller_id)
        .bind(points)
        .fetch_optional(tx)
        .await?;

        Ok(balance)
    }

    // ==================== 流水 ====================

    /// 查询积分流水（按时间倒序）
    pub async fn list_history(
        &self,
        user_id: &str,
        seller_id: &str,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>> {
        let entries = sqlx::query_as::<_, PointsLedgerEntry>(
            r#"
            SELECT id, user_id, seller_id, order_id, points_earned, points_spent,
                   transaction_type, description, created_at
            FROM points_history
            WHERE user_id = $1 AND seller_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(seller_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 在事务中追加积分流水
    pub async fn insert_ledger_in_tx(tx: &mut PgConnection, entry: &NewLedgerEntry) -> Result<i64> {
        let (earned, spent) = entry.split_points();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO points_history (user_id, seller_id, order_id, points_earned,
                                        points_spent, transaction_type, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.seller_id)
        .bind(entry.order_id)
        .bind(earned)
        .bind(spent)
        .bind(entry.transaction_type)
        .bind(&entry.description)
        .fetch_one(tx)
        .await?;

        Ok(id)
    }

    /// 在事务中统计某订单为用户发放的积分
    pub async fn earned_for_order_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        order_id: i64,
    ) -> Result<i64> {
        let points = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(points_earned), 0)::BIGINT
            FROM points_history
            WHERE user_id = $1 AND order_id = $2 AND transaction_type = $3
            "#,
        )
        .bind(user_id)
        .bind(order_id)
        .bind(PointsTransactionType::Earned)
        .fetch_one(tx)
        .await?;

        Ok(points)
    }

    // ==================== 积分抵扣 ====================

    /// 获取订单生效中的抵扣记录
    pub async fn get_applied_redemption(&self, order_id: i64) -> Result<Option<Redemption>> {
        let redemption = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, seller_id, order_id, points_used, discount_cents,
                   status, applied_at, points_refunded_at
            FROM point_redemptions
            WHERE order_id = $1 AND status = $2
            "#,
        )
        .bind(order_id)
        .bind(RedemptionStatus::Applied)
        .fetch_optional(&self.pool)
        .await?;

        Ok(redemption)
    }

    /// 在事务中获取订单生效中的抵扣记录
    pub async fn get_applied_redemption_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
    ) -> Result<Option<Redemption>> {
        let redemption = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, seller_id, order_id, points_used, discount_cents,
                   status, applied_at, points_refunded_at
            FROM point_redemptions
            WHERE order_id = $1 AND status = $2
            "#,
        )
        .bind(order_id)
        .bind(RedemptionStatus::Applied)
        .fetch_optional(tx)
        .await?;

        Ok(redemption)
    }

    /// 在事务中创建抵扣记录
    ///
    /// 部分唯一索引保证每个订单最多一条 applied 记录，冲突时返回 AlreadyRedeemed
    pub async fn create_redemption_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        seller_id: &str,
        order_id: i64,
        points_used: i64,
        discount_cents: i64,
    ) -> Result<Redemption> {
        let result = sqlx::query_as::<_, Redemption>(
            r#"
            INSERT INTO point_redemptions (user_id, seller_id, order_id, points_used,
                                           discount_cents, status, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, user_id, seller_id, order_id, points_used, discount_cents,
                      status, applied_at, points_refunded_at
            "#,
        )
        .bind(user_id)
        .bind(seller_id)
        .bind(order_id)
        .bind(points_used)
        .bind(discount_cents)
        .bind(RedemptionStatus::Applied)
        .fetch_one(tx)
        .await;

        match result {
            Ok(redemption) => Ok(redemption),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(OrderError::AlreadyRedeemed(order_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 在事务中标记抵扣积分已退回
    ///
    /// 抵扣记录保持 applied，订单金额中的抵扣仍由它说明；
    /// 只有尚未退回的记录会命中，保证同一笔抵扣最多退回一次
    pub async fn mark_points_refunded_in_tx(
        tx: &mut PgConnection,
        redemption_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE point_redemptions
            SET points_refunded_at = NOW()
            WHERE id = $1 AND status = $2 AND points_refunded_at IS NULL
            "#,
        )
        .bind(redemption_id)
        .bind(RedemptionStatus::Applied)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PointsRepositoryTrait for PointsRepository {
    async fn get_balance(&self, user_id: &str, seller_id: &str) -> Result<Option<PointsBalance>> {
        PointsRepository::get_balance(self, user_id, seller_id).await
    }

    async fn list_history(
        &self,
        user_id: &str,
        seller_id: &str,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>> {
        PointsRepository::list_history(self, user_id, seller_id, limit).await
    }

    async fn get_applied_redemption(&self, order_id: i64) -> Result<Option<Redemption>> {
        PointsRepository::get_applied_redemption(self, order_id).await
    }
}
