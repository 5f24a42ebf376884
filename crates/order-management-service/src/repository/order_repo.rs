//! 订单仓储
//!
//! 提供订单、订单明细、支付记录的数据访问。
//! 所有状态变更均为条件更新（`WHERE status = $expected`），返回受影响行数供调用方判定并发冲突

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use super::traits::OrderRepositoryTrait;
use crate::error::Result;
use crate::models::{
    CartLine, NewOrder, Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus,
};

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 订单 ====================

    /// 获取订单
    pub async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_no, buyer_id, seller_id, subtotal_cents, total_cents,
                   payment_method, status, payment_status, expires_at,
                   delivery_address, delivery_notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 在事务中创建订单
    pub async fn create_order_in_tx(tx: &mut PgConnection, order: &NewOrder) -> Result<Order> {
        let created = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (order_no, buyer_id, seller_id, subtotal_cents, total_cents,
                                payment_method, status, payment_status, expires_at,
                                delivery_address, delivery_notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            RETURNING id, order_no, buyer_id, seller_id, subtotal_cents, total_cents,
                      payment_method, status, payment_status, expires_at,
                      delivery_address, delivery_notes, created_at, updated_at
            "#,
        )
        .bind(&order.order_no)
        .bind(&order.buyer_id)
        .bind(&order.seller_id)
        .bind(order.total_cents)
        .bind(order.payment_method)
        .bind(OrderStatus::Placed)
        .bind(PaymentStatus::Pending)
        .bind(order.expires_at)
        .bind(&order.delivery_address)
        .bind(&order.delivery_notes)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 在事务中锁定订单行（FOR UPDATE）
    ///
    /// 涉及订单与支付的事务一律先锁订单、再锁支付，避免死锁
    pub async fn lock_order_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_no, buyer_id, seller_id, subtotal_cents, total_cents,
                   payment_method, status, payment_status, expires_at,
                   delivery_address, delivery_notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 在事务中尝试锁定订单行（FOR UPDATE SKIP LOCKED）
    ///
    /// 行已被其他事务锁定时返回 None
    pub async fn try_lock_order_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, order_no, buyer_id, seller_id, subtotal_cents, total_cents,
                   payment_method, status, payment_status, expires_at,
                   delivery_address, delivery_notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 查找已过付款期限的待付款订单
    ///
    /// 包括从未上传凭证（pending）与凭证被拒绝后未重新上传（rejected）的订单
    pub async fn find_expired_order_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM orders
            WHERE status = $1
              AND payment_status IN ($2, $3)
              AND expires_at <= $4
            ORDER BY expires_at ASC
            LIMIT $5
            "#,
        )
        .bind(OrderStatus::Placed)
        .bind(PaymentStatus::Pending)
        .bind(PaymentStatus::Rejected)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// 在事务中确认收款
    ///
    /// placed -> seller_confirmed，payment_status -> confirmed
    pub async fn confirm_payment_in_tx(
        tx: &mut PgConnection,
        id: i64,
        expected_payment_status: PaymentStatus,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4 AND payment_status = $5
            "#,
        )
        .bind(id)
        .bind(OrderStatus::SellerConfirmed)
        .bind(PaymentStatus::Confirmed)
        .bind(OrderStatus::Placed)
        .bind(expected_payment_status)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中更新订单的支付状态（订单状态保持 placed）
    pub async fn update_payment_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3 AND payment_status = $4
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(OrderStatus::Placed)
        .bind(expected)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中迁移订单状态
    pub async fn transition_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中取消过期订单
    ///
    /// 在写入时重新校验取消条件，已上传凭证或已确认的订单不会被取消
    pub async fn cancel_expired_in_tx(
        tx: &mut PgConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, updated_at = NOW()
            WHERE id = $1
              AND status = $4
              AND payment_status IN ($5, $3)
              AND expires_at <= $6
            "#,
        )
        .bind(id)
        .bind(OrderStatus::Cancelled)
        .bind(PaymentStatus::Rejected)
        .bind(OrderStatus::Placed)
        .bind(PaymentStatus::Pending)
        .bind(now)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中将付款期限延长到不早于 `min_expires_at`
    pub async fn extend_expiration_in_tx(
        tx: &mut PgConnection,
        id: i64,
        min_expires_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let expires_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE orders
            SET expires_at = GREATEST(expires_at, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING expires_at
            "#,
        )
        .bind(id)
        .bind(min_expires_at)
        .fetch_one(tx)
        .await?;

        Ok(expires_at)
    }

    /// 在事务中扣减订单金额（积分抵扣）
    ///
    /// 以当前金额为期望值，且扣减后至少保留 1 分
    pub async fn apply_discount_in_tx(
        tx: &mut PgConnection,
        id: i64,
        expected_total_cents: i64,
        discount_cents: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET total_cents = total_cents - $3, updated_at = NOW()
            WHERE id = $1
              AND total_cents = $2
              AND total_cents - $3 >= 1
            "#,
        )
        .bind(id)
        .bind(expected_total_cents)
        .bind(discount_cents)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中同步扣减应付金额
    ///
    /// 已确认的支付保留确认时的金额
    pub async fn apply_payment_discount_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        discount_cents: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount_cents = amount_cents - $2, updated_at = NOW()
            WHERE order_id = $1
              AND status <> $3
              AND amount_cents - $2 >= 1
            "#,
        )
        .bind(order_id)
        .bind(discount_cents)
        .bind(PaymentStatus::Confirmed)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    // ==================== 订单明细 ====================

    /// 获取订单明细
    pub async fn get_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, title, unit_price_cents, quantity, subtotal_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// 在事务中写入订单明细快照
    pub async fn create_items_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        lines: &[CartLine],
    ) -> Result<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (order_id, product_id, title, unit_price_cents,
                                         quantity, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $4 * $5)
                RETURNING id, order_id, product_id, title, unit_price_cents,
                          quantity, subtotal_cents
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.title)
            .bind(line.price_cents)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;

            items.push(item);
        }

        Ok(items)
    }

    // ==================== 支付记录 ====================

    /// 获取支付记录
    pub async fn get_payment(&self, id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, method, status, amount_cents, receipt_ref,
                   transfer_metadata, rejection_reason, reviewer_id, reviewed_at,
                   created_at, updated_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// 按订单获取支付记录
    pub async fn get_payment_by_order(&self, order_id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, method, status, amount_cents, receipt_ref,
                   transfer_metadata, rejection_reason, reviewer_id, reviewed_at,
                   created_at, updated_at
            FROM payments
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// 在事务中创建支付记录
    pub async fn create_payment_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        method: PaymentMethod,
        amount_cents: i64,
    ) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (order_id, method, status, amount_cents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, order_id, method, status, amount_cents, receipt_ref,
                      transfer_metadata, rejection_reason, reviewer_id, reviewed_at,
                      created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(method)
        .bind(PaymentStatus::Pending)
        .bind(amount_cents)
        .fetch_one(tx)
        .await?;

        Ok(payment)
    }

    /// 在事务中锁定支付记录
    pub async fn lock_payment_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, method, status, amount_cents, receipt_ref,
                   transfer_metadata, rejection_reason, reviewer_id, reviewed_at,
                   created_at, updated_at
            FROM payments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(payment)
    }

    /// 在事务中按订单锁定支付记录
    pub async fn lock_payment_by_order_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
    ) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, method, status, amount_cents, receipt_ref,
                   transfer_metadata, rejection_reason, reviewer_id, reviewed_at,
                   created_at, updated_at
            FROM payments
            WHERE order_id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(tx)
        .await?;

        Ok(payment)
    }

    /// 在事务中附加转账凭证，进入待审核
    ///
    /// 重新上传时清除上一次的审核结果
    pub async fn attach_receipt_in_tx(
        tx: &mut PgConnection,
        payment_id: i64,
        expected: PaymentStatus,
        receipt_ref: &str,
        transfer_metadata: Option<&Value>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3,
                receipt_ref = $4,
                transfer_metadata = $5,
                rejection_reason = NULL,
                reviewer_id = NULL,
                reviewed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(payment_id)
        .bind(expected)
        .bind(PaymentStatus::PendingReview)
        .bind(receipt_ref)
        .bind(transfer_metadata)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    /// 在事务中写入审核结果
    ///
    /// reviewer_id 为空表示系统操作（如过期清理）
    pub async fn review_payment_in_tx(
        tx: &mut PgConnection,
        payment_id: i64,
        expected: PaymentStatus,
        next: PaymentStatus,
        reviewer_id: Option<&str>,
        rejection_reason: Option<&str>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3,
                reviewer_id = $4,
                rejection_reason = $5,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(payment_id)
        .bind(expected)
        .bind(next)
        .bind(reviewer_id)
        .bind(rejection_reason)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        OrderRepository::get_order(self, id).await
    }

    async fn get_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        OrderRepository::get_order_items(self, order_id).await
    }

    async fn get_payment(&self, id: i64) -> Result<Option<Payment>> {
        OrderRepository::get_payment(self, id).await
    }

    async fn get_payment_by_order(&self, order_id: i64) -> Result<Option<Payment>> {
        OrderRepository::get_payment_by_order(self, order_id).await
    }
}
