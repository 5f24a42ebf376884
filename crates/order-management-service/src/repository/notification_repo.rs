//! 通知记录仓储

use sqlx::PgPool;

use crate::error::Result;
use crate::notification::{NotificationRecord, StoredNotification};

/// 通知记录仓储
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 写入一条通知记录
    pub async fn create(&self, record: &NotificationRecord) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message,
                                       order_id, data, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, false, NOW())
            RETURNING id
            "#,
        )
        .bind(&record.user_id)
        .bind(record.notification_type)
        .bind(&record.title)
        .bind(&record.message)
        .bind(record.order_id)
        .bind(&record.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// 列出订单相关的通知记录
    pub async fn list_by_order(&self, order_id: i64) -> Result<Vec<StoredNotification>> {
        let records = sqlx::query_as::<_, StoredNotification>(
            r#"
            SELECT id, user_id, notification_type, title, message, order_id,
                   data, is_read, created_at
            FROM notifications
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
