//! 购物车与商品仓储
//!
//! 购物车由外部协作方维护，此处只提供下单时的原子取出清空与库存预留、释放

use sqlx::PgConnection;

use crate::error::Result;
use crate::models::CartLine;

/// 购物车仓储
///
/// 只提供加入调用方事务的操作
pub struct CartRepository;

impl CartRepository {
    /// 在事务中取出并清空购物车
    ///
    /// 删除与读取在同一条语句中完成：并发下单时后到者等待行锁，
    /// 先到事务提交后其 DELETE 不再匹配任何行，从而得到空购物车
    pub async fn take_cart_in_tx(
        tx: &mut PgConnection,
        buyer_id: &str,
        seller_id: &str,
    ) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            WITH taken AS (
                DELETE FROM cart_items
                WHERE buyer_id = $1 AND seller_id = $2
                RETURNING product_id, quantity
            )
            SELECT t.product_id, p.seller_id, p.title, p.price_cents,
                   t.quantity, p.is_active, p.stock
            FROM taken t
            JOIN seller_products p ON p.id = t.product_id
            ORDER BY t.product_id ASC
            "#,
        )
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_all(tx)
        .await?;

        Ok(lines)
    }

    /// 在事务中预留库存
    ///
    /// 不限库存的商品只校验上架状态；返回 false 表示已下架或库存不足
    pub async fn reserve_stock_in_tx(
        tx: &mut PgConnection,
        product_id: i64,
        seller_id: &str,
        quantity: i32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE seller_products
            SET stock = stock - $3, updated_at = NOW()
            WHERE id = $1
              AND seller_id = $2
              AND is_active = true
              AND (stock IS NULL OR stock >= $3)
            "#,
        )
        .bind(product_id)
        .bind(seller_id)
        .bind(quantity)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 在事务中释放订单占用的库存
    pub async fn release_stock_in_tx(tx: &mut PgConnection, order_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE seller_products p
            SET stock = p.stock + oi.quantity, updated_at = NOW()
            FROM order_items oi
            WHERE oi.order_id = $1
              AND p.id = oi.product_id
              AND p.stock IS NOT NULL
            "#,
        )
        .bind(order_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}
