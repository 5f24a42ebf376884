//! 下单服务
//!
//! 将买家在某商家下的购物车转为订单，整个过程在单个事务内完成：
//!
//! 1. 取出并清空购物车（单条 DELETE … RETURNING）
//! 2. 校验商品上架状态并预留库存
//! 3. 按当前价格计算总额
//! 4. 创建订单（placed / pending）、明细快照与支付记录
//! 5. 提交事务后输出 `order_placed`（买家）与 `new_order`（商家）通知

use chrono::{Duration, Utc};
use market_shared::config::OrderSettings;
use market_shared::observability::metrics;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{OrderError, Result};
use crate::models::{CartLine, NewOrder};
use crate::notification::{NotificationBuilder, NotificationSender};
use crate::repository::{CartRepository, OrderRepository};
use crate::service::dto::{PlaceOrderRequest, PlaceOrderResponse};

/// 下单服务
pub struct OrderService {
    pool: PgPool,
    sender: NotificationSender,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(pool: PgPool, sender: NotificationSender, settings: OrderSettings) -> Self {
        Self {
            pool,
            sender,
            settings,
        }
    }

    /// 下单
    #[instrument(skip(self, request), fields(buyer_id = %request.buyer_id, seller_id = %request.seller_id))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlaceOrderResponse> {
        let expiration_minutes = resolve_expiration(&self.settings, request.expiration_minutes)?;

        let mut tx = self.pool.begin().await?;

        // 1. 取出购物车，并发下单时后到者拿到空结果
        let lines =
            CartRepository::take_cart_in_tx(&mut tx, &request.buyer_id, &request.seller_id).await?;

        // 2-3. 校验商品并计算总额
        if lines.is_empty() {
            return Err(OrderError::EmptyCart {
                buyer_id: request.buyer_id.clone(),
                seller_id: request.seller_id.clone(),
            });
        }
        let total_cents = compute_total(&lines)
            .ok_or_else(|| OrderError::Validation("订单金额无效".to_string()))?;

        for line in &lines {
            if !line.is_available() {
                return Err(OrderError::ProductUnavailable(line.product_id));
            }
            let reserved = CartRepository::reserve_stock_in_tx(
                &mut tx,
                line.product_id,
                &request.seller_id,
                line.quantity,
            )
            .await?;
            if !reserved {
                return Err(OrderError::ProductUnavailable(line.product_id));
            }
        }

        // 4. 创建订单、明细与支付记录
        let new_order = NewOrder {
            order_no: generate_order_no(),
            buyer_id: request.buyer_id.clone(),
            seller_id: request.seller_id.clone(),
            total_cents,
            payment_method: request.payment_method,
            expires_at: Utc::now() + Duration::minutes(expiration_minutes),
            delivery_address: request.delivery_address.clone(),
            delivery_notes: request.delivery_notes.clone(),
        };
        let order = OrderRepository::create_order_in_tx(&mut tx, &new_order).await?;
        OrderRepository::create_items_in_tx(&mut tx, order.id, &lines).await?;
        let payment = OrderRepository::create_payment_in_tx(
            &mut tx,
            order.id,
            order.payment_method,
            order.total_cents,
        )
        .await?;

        tx.commit().await?;

        // 5. 事务提交后输出通知
        self.sender
            .dispatch(vec![
                NotificationBuilder::order_placed(
                    &order.buyer_id,
                    order.id,
                    &order.order_no,
                    order.total_cents,
                ),
                NotificationBuilder::new_order(
                    &order.seller_id,
                    order.id,
                    &order.order_no,
                    order.total_cents,
                ),
            ])
            .await;

        metrics::record_order_placed(order.payment_method.as_str());

        info!(
            order_id = order.id,
            order_no = %order.order_no,
            total_cents = order.total_cents,
            item_count = lines.len(),
            expires_at = %order.expires_at,
            "下单成功"
        );

        Ok(PlaceOrderResponse {
            order_id: order.id,
            order_no: order.order_no,
            payment_id: payment.id,
            total_cents: order.total_cents,
            expires_at: order.expires_at,
        })
    }
}

/// 确定付款期限（分钟）
fn resolve_expiration(settings: &OrderSettings, requested: Option<i64>) -> Result<i64> {
    let minutes = requested.unwrap_or(settings.default_expiration_minutes);
    if minutes <= 0 || minutes > settings.max_expiration_minutes {
        return Err(OrderError::Validation(format!(
            "付款期限必须在 1 到 {} 分钟之间: {}",
            settings.max_expiration_minutes, minutes
        )));
    }
    Ok(minutes)
}

/// 计算购物车总额
///
/// 购物车为空、总额为零或溢出时返回 None
fn compute_total(lines: &[CartLine]) -> Option<i64> {
    let total = lines
        .iter()
        .try_fold(0i64, |acc, line| acc.checked_add(line.subtotal_cents()?))?;
    (total > 0).then_some(total)
}

/// 生成订单号
///
/// 格式: OD{yyyyMMddHHmmss}{6位随机数}
fn generate_order_no() -> String {
    let now = Utc::now();
    let random = Uuid::new_v4().as_u128() % 1_000_000;
    format!("OD{}{:06}", now.format("%Y%m%d%H%M%S"), random)
}
