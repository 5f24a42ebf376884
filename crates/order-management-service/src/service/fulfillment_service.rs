//! 履约服务
//!
//! 付款确认后的订单流转：
//! `seller_confirmed → delivered → buyer_confirmed_received → completed`

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{OrderError, Result};
use crate::models::{Order, OrderStatus};
use crate::notification::{NotificationBuilder, NotificationRecord, NotificationSender};
use crate::repository::OrderRepository;
use crate::service::dto::FulfillmentResponse;

/// 操作人角色
#[derive(Debug, Clone, Copy)]
enum Actor<'a> {
    Seller(&'a str),
    Buyer(&'a str),
    System,
}

impl Actor<'_> {
    fn check(&self, order: &Order) -> Result<()> {
        match self {
            Actor::Seller(id) if order.seller_id != *id => Err(OrderError::Forbidden(format!(
                "{} 不是订单 {} 的商家",
                id, order.id
            ))),
            Actor::Buyer(id) if order.buyer_id != *id => Err(OrderError::Forbidden(format!(
                "{} 不是订单 {} 的买家",
                id, order.id
            ))),
            _ => Ok(()),
        }
    }
}

/// 履约服务
pub struct FulfillmentService {
    pool: PgPool,
    sender: NotificationSender,
}

impl FulfillmentService {
    pub fn new(pool: PgPool, sender: NotificationSender) -> Self {
        Self { pool, sender }
    }

    /// 商家确认送达
    #[instrument(skip(self))]
    pub async fn confirm_delivery(&self, order_id: i64, seller_id: &str) -> Result<FulfillmentResponse> {
        self.transition(
            order_id,
            Actor::Seller(seller_id),
            OrderStatus::SellerConfirmed,
            OrderStatus::Delivered,
            |order| {
                vec![NotificationBuilder::order_delivered(
                    &order.buyer_id,
                    order.id,
                    &order.order_no,
                )]
            },
        )
        .await
    }

    /// 买家确认收货
    #[instrument(skip(self))]
    pub async fn confirm_receipt(&self, order_id: i64, buyer_id: &str) -> Result<FulfillmentResponse> {
        self.transition(
            order_id,
            Actor::Buyer(buyer_id),
            OrderStatus::Delivered,
            OrderStatus::BuyerConfirmedReceived,
            |order| {
                vec![NotificationBuilder::order_received(
                    &order.seller_id,
                    order.id,
                    &order.order_no,
                )]
            },
        )
        .await
    }

    /// 完成订单
    #[instrument(skip(self))]
    pub async fn complete_order(&self, order_id: i64) -> Result<FulfillmentResponse> {
        self.transition(
            order_id,
            Actor::System,
            OrderStatus::BuyerConfirmedReceived,
            OrderStatus::Completed,
            |order| {
                vec![
                    NotificationBuilder::order_completed(&order.buyer_id, order.id, &order.order_no),
                    NotificationBuilder::order_completed(&order.seller_id, order.id, &order.order_no),
                ]
            },
        )
        .await
    }

    async fn transition<F>(
        &self,
        order_id: i64,
        actor: Actor<'_>,
        from: OrderStatus,
        to: OrderStatus,
        notify: F,
    ) -> Result<FulfillmentResponse>
    where
        F: FnOnce(&Order) -> Vec<NotificationRecord>,
    {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::lock_order_in_tx(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        actor.check(&order)?;

        if order.status != from || !from.can_transition_to(to) {
            return Err(OrderError::not_eligible(
                order.id,
                format!(
                    "当前状态 {} 不能变更为 {}",
                    order.status.as_str(),
                    to.as_str()
                ),
            ));
        }

        let rows = OrderRepository::transition_status_in_tx(&mut tx, order.id, from, to).await?;
        if rows == 0 {
            return Err(OrderError::ConcurrentModification);
        }

        tx.commit().await?;

        self.sender.dispatch(notify(&order)).await;

        info!(
            order_id = order.id,
            from = from.as_str(),
            to = to.as_str(),
            "订单状态已变更"
        );

        Ok(FulfillmentResponse {
            order_id: order.id,
            status: to,
        })
    }
}
