//! 应用状态定义
//!
//! 包含 Axum 路由共享的服务实例

use std::sync::Arc;

use market_shared::config::OrderSettings;
use market_shared::database::Database;

use crate::notification::{NotificationSender, PgNotificationSink};
use crate::repository::{
    NotificationRepository, OrderRepository, PointsRepository, RewardsRepository,
};
use crate::service::{
    ExpirationService, FulfillmentService, LoyaltyService, OrderQueryService, OrderService,
    PaymentService,
};

/// 基于 PostgreSQL 仓储的查询服务
pub type QueryService = OrderQueryService<OrderRepository, PointsRepository, RewardsRepository>;

/// Axum 应用共享状态
///
/// 各服务通过 Arc 在 handler 与后台 Worker 之间共享
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: OrderSettings,
    pub order_service: Arc<OrderService>,
    pub payment_service: Arc<PaymentService>,
    pub loyalty_service: Arc<LoyaltyService>,
    pub fulfillment_service: Arc<FulfillmentService>,
    pub expiration_service: Arc<ExpirationService>,
    pub query_service: Arc<QueryService>,
}

impl AppState {
    /// 组装全部服务
    pub fn new(db: Database, settings: OrderSettings) -> Self {
        let pool = db.pool().clone();

        let sink = PgNotificationSink::new(Arc::new(NotificationRepository::new(pool.clone())));
        let sender = NotificationSender::new(Arc::new(sink));

        let query_service = OrderQueryService::new(
            Arc::new(OrderRepository::new(pool.clone())),
            Arc::new(PointsRepository::new(pool.clone())),
            Arc::new(RewardsRepository::new(pool.clone())),
        );

        Self {
            order_service: Arc::new(OrderService::new(
                pool.clone(),
                sender.clone(),
                settings.clone(),
            )),
            payment_service: Arc::new(PaymentService::new(
                pool.clone(),
                sender.clone(),
                settings.clone(),
            )),
            loyalty_service: Arc::new(LoyaltyService::new(pool.clone(), sender.clone())),
            fulfillment_service: Arc::new(FulfillmentService::new(pool.clone(), sender.clone())),
            expiration_service: Arc::new(ExpirationService::new(pool, sender)),
            query_service: Arc::new(query_service),
            db,
            settings,
        }
    }
}
