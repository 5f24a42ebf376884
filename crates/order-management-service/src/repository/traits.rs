//! 仓储 Trait 定义
//!
//! 查询服务依赖这些只读接口而非具体实现，便于 mock 测试；
//! 写操作统一通过各仓储的 `*_in_tx` 关联函数在调用方事务中完成

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Order, OrderItem, Payment, PointsBalance, PointsLedgerEntry, Redemption, RewardsConfig,
};

/// 订单仓储接口（订单、明细、支付记录）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    async fn get_order(&self, id: i64) -> Result<Option<Order>>;
    async fn get_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>>;
    async fn get_payment(&self, id: i64) -> Result<Option<Payment>>;
    async fn get_payment_by_order(&self, order_id: i64) -> Result<Option<Payment>>;
}

/// 积分仓储接口（余额、流水、抵扣）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsRepositoryTrait: Send + Sync {
    async fn get_balance(&self, user_id: &str, seller_id: &str) -> Result<Option<PointsBalance>>;
    async fn list_history(
        &self,
        user_id: &str,
        seller_id: &str,
        limit: i64,
    ) -> Result<Vec<PointsLedgerEntry>>;
    async fn get_applied_redemption(&self, order_id: i64) -> Result<Option<Redemption>>;
}

/// 商家积分配置仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardsRepositoryTrait: Send + Sync {
    async fn get_config(&self, seller_id: &str) -> Result<Option<RewardsConfig>>;
}
