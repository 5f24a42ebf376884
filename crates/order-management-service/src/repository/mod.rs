//! 仓储层
//!
//! 每个仓储负责一组表：
//! - `CartRepository`: 购物车与商品库存
//! - `OrderRepository`: 订单、订单明细、支付记录
//! - `PointsRepository`: 积分余额、流水、抵扣记录
//! - `RewardsRepository`: 商家积分配置与等级
//! - `NotificationRepository`: 通知记录

mod cart_repo;
mod notification_repo;
mod order_repo;
mod points_repo;
mod rewards_repo;
mod traits;

pub use cart_repo::CartRepository;
pub use notification_repo::NotificationRepository;
pub use order_repo::OrderRepository;
pub use points_repo::PointsRepository;
pub use rewards_repo::RewardsRepository;
pub use traits::{OrderRepositoryTrait, PointsRepositoryTrait, RewardsRepositoryTrait};

#[cfg(test)]
pub use traits::{MockOrderRepositoryTrait, MockPointsRepositoryTrait, MockRewardsRepositoryTrait};
