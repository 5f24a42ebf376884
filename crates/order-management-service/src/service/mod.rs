//! 业务服务层
//!
//! - `OrderService`: 下单
//! - `PaymentService`: 上传与审核转账凭证
//! - `LoyaltyService`: 积分发放与抵扣
//! - `FulfillmentService`: 送达、收货与完成
//! - `ExpirationService`: 取消过期未付款订单
//! - `OrderQueryService`: 只读查询

pub mod dto;
mod expiration_service;
mod fulfillment_service;
mod loyalty_service;
mod order_service;
mod payment_service;
mod query_service;

pub use dto::*;
pub use expiration_service::{EXPIRED_REJECTION_REASON, ExpirationService};
pub use fulfillment_service::FulfillmentService;
pub use loyalty_service::{LoyaltyService, PointsAward};
pub use order_service::OrderService;
pub use payment_service::PaymentService;
pub use query_service::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, OrderQueryService};
