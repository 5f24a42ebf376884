//! 订单服务数据模型
//!
//! - `enums`: 订单、支付、积分相关的状态枚举
//! - `order`: 订单、订单明细、购物车快照
//! - `payment`: 支付记录
//! - `loyalty`: 积分配置、等级、流水、余额与抵扣

pub mod enums;
pub mod loyalty;
pub mod order;
pub mod payment;

pub use enums::*;
pub use loyalty::*;
pub use order::*;
pub use payment::*;
