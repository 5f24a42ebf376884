//! 订单管理服务
//!
//! 本地商家市场的订单生命周期核心，负责所有订单、支付与积分状态变更。
//!
//! ## 核心功能
//!
//! - **下单**：将买家在某商家下的购物车原子地转为订单与支付记录
//! - **支付审核**：转账凭证上传与商家审核，现金支付由商家直接确认
//! - **积分发放**：付款确认时按商家积分配置与等级发放积分
//! - **积分抵扣**：以积分抵扣订单金额，每单最多一次
//! - **过期清理**：取消超过付款期限仍未付款的订单
//! - **履约流转**：送达、收货与完成
//! - **通知记录**：事务提交后输出通知记录，投递由外部负责
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `loyalty`: 积分计算（纯函数）
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `notification`: 通知记录与输出
//! - `worker`: 后台任务
//! - `api`: HTTP 接口层

pub mod api;
pub mod error;
pub mod loyalty;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;
pub mod worker;

pub use error::{OrderError, Result};
pub use models::*;
pub use notification::{
    NotificationBuilder, NotificationRecord, NotificationSender, NotificationSink, NotificationType,
};
pub use repository::{
    CartRepository, NotificationRepository, OrderRepository, PointsRepository, RewardsRepository,
};
pub use service::{
    ExpirationService, FulfillmentService, LoyaltyService, OrderQueryService, OrderService,
    PaymentService, dto,
};

/// 编译期嵌入的数据库迁移
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
