//! 通知模块
//!
//! - `types`: 通知类型、通知记录与构建器
//! - `sink`: 通知输出端抽象与数据库实现
//! - `sender`: 事务提交后输出通知，失败不回滚业务

pub mod sender;
pub mod sink;
pub mod types;

pub use sender::NotificationSender;
pub use sink::{NotificationSink, PgNotificationSink};
pub use types::{NotificationBuilder, NotificationRecord, NotificationType, StoredNotification};
