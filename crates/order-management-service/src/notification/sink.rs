//! 通知落地
//!
//! `NotificationSink` 是通知记录的输出端，默认实现写入 notifications 表，
//! 由外部推送服务消费

use std::sync::Arc;

use async_trait::async_trait;

use super::types::NotificationRecord;
use crate::error::Result;
use crate::repository::NotificationRepository;

/// 通知输出端
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 输出一条通知记录
    async fn emit(&self, record: &NotificationRecord) -> Result<()>;
}

/// 写入数据库的通知输出端
pub struct PgNotificationSink {
    repo: Arc<NotificationRepository>,
}

impl PgNotificationSink {
    pub fn new(repo: Arc<NotificationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn emit(&self, record: &NotificationRecord) -> Result<()> {
        self.repo.create(record).await.map(|_| ())
    }
}
