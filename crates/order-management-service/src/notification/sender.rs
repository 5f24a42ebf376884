//! 通知发送器
//!
//! 业务服务在事务内收集通知记录，事务提交后交给 `NotificationSender` 输出。
//! 输出失败只记录日志和指标，不影响已提交的业务结果

use std::sync::Arc;

use market_shared::observability::metrics;
use tracing::{debug, warn};

use super::sink::NotificationSink;
use super::types::NotificationRecord;

/// 通知发送器
#[derive(Clone)]
pub struct NotificationSender {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationSender {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// 输出一批通知记录
    ///
    /// 必须在业务事务提交之后调用；返回成功输出的条数
    pub async fn dispatch(&self, records: Vec<NotificationRecord>) -> usize {
        let mut delivered = 0;

        for record in records {
            match self.sink.emit(&record).await {
                Ok(()) => {
                    delivered += 1;
                    debug!(
                        user_id = %record.user_id,
                        notification_type = record.notification_type.as_str(),
                        order_id = ?record.order_id,
                        "通知记录已写入"
                    );
                }
                Err(e) => {
                    metrics::record_notification_failure(record.notification_type.as_str());
                    warn!(
                        user_id = %record.user_id,
                        notification_type = record.notification_type.as_str(),
                        order_id = ?record.order_id,
                        error = %e,
                        "通知记录写入失败，已忽略"
                    );
                }
            }
        }

        delivered
    }
}
