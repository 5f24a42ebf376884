//! 过期订单清理 Worker
//!
//! 以固定间隔调用 `ExpirationService::cancel_expired_orders`，
//! 取消超过付款期限仍未付款的订单。
//!
//! 订单认领使用 `FOR UPDATE SKIP LOCKED`，多实例部署时可同时运行

use std::sync::Arc;
use std::time::Duration;

use market_shared::config::OrderSettings;
use market_shared::observability::metrics;
use tracing::{debug, error, info};

use crate::service::ExpirationService;

/// 过期清理 Worker
pub struct ExpireWorker {
    service: Arc<ExpirationService>,
    /// 轮询间隔
    poll_interval: Duration,
    /// 每批认领的最大订单数
    batch_size: i64,
}

impl ExpireWorker {
    /// 创建 ExpireWorker 实例
    ///
    /// # 参数
    /// - `service`: 过期清理服务
    /// - `poll_interval_secs`: 轮询间隔（秒）
    /// - `batch_size`: 每批认领的最大订单数
    pub fn new(service: Arc<ExpirationService>, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            service,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            batch_size: batch_size.max(1),
        }
    }

    /// 按订单配置创建
    pub fn from_settings(service: Arc<ExpirationService>, settings: &OrderSettings) -> Self {
        Self::new(
            service,
            settings.reaper_interval_seconds,
            settings.reaper_batch_size,
        )
    }

    /// 主循环：持续清理过期订单直到进程退出
    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "ExpireWorker 已启动"
        );

        loop {
            match self.service.cancel_expired_orders(self.batch_size).await {
                Ok(0) => debug!("本轮没有需要取消的过期订单"),
                Ok(count) => info!(count, "本轮已取消过期订单"),
                Err(e) => error!(error = %e, "过期订单清理出错"),
            }

            metrics::set_worker_last_run("expire_worker");

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NotificationSender, PgNotificationSink};
    use crate::repository::NotificationRepository;

    fn service() -> Arc<ExpirationService> {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/test").unwrap();
        let sink = PgNotificationSink::new(Arc::new(NotificationRepository::new(pool.clone())));
        Arc::new(ExpirationService::new(
            pool,
            NotificationSender::new(Arc::new(sink)),
        ))
    }

    #[tokio::test]
    async fn test_expire_worker_creation() {
        let worker = ExpireWorker::from_settings(service(), &OrderSettings::default());

        assert_eq!(worker.poll_interval.as_secs(), 60);
        assert_eq!(worker.batch_size, 500);
    }

    #[tokio::test]
    async fn test_expire_worker_from_settings() {
        let settings = OrderSettings {
            reaper_interval_seconds: 15,
            reaper_batch_size: 50,
            ..OrderSettings::default()
        };
        let worker = ExpireWorker::from_settings(service(), &settings);

        assert_eq!(worker.poll_interval.as_secs(), 15);
        assert_eq!(worker.batch_size, 50);
    }

    #[tokio::test]
    async fn test_expire_worker_rejects_zero_values() {
        let worker = ExpireWorker::new(service(), 0, 0);

        assert_eq!(worker.poll_interval.as_secs(), 1);
        assert_eq!(worker.batch_size, 1);
    }
}
