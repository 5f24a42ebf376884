//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("orders_placed_total", "Total number of orders placed");
    metrics::describe_counter!(
        "payments_reviewed_total",
        "Total number of payment reviews by outcome"
    );
    metrics::describe_counter!("points_accrued_total", "Total loyalty points credited");
    metrics::describe_counter!("points_redeemed_total", "Total loyalty points redeemed");
    metrics::describe_counter!(
        "orders_expired_total",
        "Total number of orders cancelled by the expiration sweep"
    );
    metrics::describe_counter!(
        "notifications_failed_total",
        "Total number of notification records that failed to emit"
    );
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last completed worker cycle"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录下单
#[inline]
pub fn record_order_placed(payment_method: &str) {
    metrics::counter!(
        "orders_placed_total",
        "payment_method" => payment_method.to_string()
    )
    .increment(1);
}

/// 记录支付审核结果
#[inline]
pub fn record_payment_review(outcome: &str) {
    metrics::counter!(
        "payments_reviewed_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录积分发放
#[inline]
pub fn record_points_accrued(points: u64) {
    metrics::counter!("points_accrued_total").increment(points);
}

/// 记录积分抵扣
#[inline]
pub fn record_points_redeemed(points: u64) {
    metrics::counter!("points_redeemed_total").increment(points);
}

/// 记录过期取消的订单数
#[inline]
pub fn record_orders_expired(count: u64) {
    metrics::counter!("orders_expired_total").increment(count);
}

/// 记录通知写入失败
#[inline]
pub fn record_notification_failure(notification_type: &str) {
    metrics::counter!(
        "notifications_failed_total",
        "type" => notification_type.to_string()
    )
    .increment(1);
}

/// 记录 Worker 最近一次运行时间
#[inline]
pub fn set_worker_last_run(worker: &str) {
    metrics::gauge!(
        "worker_last_run_timestamp",
        "worker" => worker.to_string()
    )
    .set(chrono::Utc::now().timestamp() as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_http_request("GET", "/api/v1/orders/1", 200, 0.1);
        record_order_placed("transfer");
        record_payment_review("confirmed");
        record_points_accrued(41184);
        record_points_redeemed(100);
        record_orders_expired(3);
        record_notification_failure("order_placed");
        set_worker_last_run("expire_worker");
    }
}
