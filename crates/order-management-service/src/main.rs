//! 订单管理服务
//!
//! 提供下单、支付审核、积分与履约的 REST API，并在后台运行过期订单清理。

use std::sync::Arc;

use axum::{Router, http::HeaderValue, middleware, routing::get};
use market_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use order_management::MIGRATOR;
use order_management::api::{self, AppState, handlers};
use order_management::worker::ExpireWorker;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("order-management-service").unwrap_or_default();

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting order-management-service on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;

    // 迁移默认开启，多实例部署时可由发布流程统一执行后关闭
    let run_migrations = std::env::var("MARKET_RUN_MIGRATIONS")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true);
    if run_migrations {
        db.run_migrations(&MIGRATOR).await?;
    }

    let state = AppState::new(db.clone(), config.orders.clone());

    // 启动过期订单清理 Worker
    let worker = ExpireWorker::from_settings(Arc::clone(&state.expiration_service), &config.orders);
    tokio::spawn(async move {
        worker.run().await;
    });

    let allowed_origins = std::env::var("MARKET_CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());
    let cors = if allowed_origins == "*" {
        if config.is_production() {
            warn!("MARKET_CORS_ORIGINS=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .nest("/api/v1", api::api_routes())
        .nest("/api/internal", api::internal_routes())
        .route("/health", get(handlers::system::health_check))
        .route("/ready", get(handlers::system::readiness_check))
        .layer(cors)
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
