//! HTTP 服务器
//!
//! 组合派生服务路由、`/metrics` 端点与全局中间件，并负责监听与优雅关闭

use crate::trace::http_trace_layer;
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use hashpass_common::HashpassConfig;
use passgen::{PassgenState, create_router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Prometheus metrics endpoint
async fn metrics_handler() -> String {
    hashpass_common::metrics::export_metrics()
}

/// 构建完整的应用路由
pub fn build_app(state: PassgenState) -> Router {
    create_router(state)
        .route("/metrics", get(metrics_handler))
        .layer(http_trace_layer())
        .layer(CorsLayer::permissive())
}

/// 绑定 HTTP 监听地址
pub async fn bind(config: &HashpassConfig) -> Result<TcpListener> {
    let addr: SocketAddr = config
        .socket_addr()
        .with_context(|| format!("Invalid bind address '{}'", config.bind_addr()))?;

    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address '{addr}'"))
}

/// 在后台启动 HTTP 服务器，收到关闭信号后优雅退出
pub fn spawn(
    listener: TcpListener,
    app: Router,
    shutdown_tx: broadcast::Sender<()>,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("HTTP server received shutdown signal");
        });
        if let Err(e) = server.await {
            error!("HTTP server error: {}", e);
            let _ = shutdown_tx.send(());
        }
        info!("HTTP server stopped");
    })
}
