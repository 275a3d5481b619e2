//! mcp-craft HTTP 服务
//!
//! 启动: cargo run --bin mcp-craft-server --features http
//! 监听地址取自 [server].bind，可用环境变量 MCP_CRAFT_BIND 覆盖

use std::sync::Arc;

use anyhow::Context;
use mcp_craft::{api, config::load_config, observability, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let orchestrator = Arc::new(Orchestrator::from_config(&cfg));
    let app = api::router(orchestrator);

    let bind = std::env::var("MCP_CRAFT_BIND").unwrap_or_else(|_| cfg.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("mcp-craft orchestrator: http://{}", bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
