//! WebSocket 网关客户端
//!
//! 每次执行建立一条连接：发送一帧动作 JSON，等待一帧 JSON 回复后关闭。
//! 超时由调用方（StepCoordinator）统一施加。

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::ActionExecutor;
use crate::action::Action;
use crate::core::error::ExecutorError;

/// bot-gateway 的 WebSocket 客户端
#[derive(Debug, Clone)]
pub struct GatewayClient {
    url: String,
}

impl GatewayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ActionExecutor for GatewayClient {
    async fn execute(&self, action: &Action) -> Result<Value, ExecutorError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| ExecutorError::Unreachable(e.to_string()))?;
        let (mut tx, mut rx) = ws.split();

        let body = action.to_value().to_string();
        tx.send(WsMessage::Text(body))
            .await
            .map_err(|e| ExecutorError::Unreachable(e.to_string()))?;

        while let Some(msg) = rx.next().await {
            let msg = msg.map_err(|e| ExecutorError::Unreachable(e.to_string()))?;
            let text = match msg {
                WsMessage::Text(text) => text,
                WsMessage::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                WsMessage::Close(_) => break,
                _ => continue,
            };
            let reply: Value = serde_json::from_str(&text)
                .map_err(|e| ExecutorError::InvalidReply(e.to_string()))?;
            let _ = tx.send(WsMessage::Close(None)).await;
            return Ok(reply);
        }
        Err(ExecutorError::NoReply)
    }
}
