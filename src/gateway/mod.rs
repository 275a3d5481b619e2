//! 动作执行网关
//!
//! ActionExecutor 把归一化后的动作交给真实环境执行（如 bot-gateway 的 WebSocket 服务）。
//! 执行失败、不可达或超时都不算 step 失败，由 StepCoordinator 降级为 dry-run 结果。

mod client;

pub use client::GatewayClient;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::action::Action;
use crate::core::error::ExecutorError;

/// 动作执行器接口
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// 执行动作，返回网关原样回复的 JSON
    async fn execute(&self, action: &Action) -> Result<Value, ExecutorError>;
}

/// 单步执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// 网关已执行并回复
    Executed(Value),
    /// 未真正执行（网关不可达 / 超时 / 未配置）
    DryRun { action: Action, reason: String },
}

impl ExecutionResult {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, ExecutionResult::DryRun { .. })
    }

    /// 对外 JSON：dry-run 渲染为 `{"ok": true, "dry_run": true, "action": ..., "reason": ...}`
    pub fn to_value(&self) -> Value {
        match self {
            ExecutionResult::Executed(reply) => reply.clone(),
            ExecutionResult::DryRun { action, reason } => json!({
                "ok": true,
                "dry_run": true,
                "action": action,
                "reason": reason,
            }),
        }
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_rendering() {
        let result = ExecutionResult::DryRun {
            action: Action::Chat { text: "hi".into() },
            reason: "timeout".into(),
        };
        assert!(result.is_dry_run());
        let v = result.to_value();
        assert_eq!(v["ok"], true);
        assert_eq!(v["dry_run"], true);
        assert_eq!(v["action"], json!({"type": "chat", "text": "hi"}));
    }

    #[test]
    fn test_executed_passes_reply_through() {
        let reply = json!({"ok": true, "echo": "hi"});
        let result = ExecutionResult::Executed(reply.clone());
        assert!(!result.is_dry_run());
        assert_eq!(serde_json::to_value(&result).unwrap(), reply);
    }
}
