//! 错误类型
//!
//! 按失败来源划分：结构校验（ValidationError）、构造期（ConstructionError）、
//! 接入边界（BoundaryError）、外部服务降级（MemoryError / ExecutorError），
//! 以及 StepCoordinator 对外暴露的 StepError。

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// 单个字段的校验问题（path 形如 `env.position[1]`、`inventory.log`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// 结构校验错误：上下文或原始动作缺字段 / 类型不符；携带全部问题字段
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("validation failed: {}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldIssue::new(path, message)])
    }

    /// 出错的字段路径列表
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.path.as_str()).collect()
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 构造期错误：消息在入队前即被拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("qty must be >= 0 (got {0})")]
    NegativeQty(i64),
}

/// 接入边界错误（如网络入口处缺 sender / receiver）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("sender and receiver are required")]
    MissingParticipants,

    #[error("invalid kind: {0}")]
    InvalidKind(String),

    #[error("{kind} requires {field}")]
    MissingField { kind: &'static str, field: &'static str },
}

/// 发送入口的错误：边界校验失败或构造失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// 向量记忆服务错误；在 step 中一律降级为空 snippets
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("memory text must not be empty")]
    EmptyText,

    #[error("metadatas length {metadatas} does not match texts length {texts}")]
    BatchMismatch { texts: usize, metadatas: usize },

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// 动作执行网关错误；在 step 中一律降级为 dry-run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("gateway closed without reply")]
    NoReply,

    #[error("invalid gateway reply: {0}")]
    InvalidReply(String),
}

/// 单步编排失败（只有校验与规划失败会中止一步；外部服务故障走降级）
#[derive(Error, Debug, Clone)]
pub enum StepError {
    #[error("context validation failed: {0}")]
    Context(ValidationError),

    #[error("action validation failed: {0}")]
    Action(ValidationError),

    #[error("planner failed: {0}")]
    Planner(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_qty_message() {
        let err = ConstructionError::NegativeQty(-1);
        assert!(err.to_string().contains("qty must be >= 0"));
    }

    #[test]
    fn test_validation_error_lists_paths() {
        let err = ValidationError::new(vec![
            FieldIssue::new("agent_id", "must not be empty"),
            FieldIssue::new("inventory.log", "must be a non-negative integer"),
        ]);
        assert_eq!(err.paths(), vec!["agent_id", "inventory.log"]);
        let text = err.to_string();
        assert!(text.contains("agent_id: must not be empty"));
        assert!(text.contains("inventory.log"));
    }

    #[test]
    fn test_send_error_wraps_boundary() {
        let err: SendError = BoundaryError::MissingParticipants.into();
        assert_eq!(err.to_string(), "sender and receiver are required");
    }
}
