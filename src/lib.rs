//! mcp-craft - 多智能体 Minecraft 编排核心
//!
//! 模块划分：
//! - **a2a**: agent 间消息协议（消息模型、工厂、收件箱、接入边界校验）
//! - **action**: 原始动作解析与归一化
//! - **agent**: Orchestrator 门面，组装各组件供 CLI / HTTP 使用
//! - **api**: HTTP 接入层（feature `http`）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **context**: 上下文模型、构建与校验
//! - **core**: 单步编排、快照、规划器接口、时钟与错误类型
//! - **gateway**: 动作执行网关（WebSocket）与 dry-run 降级
//! - **llm**: 文本嵌入
//! - **memory**: 向量记忆服务

pub mod a2a;
pub mod action;
pub mod agent;
#[cfg(feature = "http")]
pub mod api;
pub mod config;
pub mod context;
pub mod core;
pub mod gateway;
pub mod llm;
pub mod memory;
pub mod observability;

pub use agent::Orchestrator;
