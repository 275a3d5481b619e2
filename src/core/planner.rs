//! 规划器接口与内置启发式规划器
//!
//! 选择「做什么」不属于编排核心：这里只定义接口，并提供一个不依赖 LLM 的启发式实现。

use async_trait::async_trait;

use crate::action::RawAction;
use crate::context::Context;

/// 规划器：根据上下文给出一个原始动作（尚未归一化）
#[async_trait]
pub trait Planner: Send + Sync {
    async fn propose(&self, context: &Context) -> Result<RawAction, String>;
}

/// 启发式规划器：目标含 "shelter" 时去砍橡木，否则打个招呼
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlanner;

#[async_trait]
impl Planner for HeuristicPlanner {
    async fn propose(&self, context: &Context) -> Result<RawAction, String> {
        if context.goal.to_lowercase().contains("shelter") {
            Ok(RawAction::mine("oak_log", 5))
        } else {
            Ok(RawAction::chat(format!(
                "Hello from {}, pursuing goal: {}",
                context.agent_id, context.goal
            )))
        }
    }
}
