//! StepCoordinator：编排单个 agent 的一步
//!
//! build context -> （可选）注入向量记忆片段 -> 校验 -> 规划 -> 归一化 -> 写快照 -> （可选）执行。
//! 只有上下文校验与规划失败会中止一步；记忆检索失败降级为空片段，执行失败 / 超时降级为 dry-run。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::timeout;

use super::clock::Clock;
use super::error::StepError;
use super::planner::Planner;
use super::snapshot::{SnapshotStore, StepSnapshot};
use crate::action::{normalize, Action};
use crate::context::{build_context, validate, Context, EnvOverrides};
use crate::gateway::{ActionExecutor, ExecutionResult};
use crate::memory::{VectorMemoryService, DEFAULT_COLLECTION};

/// 单步请求
#[derive(Debug, Clone, Default)]
pub struct StepRequest {
    pub agent_id: String,
    pub goal: String,
    pub env: Option<EnvOverrides>,
    /// 是否从向量记忆检索 RAG 片段
    pub use_memory: bool,
    /// 检索使用的 collection，None 时用默认 collection
    pub memory_collection: Option<String>,
    /// 是否把动作交给执行网关
    pub execute: bool,
}

impl StepRequest {
    pub fn new(agent_id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            goal: goal.into(),
            ..Default::default()
        }
    }

    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_memory(mut self, collection: Option<String>) -> Self {
        self.use_memory = true;
        self.memory_collection = collection;
        self
    }

    pub fn with_execute(mut self) -> Self {
        self.execute = true;
        self
    }
}

/// 单步结果
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub ok: bool,
    pub agent_id: String,
    pub goal: String,
    pub action: Action,
    #[serde(rename = "mcp_snapshot")]
    pub context: Context,
    #[serde(rename = "gateway_result", skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
}

/// 编排参数
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub memory_top_k: usize,
    pub default_collection: String,
    pub execute_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            memory_top_k: 3,
            default_collection: DEFAULT_COLLECTION.to_string(),
            execute_timeout: Duration::from_millis(2500),
        }
    }
}

/// 单步编排器：快照存储、规划器、时钟必需；向量记忆与执行器可选
pub struct StepCoordinator {
    snapshots: Arc<dyn SnapshotStore>,
    planner: Arc<dyn Planner>,
    clock: Arc<dyn Clock>,
    memory: Option<Arc<dyn VectorMemoryService>>,
    executor: Option<Arc<dyn ActionExecutor>>,
    retrieval: bool,
    settings: CoordinatorSettings,
}

impl StepCoordinator {
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        planner: Arc<dyn Planner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snapshots,
            planner,
            clock,
            memory: None,
            executor: None,
            retrieval: true,
            settings: CoordinatorSettings::default(),
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn VectorMemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 关闭后忽略 use_memory
    pub fn with_retrieval(mut self, enabled: bool) -> Self {
        self.retrieval = enabled;
        self
    }

    /// 执行一步
    pub async fn step(&self, req: StepRequest) -> Result<StepOutcome, StepError> {
        let mut context = build_context(&req.agent_id, &req.goal, req.env.clone());

        if req.use_memory && self.retrieval {
            let collection = req
                .memory_collection
                .as_deref()
                .unwrap_or(&self.settings.default_collection);
            let snippets = self.retrieve_snippets(&req.goal, collection).await;
            context = context.with_rag_snippets(snippets);
        }

        validate(&context).map_err(StepError::Context)?;

        let raw = self
            .planner
            .propose(&context)
            .await
            .map_err(StepError::Planner)?;
        let action = normalize(raw.validated().map_err(StepError::Action)?);

        self.snapshots
            .put(
                &req.agent_id,
                StepSnapshot {
                    context: context.clone(),
                    action: action.clone(),
                    timestamp: self.clock.now(),
                },
            )
            .await;

        tracing::info!(
            agent_id = %req.agent_id,
            action = action.kind(),
            rag_snippets = context.rag_snippets.len(),
            "step"
        );

        let execution = if req.execute {
            Some(self.execute(&req.agent_id, &action).await)
        } else {
            None
        };

        Ok(StepOutcome {
            ok: true,
            agent_id: req.agent_id,
            goal: req.goal,
            action,
            context,
            execution,
        })
    }

    /// agent 最近一步的快照
    pub async fn last_snapshot(&self, agent_id: &str) -> Option<StepSnapshot> {
        self.snapshots.get(agent_id).await
    }

    async fn retrieve_snippets(&self, goal: &str, collection: &str) -> Vec<String> {
        let Some(memory) = &self.memory else {
            tracing::debug!("memory retrieval requested but no memory service configured");
            return Vec::new();
        };
        match memory.query(goal, self.settings.memory_top_k, collection).await {
            Ok(hits) => hits.into_iter().map(|h| h.text).collect(),
            Err(e) => {
                tracing::warn!(collection, error = %e, "memory retrieval failed, continuing without snippets");
                Vec::new()
            }
        }
    }

    /// 在超时内执行动作；任何失败都降级为 dry-run，并输出 JSON 审计日志
    async fn execute(&self, agent_id: &str, action: &Action) -> ExecutionResult {
        let Some(executor) = &self.executor else {
            audit(agent_id, action, "skipped", 0);
            return ExecutionResult::DryRun {
                action: action.clone(),
                reason: "no executor configured".to_string(),
            };
        };

        let start = Instant::now();
        let result = timeout(self.settings.execute_timeout, executor.execute(action)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(reply)) => {
                audit(agent_id, action, "ok", duration_ms);
                ExecutionResult::Executed(reply)
            }
            Ok(Err(e)) => {
                audit(agent_id, action, "error", duration_ms);
                tracing::warn!(agent_id, error = %e, "action execution failed, falling back to dry-run");
                ExecutionResult::DryRun {
                    action: action.clone(),
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                audit(agent_id, action, "timeout", duration_ms);
                tracing::warn!(
                    agent_id,
                    timeout_ms = self.settings.execute_timeout.as_millis() as u64,
                    "action execution timed out, falling back to dry-run"
                );
                ExecutionResult::DryRun {
                    action: action.clone(),
                    reason: "timeout".to_string(),
                }
            }
        }
    }
}

fn audit(agent_id: &str, action: &Action, outcome: &str, duration_ms: u64) {
    let audit = serde_json::json!({
        "event": "action_audit",
        "agent_id": agent_id,
        "action": action.kind(),
        "ok": outcome == "ok",
        "outcome": outcome,
        "duration_ms": duration_ms,
    });
    tracing::info!(audit = %audit.to_string(), "action");
}
