//! 单步编排集成测试：记忆注入、执行网关降级、快照

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_craft::action::Action;
use mcp_craft::core::{
    CoordinatorSettings, ExecutorError, FixedClock, HeuristicPlanner, InMemorySnapshotStore,
    MemoryError, SequentialIdGenerator, StepCoordinator, StepRequest,
};
use mcp_craft::a2a::InMemoryMailbox;
use mcp_craft::gateway::{ActionExecutor, ExecutionResult};
use mcp_craft::llm::HashingEmbedder;
use mcp_craft::memory::{CollectionStats, InMemoryVectorStore, MemoryHit, VectorMemoryService};
use mcp_craft::Orchestrator;
use serde_json::{json, Map, Value};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(chrono::Utc::now()))
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(
        clock(),
        Arc::new(SequentialIdGenerator::default()),
        Arc::new(InMemoryMailbox::new()),
        Arc::new(InMemorySnapshotStore::new()),
        Arc::new(InMemoryVectorStore::new(Arc::new(HashingEmbedder::default()), 1000)),
        Arc::new(HeuristicPlanner),
    )
}

struct EchoExecutor;

#[async_trait]
impl ActionExecutor for EchoExecutor {
    async fn execute(&self, action: &Action) -> Result<Value, ExecutorError> {
        Ok(json!({ "ok": true, "echo": action.to_value() }))
    }
}

struct SlowExecutor;

#[async_trait]
impl ActionExecutor for SlowExecutor {
    async fn execute(&self, _action: &Action) -> Result<Value, ExecutorError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(json!({ "ok": true }))
    }
}

struct BrokenExecutor;

#[async_trait]
impl ActionExecutor for BrokenExecutor {
    async fn execute(&self, _action: &Action) -> Result<Value, ExecutorError> {
        Err(ExecutorError::Unreachable("connection refused".into()))
    }
}

struct FailingMemory;

#[async_trait]
impl VectorMemoryService for FailingMemory {
    async fn add(&self, _: &str, _: &str, _: Map<String, Value>, _: &str) -> Result<String, MemoryError> {
        Err(MemoryError::Embedding("offline".into()))
    }

    async fn add_batch(
        &self,
        _: &[String],
        _: &str,
        _: Option<Vec<Map<String, Value>>>,
        _: &str,
    ) -> Result<Vec<String>, MemoryError> {
        Err(MemoryError::Embedding("offline".into()))
    }

    async fn query(&self, _: &str, _: usize, _: &str) -> Result<Vec<MemoryHit>, MemoryError> {
        Err(MemoryError::Embedding("offline".into()))
    }

    async fn stats(&self, collection: &str) -> CollectionStats {
        CollectionStats { collection: collection.to_string(), count: 0 }
    }

    async fn drop_collection(&self, _: &str) -> bool {
        false
    }

    async fn list_collections(&self) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_shelter_step_mines_oak_log() {
    let o = orchestrator();
    let outcome = o.step(StepRequest::new("A", "build a shelter")).await.unwrap();
    assert_eq!(outcome.action, Action::Mine { resource: "oak_log".into(), qty: 5 });

    let v = serde_json::to_value(&outcome).unwrap();
    assert_eq!(v["action"], json!({ "type": "mine", "resource": "oak_log", "qty": 5 }));
    assert_eq!(v["mcp_snapshot"]["env"]["position"], json!([0, 64, 0]));
}

#[tokio::test]
async fn test_memory_snippets_are_injected() {
    let o = orchestrator();
    o.memory_add("crafting: 4 planks from 1 log", "recipe", Map::new(), None)
        .await
        .unwrap();
    let outcome = o
        .step(StepRequest::new("A", "make planks").with_memory(None))
        .await
        .unwrap();
    assert_eq!(outcome.context.rag_snippets, vec!["crafting: 4 planks from 1 log"]);
}

#[tokio::test]
async fn test_memory_failure_degrades_to_empty_snippets() {
    let c = StepCoordinator::new(
        Arc::new(InMemorySnapshotStore::new()),
        Arc::new(HeuristicPlanner),
        clock(),
    )
    .with_memory(Arc::new(FailingMemory));
    let outcome = c
        .step(StepRequest::new("A", "demo").with_memory(Some("other".into())))
        .await
        .unwrap();
    assert!(outcome.context.rag_snippets.is_empty());
}

#[tokio::test]
async fn test_executor_reply_is_returned() {
    let o = orchestrator().with_executor(Arc::new(EchoExecutor));
    let outcome = o.step(StepRequest::new("A", "demo").with_execute()).await.unwrap();
    match outcome.execution {
        Some(ExecutionResult::Executed(reply)) => assert_eq!(reply["echo"]["type"], "chat"),
        other => panic!("unexpected execution result: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_executor_times_out_to_dry_run() {
    let o = orchestrator()
        .with_executor(Arc::new(SlowExecutor))
        .with_settings(CoordinatorSettings {
            execute_timeout: Duration::from_millis(50),
            ..CoordinatorSettings::default()
        });
    let outcome = o.step(StepRequest::new("A", "demo").with_execute()).await.unwrap();
    let execution = outcome.execution.unwrap();
    assert!(execution.is_dry_run());
    let v = execution.to_value();
    assert_eq!(v["ok"], true);
    assert_eq!(v["dry_run"], true);
    assert_eq!(v["action"]["type"], "chat");
    // 快照在执行之前已写入
    assert!(o.last_snapshot("A").await.is_some());
}

#[tokio::test]
async fn test_unreachable_executor_falls_back_to_dry_run() {
    let o = orchestrator().with_executor(Arc::new(BrokenExecutor));
    let outcome = o.step(StepRequest::new("A", "demo").with_execute()).await.unwrap();
    assert!(outcome.execution.unwrap().is_dry_run());
}

#[tokio::test]
async fn test_snapshots_are_per_agent_and_overwritten() {
    let o = orchestrator();
    o.step(StepRequest::new("A", "first")).await.unwrap();
    o.step(StepRequest::new("B", "other")).await.unwrap();
    o.step(StepRequest::new("A", "second")).await.unwrap();

    assert_eq!(o.last_context("A").await.unwrap().goal, "second");
    assert_eq!(o.last_context("B").await.unwrap().goal, "other");
    assert!(o.last_context("C").await.is_none());
}
