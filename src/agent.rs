//! Orchestrator：对外的编排入口
//!
//! 把时钟、ID 生成、消息工厂、收件箱、快照存储、向量记忆、执行网关与规划器组装在一起，
//! 供 CLI / HTTP 接入层共享（通常包在 `Arc` 里）。
//! `from_config` 按配置组装默认实现；`new` + `with_*` 便于测试逐个替换组件。

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::a2a::{A2AMessage, InMemoryMailbox, Mailbox, MessageDraft, MessageFactory, SendRequest};
use crate::action::{normalize, Action, RawAction};
use crate::config::AppConfig;
use crate::context::{build_context, validate, Context, EnvOverrides};
use crate::core::{
    Clock, ConstructionError, CoordinatorSettings, HeuristicPlanner, IdGenerator,
    InMemorySnapshotStore, MemoryError, Planner, SendError, SnapshotStore, StepCoordinator,
    StepError, StepOutcome, StepRequest, StepSnapshot, SystemClock, UuidIdGenerator,
    ValidationError,
};
use crate::gateway::{ActionExecutor, GatewayClient};
use crate::llm::create_embedder_from_config;
use crate::memory::{CollectionStats, InMemoryVectorStore, MemoryHit, VectorMemoryService};

pub struct Orchestrator {
    factory: MessageFactory,
    mailbox: Arc<dyn Mailbox>,
    memory: Arc<dyn VectorMemoryService>,
    coordinator: StepCoordinator,
    default_collection: String,
}

impl Orchestrator {
    /// 按配置组装：系统时钟 + uuid ID、内存收件箱 / 快照 / 向量库、启发式规划器；
    /// gateway.enabled 时接入 WebSocket 执行网关，memory.enabled 时 step 可检索记忆
    pub fn from_config(cfg: &AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids: Arc<dyn IdGenerator> = Arc::new(UuidIdGenerator);
        let embedder = create_embedder_from_config(&cfg.memory.embedding);
        let memory: Arc<dyn VectorMemoryService> =
            Arc::new(InMemoryVectorStore::new(embedder, cfg.memory.max_entries));
        let executor: Option<Arc<dyn ActionExecutor>> = if cfg.gateway.enabled {
            Some(Arc::new(GatewayClient::new(cfg.gateway.url.clone())))
        } else {
            None
        };

        let settings = CoordinatorSettings {
            memory_top_k: cfg.memory.top_k,
            default_collection: cfg.memory.default_collection.clone(),
            execute_timeout: Duration::from_millis(cfg.gateway.timeout_ms),
        };

        tracing::info!(
            app = %cfg.app.name,
            gateway = cfg.gateway.enabled,
            memory = cfg.memory.enabled,
            "orchestrator assembled"
        );

        Self::new(
            clock,
            ids,
            Arc::new(InMemoryMailbox::with_default_limit(cfg.mailbox.default_fetch_limit)),
            Arc::new(InMemorySnapshotStore::new()),
            memory,
            Arc::new(HeuristicPlanner),
        )
        .with_retrieval(cfg.memory.enabled)
        .with_executor_opt(executor)
        .with_settings(settings)
    }

    /// 逐个组件组装；默认开启记忆检索、不接执行网关
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        mailbox: Arc<dyn Mailbox>,
        snapshots: Arc<dyn SnapshotStore>,
        memory: Arc<dyn VectorMemoryService>,
        planner: Arc<dyn Planner>,
    ) -> Self {
        let coordinator =
            StepCoordinator::new(snapshots, planner, clock.clone()).with_memory(memory.clone());
        Self {
            factory: MessageFactory::new(clock, ids),
            mailbox,
            memory,
            coordinator,
            default_collection: CoordinatorSettings::default().default_collection,
        }
    }

    pub fn with_executor(self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.with_executor_opt(Some(executor))
    }

    fn with_executor_opt(mut self, executor: Option<Arc<dyn ActionExecutor>>) -> Self {
        if let Some(executor) = executor {
            self.coordinator = self.coordinator.with_executor(executor);
        }
        self
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.default_collection = settings.default_collection.clone();
        self.coordinator = self.coordinator.with_settings(settings);
        self
    }

    /// 关闭后 step 即使请求了 use_memory 也不检索
    fn with_retrieval(mut self, enabled: bool) -> Self {
        self.coordinator = self.coordinator.with_retrieval(enabled);
        self
    }

    pub fn factory(&self) -> &MessageFactory {
        &self.factory
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    // ---------- context / action ----------

    pub fn build_and_validate_context(
        &self,
        agent_id: &str,
        goal: &str,
        env: Option<EnvOverrides>,
    ) -> Result<Context, ValidationError> {
        let context = build_context(agent_id, goal, env);
        validate(&context)?;
        Ok(context)
    }

    pub fn normalize_action(&self, raw: RawAction) -> Action {
        normalize(raw)
    }

    // ---------- A2A ----------

    /// 构造并投递；构造失败时不入队
    pub async fn send_message(&self, draft: MessageDraft<'_>) -> Result<A2AMessage, ConstructionError> {
        let message = draft.build()?;
        self.mailbox.send(message.clone()).await;
        Ok(message)
    }

    /// 接入层的发送：先做边界校验再构造投递
    pub async fn send_request(&self, request: SendRequest) -> Result<A2AMessage, SendError> {
        let message = request.into_message(&self.factory)?;
        self.mailbox.send(message.clone()).await;
        Ok(message)
    }

    /// 取出 receiver 队首至多 max 条；max 为 0 时用默认上限
    pub async fn fetch_inbox(&self, receiver: &str, max: usize) -> Vec<A2AMessage> {
        self.mailbox.fetch(receiver, max).await
    }

    pub async fn pending(&self, receiver: &str) -> usize {
        self.mailbox.pending(receiver).await
    }

    // ---------- step / snapshot ----------

    pub async fn step(&self, request: StepRequest) -> Result<StepOutcome, StepError> {
        self.coordinator.step(request).await
    }

    pub async fn last_snapshot(&self, agent_id: &str) -> Option<StepSnapshot> {
        self.coordinator.last_snapshot(agent_id).await
    }

    pub async fn last_context(&self, agent_id: &str) -> Option<Context> {
        self.last_snapshot(agent_id).await.map(|s| s.context)
    }

    // ---------- memory ----------

    fn collection<'a>(&'a self, collection: Option<&'a str>) -> &'a str {
        collection.unwrap_or(&self.default_collection)
    }

    pub async fn memory_add(
        &self,
        text: &str,
        kind: &str,
        metadata: Map<String, Value>,
        collection: Option<&str>,
    ) -> Result<String, MemoryError> {
        self.memory
            .add(text, kind, metadata, self.collection(collection))
            .await
    }

    pub async fn memory_add_batch(
        &self,
        texts: &[String],
        kind: &str,
        metadatas: Option<Vec<Map<String, Value>>>,
        collection: Option<&str>,
    ) -> Result<Vec<String>, MemoryError> {
        self.memory
            .add_batch(texts, kind, metadatas, self.collection(collection))
            .await
    }

    pub async fn memory_query(
        &self,
        text: &str,
        k: usize,
        collection: Option<&str>,
    ) -> Result<Vec<MemoryHit>, MemoryError> {
        self.memory.query(text, k, self.collection(collection)).await
    }

    pub async fn memory_stats(&self, collection: Option<&str>) -> CollectionStats {
        self.memory.stats(self.collection(collection)).await
    }

    pub async fn memory_collections(&self) -> Vec<String> {
        self.memory.list_collections().await
    }

    pub async fn memory_drop(&self, collection: Option<&str>) -> bool {
        self.memory.drop_collection(self.collection(collection)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixedClock, SequentialIdGenerator};
    use crate::llm::HashingEmbedder;
    use chrono::TimeZone;

    fn orchestrator() -> Orchestrator {
        let clock = Arc::new(FixedClock::new(
            chrono::Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        ));
        Orchestrator::new(
            clock,
            Arc::new(SequentialIdGenerator::default()),
            Arc::new(InMemoryMailbox::new()),
            Arc::new(InMemorySnapshotStore::new()),
            Arc::new(InMemoryVectorStore::new(Arc::new(HashingEmbedder::default()), 100)),
            Arc::new(HeuristicPlanner),
        )
    }

    #[tokio::test]
    async fn test_send_then_fetch() {
        let o = orchestrator();
        let sent = o
            .send_message(o.factory().request("A", "B", "gather_wood"))
            .await
            .unwrap();
        assert_eq!(sent.id(), "msg_1");
        assert_eq!(o.pending("B").await, 1);
        let inbox = o.fetch_inbox("B", 0).await;
        assert_eq!(inbox, vec![sent]);
        assert!(o.fetch_inbox("B", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_construction_is_not_enqueued() {
        let o = orchestrator();
        let err = o
            .send_message(o.factory().offer("A", "B", "oak_log").qty(-1))
            .await
            .unwrap_err();
        assert_eq!(err, ConstructionError::NegativeQty(-1));
        assert_eq!(o.pending("B").await, 0);
    }

    #[tokio::test]
    async fn test_last_context_after_step() {
        let o = orchestrator();
        assert!(o.last_context("A").await.is_none());
        let outcome = o.step(StepRequest::new("A", "demo")).await.unwrap();
        assert_eq!(o.last_context("A").await, Some(outcome.context));
    }

    #[tokio::test]
    async fn test_memory_uses_default_collection() {
        let o = orchestrator();
        let id = o.memory_add("4 planks from 1 log", "recipe", Map::new(), None).await.unwrap();
        assert_eq!(id, "mcp_mem_v1__1");
        assert_eq!(o.memory_stats(None).await.count, 1);
        assert!(o.memory_drop(None).await);
        assert_eq!(o.memory_stats(None).await.count, 0);
    }

    #[test]
    fn test_build_and_validate_rejects_empty_agent() {
        let o = orchestrator();
        assert!(o.build_and_validate_context("", "demo", None).is_err());
        assert!(o.build_and_validate_context("A", "", None).is_ok());
    }
}
