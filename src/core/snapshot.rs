//! 快照存储：每个 agent 仅保留最近一步的 {context, action, ts}
//!
//! 新快照直接覆盖旧快照（不合并）。按 agent 分锁，不同 agent 互不阻塞。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::action::Action;
use crate::context::Context;

/// 单个 agent 最近一步的快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSnapshot {
    #[serde(rename = "mcp")]
    pub context: Context,
    #[serde(rename = "last_action")]
    pub action: Action,
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
}

/// 快照存储接口（可替换为持久化实现）
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 写入并覆盖 agent 的快照
    async fn put(&self, agent_id: &str, snapshot: StepSnapshot);

    async fn get(&self, agent_id: &str) -> Option<StepSnapshot>;
}

type Slot = Arc<Mutex<Option<StepSnapshot>>>;

/// 内存快照存储
#[derive(Default)]
pub struct InMemorySnapshotStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, agent_id: &str) -> Slot {
        if let Some(slot) = self.slots.read().await.get(agent_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(agent_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, agent_id: &str, snapshot: StepSnapshot) {
        let slot = self.slot(agent_id).await;
        *slot.lock().await = Some(snapshot);
    }

    async fn get(&self, agent_id: &str) -> Option<StepSnapshot> {
        let slot = self.slots.read().await.get(agent_id).cloned()?;
        let snapshot = slot.lock().await.clone();
        snapshot
    }
}
