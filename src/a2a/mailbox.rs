//! 收件箱：receiver -> FIFO 消息队列
//!
//! 每个 receiver 一把独立的锁：同一 receiver 的 send / fetch 互斥，
//! 不同 receiver 之间完全并行。状态只在进程内存中，重启即清空。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::message::A2AMessage;

/// 未指定或非法（0）上限时的默认取件数量
pub const DEFAULT_FETCH_LIMIT: usize = 10;

/// 收件箱存储接口（可替换为持久化实现）
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// 追加到 receiver 队尾
    async fn send(&self, message: A2AMessage);

    /// 取出队首至多 max 条并从队列移除；max 为 0 时使用默认上限
    async fn fetch(&self, receiver: &str, max: usize) -> Vec<A2AMessage>;

    /// 待取消息数（不消费）
    async fn pending(&self, receiver: &str) -> usize;
}

type Queue = Arc<Mutex<VecDeque<A2AMessage>>>;

/// 内存收件箱
pub struct InMemoryMailbox {
    queues: RwLock<HashMap<String, Queue>>,
    default_limit: usize,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::with_default_limit(DEFAULT_FETCH_LIMIT)
    }

    pub fn with_default_limit(default_limit: usize) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            default_limit: default_limit.max(1),
        }
    }

    async fn queue(&self, receiver: &str) -> Option<Queue> {
        self.queues.read().await.get(receiver).cloned()
    }

    async fn queue_or_create(&self, receiver: &str) -> Queue {
        if let Some(q) = self.queue(receiver).await {
            return q;
        }
        let mut queues = self.queues.write().await;
        queues
            .entry(receiver.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    /// 移除已取空的队列；仅当 map 与调用方之外没有其他持有者时才移除
    async fn prune(&self, receiver: &str, queue: &Queue) {
        let mut queues = self.queues.write().await;
        let Some(current) = queues.get(receiver) else {
            return;
        };
        if !Arc::ptr_eq(current, queue) || Arc::strong_count(queue) != 2 {
            return;
        }
        let empty = queue.try_lock().map(|q| q.is_empty()).unwrap_or(false);
        if empty {
            queues.remove(receiver);
        }
    }
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailbox for InMemoryMailbox {
    async fn send(&self, message: A2AMessage) {
        let queue = self.queue_or_create(message.receiver()).await;
        let mut queue = queue.lock().await;
        tracing::debug!(
            id = message.id(),
            kind = %message.kind(),
            sender = message.sender(),
            receiver = message.receiver(),
            "a2a enqueue"
        );
        queue.push_back(message);
    }

    async fn fetch(&self, receiver: &str, max: usize) -> Vec<A2AMessage> {
        let Some(queue) = self.queue(receiver).await else {
            return Vec::new();
        };
        let limit = if max == 0 { self.default_limit } else { max };
        let (taken, drained) = {
            let mut pending = queue.lock().await;
            let take = limit.min(pending.len());
            let taken: Vec<A2AMessage> = pending.drain(..take).collect();
            if !taken.is_empty() {
                tracing::debug!(receiver, count = taken.len(), remaining = pending.len(), "a2a fetch");
            }
            (taken, pending.is_empty())
        };
        if drained {
            self.prune(receiver, &queue).await;
        }
        taken
    }

    async fn pending(&self, receiver: &str) -> usize {
        match self.queue(receiver).await {
            Some(queue) => queue.lock().await.len(),
            None => 0,
        }
    }
}
