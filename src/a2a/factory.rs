//! 消息构造
//!
//! MessageFactory 持有注入的 Clock / IdGenerator，为每条消息分配 id 与 ts；
//! 各 kind 的构造入口返回 MessageDraft，build() 时统一做 qty 校验。
//! 空 sender / receiver 在这里不拒绝，留给接入边界处理，便于记录与排查畸形消息。

use std::sync::Arc;

use serde_json::{Map, Value};

use super::message::{A2AKind, A2AMessage};
use crate::core::clock::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crate::core::error::ConstructionError;

/// 消息工厂（进程内构造一次，多处共享）
#[derive(Clone)]
pub struct MessageFactory {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl MessageFactory {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// REQUEST：请求对方完成 task
    pub fn request(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        task: impl Into<String>,
    ) -> MessageDraft<'_> {
        self.message(A2AKind::Request, sender, receiver).task(task)
    }

    /// OFFER：向对方提供 item
    pub fn offer(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        item: impl Into<String>,
    ) -> MessageDraft<'_> {
        self.message(A2AKind::Offer, sender, receiver).item(item)
    }

    /// INFO：通知类消息
    pub fn info(&self, sender: impl Into<String>, receiver: impl Into<String>) -> MessageDraft<'_> {
        self.message(A2AKind::Info, sender, receiver)
    }

    /// ACCEPT：回复 original，收发方互换，correlation_id 指向 original
    pub fn accept(&self, original: &A2AMessage) -> MessageDraft<'_> {
        self.reply(A2AKind::Accept, original)
    }

    /// REJECT：同 accept
    pub fn reject(&self, original: &A2AMessage) -> MessageDraft<'_> {
        self.reply(A2AKind::Reject, original)
    }

    fn reply(&self, kind: A2AKind, original: &A2AMessage) -> MessageDraft<'_> {
        let mut draft = self
            .message(kind, original.receiver(), original.sender())
            .correlation_id(original.id());
        draft.item = original.item.clone();
        draft.qty = original.qty.and_then(|q| i64::try_from(q).ok());
        draft
    }

    /// 任意 kind 的通用入口
    pub fn message(
        &self,
        kind: A2AKind,
        sender: impl Into<String>,
        receiver: impl Into<String>,
    ) -> MessageDraft<'_> {
        MessageDraft {
            factory: self,
            kind,
            sender: sender.into(),
            receiver: receiver.into(),
            task: None,
            item: None,
            qty: None,
            payload: None,
            correlation_id: None,
        }
    }
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidIdGenerator))
    }
}

/// 待构造的消息；build() 时分配 id / ts 并校验
#[must_use]
pub struct MessageDraft<'a> {
    factory: &'a MessageFactory,
    kind: A2AKind,
    sender: String,
    receiver: String,
    task: Option<String>,
    item: Option<String>,
    qty: Option<i64>,
    payload: Option<Map<String, Value>>,
    correlation_id: Option<String>,
}

impl<'a> MessageDraft<'a> {
    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn maybe_item(mut self, item: Option<String>) -> Self {
        self.item = item;
        self
    }

    pub fn qty(mut self, qty: i64) -> Self {
        self.qty = Some(qty);
        self
    }

    pub fn maybe_qty(mut self, qty: Option<i64>) -> Self {
        self.qty = qty;
        self
    }

    pub fn payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn maybe_payload(mut self, payload: Option<Map<String, Value>>) -> Self {
        self.payload = payload;
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn maybe_correlation_id(mut self, id: Option<String>) -> Self {
        self.correlation_id = id;
        self
    }

    pub fn build(self) -> Result<A2AMessage, ConstructionError> {
        let qty = match self.qty {
            Some(q) if q < 0 => return Err(ConstructionError::NegativeQty(q)),
            Some(q) => Some(q as u64),
            None => None,
        };
        Ok(A2AMessage {
            id: self.factory.ids.next_id(),
            timestamp: self.factory.clock.now(),
            sender: self.sender,
            receiver: self.receiver,
            kind: self.kind,
            task: self.task,
            item: self.item,
            qty,
            payload: self.payload,
            correlation_id: self.correlation_id,
        })
    }
}
