//! 接入边界：把外部请求体（字段全可选）转换为 A2AMessage
//!
//! 规则：
//! - sender / receiver 缺失或为空 -> BoundaryError::MissingParticipants
//! - kind 缺省为 REQUEST，大小写不敏感；未知 kind -> BoundaryError::InvalidKind
//! - REQUEST 需要 task（task 优先，其次 action）；OFFER 需要 item 与 qty
//! - qty 为负 -> ConstructionError，消息不会入队

use serde::Deserialize;
use serde_json::{Map, Value};

use super::factory::MessageFactory;
use super::message::{A2AKind, A2AMessage};
use crate::core::error::{BoundaryError, SendError};

/// 发送请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    pub kind: Option<String>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub task: Option<String>,
    pub action: Option<String>,
    pub item: Option<String>,
    pub qty: Option<i64>,
    pub payload: Option<Map<String, Value>>,
    pub correlation_id: Option<String>,
}

impl SendRequest {
    /// 校验并构造消息（不入队）
    pub fn into_message(self, factory: &MessageFactory) -> Result<A2AMessage, SendError> {
        let sender = self.sender.filter(|s| !s.trim().is_empty());
        let receiver = self.receiver.filter(|s| !s.trim().is_empty());
        let (Some(sender), Some(receiver)) = (sender, receiver) else {
            return Err(BoundaryError::MissingParticipants.into());
        };

        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => A2AKind::Request,
            Some(k) => k
                .parse::<A2AKind>()
                .map_err(BoundaryError::InvalidKind)?,
        };

        let task = self.task.or(self.action);
        let draft = match kind {
            A2AKind::Request => {
                let task = task.ok_or(BoundaryError::MissingField {
                    kind: "request",
                    field: "task",
                })?;
                factory.request(sender, receiver, task).maybe_item(self.item)
            }
            A2AKind::Offer => {
                let (Some(item), Some(_)) = (self.item, self.qty) else {
                    return Err(BoundaryError::MissingField {
                        kind: "offer",
                        field: "item and qty",
                    }
                    .into());
                };
                let draft = factory.offer(sender, receiver, item);
                match task {
                    Some(t) => draft.task(t),
                    None => draft,
                }
            }
            other => {
                let draft = factory.message(other, sender, receiver).maybe_item(self.item);
                match task {
                    Some(t) => draft.task(t),
                    None => draft,
                }
            }
        };

        Ok(draft
            .maybe_qty(self.qty)
            .maybe_payload(self.payload)
            .maybe_correlation_id(self.correlation_id)
            .build()?)
    }
}

/// 外部传入的取件上限：None 或 <= 0 时返回 0，交给收件箱套用其配置的默认上限
pub fn fetch_limit(max: Option<i64>) -> usize {
    match max {
        Some(m) if m > 0 => usize::try_from(m).unwrap_or(usize::MAX),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConstructionError;

    fn req(kind: Option<&str>) -> SendRequest {
        SendRequest {
            kind: kind.map(String::from),
            sender: Some("botA".into()),
            receiver: Some("botB".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_participants_rejected() {
        let factory = MessageFactory::default();
        let body = SendRequest {
            sender: Some("".into()),
            receiver: Some("botB".into()),
            task: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(
            body.into_message(&factory).unwrap_err(),
            SendError::Boundary(BoundaryError::MissingParticipants)
        );
    }

    #[test]
    fn test_default_kind_is_request_with_action_alias() {
        let factory = MessageFactory::default();
        let body = SendRequest {
            action: Some("collect wood".into()),
            item: Some("log".into()),
            qty: Some(2),
            ..req(None)
        };
        let msg = body.into_message(&factory).unwrap();
        assert_eq!(msg.kind(), A2AKind::Request);
        assert_eq!(msg.task(), Some("collect wood"));
        assert_eq!(msg.qty(), Some(2));
    }

    #[test]
    fn test_invalid_kind() {
        let factory = MessageFactory::default();
        let err = SendRequest { task: Some("t".into()), ..req(Some("handoff")) }
            .into_message(&factory)
            .unwrap_err();
        assert_eq!(err, SendError::Boundary(BoundaryError::InvalidKind("handoff".into())));
    }

    #[test]
    fn test_offer_requires_item_and_qty() {
        let factory = MessageFactory::default();
        let err = SendRequest { item: Some("planks".into()), ..req(Some("offer")) }
            .into_message(&factory)
            .unwrap_err();
        assert!(matches!(err, SendError::Boundary(BoundaryError::MissingField { .. })));
    }

    #[test]
    fn test_offer_negative_qty_is_construction_error() {
        let factory = MessageFactory::default();
        let err = SendRequest {
            item: Some("planks".into()),
            qty: Some(-1),
            ..req(Some("OFFER"))
        }
        .into_message(&factory)
        .unwrap_err();
        assert_eq!(err, SendError::Construction(ConstructionError::NegativeQty(-1)));
    }

    #[test]
    fn test_info_and_reply_kinds() {
        let factory = MessageFactory::default();
        let msg = SendRequest {
            correlation_id: Some("msg_abc".into()),
            ..req(Some("accept"))
        }
        .into_message(&factory)
        .unwrap();
        assert_eq!(msg.kind(), A2AKind::Accept);
        assert_eq!(msg.correlation_id(), Some("msg_abc"));
    }

    #[test]
    fn test_fetch_limit() {
        assert_eq!(fetch_limit(None), 0);
        assert_eq!(fetch_limit(Some(0)), 0);
        assert_eq!(fetch_limit(Some(-5)), 0);
        assert_eq!(fetch_limit(Some(3)), 3);
    }

    #[tokio::test]
    async fn test_missing_limit_uses_mailbox_default() {
        use crate::a2a::{InMemoryMailbox, Mailbox};

        let factory = MessageFactory::default();
        let mailbox = InMemoryMailbox::with_default_limit(3);
        for _ in 0..5 {
            mailbox.send(factory.info("a", "b").build().unwrap()).await;
        }
        assert_eq!(mailbox.fetch("b", fetch_limit(None)).await.len(), 3);
        assert_eq!(mailbox.fetch("b", fetch_limit(Some(-1))).await.len(), 2);
    }
}
