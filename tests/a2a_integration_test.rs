//! A2A 消息协议集成测试：工厂 + 收件箱 + 线格式

use std::sync::Arc;

use chrono::TimeZone;
use mcp_craft::a2a::{A2AKind, A2AMessage, InMemoryMailbox, Mailbox, MessageFactory, SendRequest};
use mcp_craft::core::{FixedClock, SendError, BoundaryError, SequentialIdGenerator};
use serde_json::json;

fn factory() -> MessageFactory {
    let clock = FixedClock::new(chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    MessageFactory::new(Arc::new(clock), Arc::new(SequentialIdGenerator::default()))
}

#[tokio::test]
async fn test_request_and_offer_are_fetched_in_send_order() {
    let f = factory();
    let mailbox = InMemoryMailbox::new();

    let m1 = f
        .request("botA", "botB", "collect wood")
        .item("log")
        .qty(2)
        .build()
        .unwrap();
    let mut payload = serde_json::Map::new();
    payload.insert("from".into(), json!("log"));
    let m2 = f.offer("botC", "botB", "planks").qty(4).payload(payload).build().unwrap();

    mailbox.send(m1.clone()).await;
    mailbox.send(m2.clone()).await;

    let inbox = mailbox.fetch("botB", 10).await;
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].kind(), A2AKind::Request);
    assert_eq!(inbox[0].task(), Some("collect wood"));
    assert_eq!(inbox[1].kind(), A2AKind::Offer);
    assert_eq!(inbox[1].item(), Some("planks"));

    assert!(mailbox.fetch("botB", 10).await.is_empty());
}

#[tokio::test]
async fn test_receivers_are_independent() {
    let f = factory();
    let mailbox = InMemoryMailbox::new();
    mailbox.send(f.info("A", "B").build().unwrap()).await;
    mailbox.send(f.info("A", "C").build().unwrap()).await;

    assert_eq!(mailbox.fetch("C", 0).await.len(), 1);
    assert_eq!(mailbox.pending("B").await, 1);
    assert!(mailbox.fetch("nobody", 5).await.is_empty());
}

#[tokio::test]
async fn test_fetch_respects_limit_and_keeps_remainder() {
    let f = factory();
    let mailbox = InMemoryMailbox::new();
    for i in 0..5 {
        mailbox
            .send(f.request("A", "B", format!("task-{i}")).build().unwrap())
            .await;
    }
    let first = mailbox.fetch("B", 2).await;
    let tasks: Vec<_> = first.iter().filter_map(|m| m.task()).collect();
    assert_eq!(tasks, vec!["task-0", "task-1"]);
    let rest = mailbox.fetch("B", 0).await;
    assert_eq!(rest.len(), 3);
    assert_eq!(rest[0].task(), Some("task-2"));
}

#[test]
fn test_wire_round_trip() {
    let f = factory();
    let original = f
        .request("A", "B", "gather")
        .item("oak_log")
        .qty(3)
        .correlation_id("msg_0")
        .build()
        .unwrap();
    let wire = original.to_wire();
    assert_eq!(wire["kind"], "REQUEST");
    assert_eq!(wire["ts"], "2026-03-01T12:00:00.000000Z");
    assert!(wire.get("payload").is_none());
    assert_eq!(A2AMessage::from_wire(&wire).unwrap(), original);
}

#[test]
fn test_accept_reply_swaps_participants() {
    let f = factory();
    let offer = f.offer("A", "B", "planks").qty(4).build().unwrap();
    let reply = f.accept(&offer).build().unwrap();
    assert_eq!(reply.kind(), A2AKind::Accept);
    assert_eq!(reply.sender(), "B");
    assert_eq!(reply.receiver(), "A");
    assert_eq!(reply.correlation_id(), Some(offer.id()));
    assert_eq!(reply.item(), Some("planks"));
    assert_eq!(reply.qty(), Some(4));
}

#[test]
fn test_boundary_rejects_missing_participants() {
    let f = factory();
    let req: SendRequest = serde_json::from_value(json!({
        "kind": "request",
        "sender": "",
        "receiver": "",
        "task": "x"
    }))
    .unwrap();
    assert_eq!(
        req.into_message(&f).unwrap_err(),
        SendError::Boundary(BoundaryError::MissingParticipants)
    );
}

#[test]
fn test_parsed_wire_message_round_trips() {
    let first = A2AMessage::from_wire(&json!({
        "id": "msg_x",
        "ts": "2026-03-01T12:00:00.987654321Z",
        "sender": "A",
        "receiver": "B",
        "kind": "OFFER",
        "item": "planks",
        "qty": 4
    }))
    .unwrap();
    let second = A2AMessage::from_wire(&first.to_wire()).unwrap();
    assert_eq!(second, first);
    assert_eq!(second.to_wire(), first.to_wire());
}
