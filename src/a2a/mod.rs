//! A2A（agent-to-agent）消息协议
//!
//! - **message**: 消息结构与线上格式
//! - **factory**: 按 kind 构造消息（分配 id / ts，校验 qty）
//! - **mailbox**: 按 receiver 的 FIFO 收件箱
//! - **boundary**: 接入边界的请求体校验

pub mod boundary;
pub mod factory;
pub mod mailbox;
pub mod message;

pub use boundary::{fetch_limit, SendRequest};
pub use factory::{MessageDraft, MessageFactory};
pub use mailbox::{InMemoryMailbox, Mailbox, DEFAULT_FETCH_LIMIT};
pub use message::{A2AKind, A2AMessage, TIMESTAMP_FORMAT};
