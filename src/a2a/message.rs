//! A2A 消息协议定义
//!
//! 线上格式为扁平 JSON：id, ts, sender, receiver, kind, task/item/qty, payload, correlation_id；
//! kind 渲染为大写名称，缺省的可选字段直接省略（不输出 null）。
//! `task` 为规范字段名，`action` 作为输入别名接受。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// 线上时间戳格式：ISO-8601，微秒精度，`Z` 结尾
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// 消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum A2AKind {
    Request,
    Offer,
    Accept,
    Reject,
    Info,
}

impl A2AKind {
    pub const ALL: [A2AKind; 5] = [
        A2AKind::Request,
        A2AKind::Offer,
        A2AKind::Accept,
        A2AKind::Reject,
        A2AKind::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            A2AKind::Request => "REQUEST",
            A2AKind::Offer => "OFFER",
            A2AKind::Accept => "ACCEPT",
            A2AKind::Reject => "REJECT",
            A2AKind::Info => "INFO",
        }
    }
}

impl fmt::Display for A2AKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 大小写不敏感解析（"offer" / "OFFER" 均可）
impl FromStr for A2AKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        A2AKind::ALL
            .into_iter()
            .find(|k| k.as_str() == upper)
            .ok_or_else(|| s.to_string())
    }
}

/// A2A 消息；构造后不可变，只能通过 MessageFactory 创建或从线上格式解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct A2AMessage {
    pub(crate) id: String,
    #[serde(
        rename = "ts",
        alias = "timestamp",
        serialize_with = "serialize_ts",
        deserialize_with = "deserialize_ts"
    )]
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) sender: String,
    pub(crate) receiver: String,
    pub(crate) kind: A2AKind,
    #[serde(default, alias = "action", skip_serializing_if = "Option::is_none")]
    pub(crate) task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) qty: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) payload: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) correlation_id: Option<String>,
}

impl A2AMessage {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn kind(&self) -> A2AKind {
        self.kind
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    pub fn qty(&self) -> Option<u64> {
        self.qty
    }

    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// 线上格式（扁平 JSON 对象）
    pub fn to_wire(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 从线上格式还原
    pub fn from_wire(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

fn serialize_ts<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

fn deserialize_ts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(6))
        .map_err(serde::de::Error::custom)
}
