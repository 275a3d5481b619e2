//! 动作归一化：按 type 判别字段把松散动作投影为固定形状
//!
//! ```text
//! chat  -> {type: chat,  text: text | message | ""}
//! mine  -> {type: mine,  resource: resource | target | "", qty: qty > 0 ? qty : 1}
//! craft -> {type: craft, recipe?: recipe, qty: qty >= 1 ? qty : 1}
//! 其它  -> 原样透传所有非 null 字段，保留 type
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::raw::RawAction;

/// 归一化后的可执行动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Chat { text: String },
    Mine { resource: String, qty: u64 },
    Craft { recipe: Option<String>, qty: u64 },
    /// 未知类型：保留 type 与全部非 null 字段，便于向前兼容
    Unknown { kind: String, fields: Map<String, Value> },
}

impl Action {
    /// type 判别值
    pub fn kind(&self) -> &str {
        match self {
            Action::Chat { .. } => "chat",
            Action::Mine { .. } => "mine",
            Action::Craft { .. } => "craft",
            Action::Unknown { kind, .. } => kind,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// 归一化；对任何 RawAction 都返回结果
pub fn normalize(raw: RawAction) -> Action {
    match raw.kind() {
        "chat" => Action::Chat {
            text: raw
                .str_field("text")
                .or_else(|| raw.str_field("message"))
                .unwrap_or_default()
                .to_string(),
        },
        "mine" => Action::Mine {
            resource: raw
                .str_field("resource")
                .or_else(|| raw.str_field("target"))
                .unwrap_or_default()
                .to_string(),
            qty: positive_or_one(raw.qty()),
        },
        "craft" => Action::Craft {
            recipe: raw.fields().get("recipe").and_then(Value::as_str).map(String::from),
            qty: positive_or_one(raw.qty()),
        },
        _ => {
            let kind = raw.kind().to_string();
            Action::Unknown {
                kind,
                fields: raw.into_fields(),
            }
        }
    }
}

fn positive_or_one(qty: Option<i64>) -> u64 {
    match qty {
        Some(q) if q > 0 => q as u64,
        _ => 1,
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Action::Chat { text } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "chat")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            Action::Mine { resource, qty } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "mine")?;
                map.serialize_entry("resource", resource)?;
                map.serialize_entry("qty", qty)?;
                map.end()
            }
            Action::Craft { recipe, qty } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "craft")?;
                if let Some(recipe) = recipe {
                    map.serialize_entry("recipe", recipe)?;
                }
                map.serialize_entry("qty", qty)?;
                map.end()
            }
            Action::Unknown { kind, fields } => {
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("type", kind)?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// 反序列化即「解析 + 归一化」；已归一化的动作再次归一化保持不变
impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let raw = RawAction::from_value(&value).map_err(D::Error::custom)?;
        Ok(normalize(raw))
    }
}
