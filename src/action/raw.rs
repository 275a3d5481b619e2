//! 原始动作（规划器 / 外部输入给出的松散结构）
//!
//! 解析阶段负责字段级约束（type 必须是字符串、qty 不能为负等），
//! 通过后的 RawAction 交给 normalize，归一化本身不再失败。

use serde_json::{Map, Value};

use crate::core::error::{FieldIssue, ValidationError};

/// 已知的字符串字段；出现时必须是字符串
const STRING_FIELDS: [&str; 5] = ["text", "message", "resource", "target", "recipe"];

/// 松散动作：type 判别字段 + 其余所有非 null 字段（保留输入顺序）
#[derive(Debug, Clone, PartialEq)]
pub struct RawAction {
    kind: String,
    fields: Map<String, Value>,
}

impl RawAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// 聊天动作
    pub fn chat(text: impl Into<String>) -> Self {
        Self::new("chat").with("text", text.into())
    }

    /// 采集动作（target 为 resource 的输入别名）
    pub fn mine(target: impl Into<String>, qty: i64) -> Self {
        Self::new("mine").with("target", target.into()).with("qty", qty)
    }

    /// 追加字段；null 值会被忽略
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.fields.insert(key.into(), value);
        }
        self
    }

    /// 从 JSON 解析，收集所有字段问题
    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = raw.as_object() else {
            return Err(ValidationError::single("$", "action must be an object"));
        };

        let mut issues = Vec::new();
        let kind = match obj.get("type") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => {
                issues.push(FieldIssue::new("type", "field required"));
                String::new()
            }
            Some(_) => {
                issues.push(FieldIssue::new("type", "must be a string"));
                String::new()
            }
        };

        for key in STRING_FIELDS {
            if let Some(v) = obj.get(key) {
                if !v.is_null() && !v.is_string() {
                    issues.push(FieldIssue::new(key, "must be a string"));
                }
            }
        }

        match obj.get("qty") {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_i64() {
                Some(q) if q < 0 => issues.push(FieldIssue::new("qty", "qty must be >= 0")),
                Some(_) => {}
                None => issues.push(FieldIssue::new("qty", "must be an integer")),
            },
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        let fields = obj
            .iter()
            .filter(|(k, v)| k.as_str() != "type" && !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { kind, fields })
    }

    /// 平铺回 JSON（type 在前）
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.kind.clone()));
        obj.extend(self.fields.clone());
        Value::Object(obj)
    }

    /// 对程序构造的 RawAction 重新套用解析期约束
    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::from_value(&self.to_value())
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// 字符串字段；空字符串视为缺省（与「text or message」的回退语义一致）
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn qty(&self) -> Option<i64> {
        self.fields.get("qty").and_then(Value::as_i64)
    }
}
