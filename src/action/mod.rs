//! 动作层：原始动作解析与归一化状态机

pub mod normalize;
pub mod raw;

pub use normalize::{normalize, Action};
pub use raw::RawAction;

use serde_json::Value;

use crate::core::error::ValidationError;

/// 解析并归一化一个 JSON 动作；只有字段级约束不满足时才返回错误
pub fn normalize_value(raw: &Value) -> Result<Action, ValidationError> {
    RawAction::from_value(raw).map(normalize)
}
