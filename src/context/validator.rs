//! Context 校验
//!
//! 对任意 JSON 值做结构检查，收集所有问题字段路径后一次性返回；
//! 不会 panic，调用方总能拿到 Ok(Context) 或 Err(ValidationError)。

use serde_json::{Map, Value};

use super::model::Context;
use crate::core::error::{FieldIssue, ValidationError};

/// 校验一个 context 形状的值；通过时返回解析后的 Context
pub fn validate_context(raw: &Value) -> Result<Context, ValidationError> {
    let Some(obj) = raw.as_object() else {
        return Err(ValidationError::single("$", "context must be an object"));
    };

    let mut issues = Vec::new();

    match obj.get("agent_id") {
        None => issues.push(FieldIssue::new("agent_id", "field required")),
        Some(Value::String(s)) if s.is_empty() => {
            issues.push(FieldIssue::new("agent_id", "must not be empty"))
        }
        Some(Value::String(_)) => {}
        Some(_) => issues.push(FieldIssue::new("agent_id", "must be a string")),
    }

    match obj.get("goal") {
        None => issues.push(FieldIssue::new("goal", "field required")),
        Some(Value::String(_)) => {}
        Some(_) => issues.push(FieldIssue::new("goal", "must be a string")),
    }

    match obj.get("env") {
        None => issues.push(FieldIssue::new("env", "field required")),
        Some(Value::Object(env)) => check_env(env, &mut issues),
        Some(_) => issues.push(FieldIssue::new("env", "must be an object")),
    }

    match obj.get("inventory") {
        None => {}
        Some(Value::Object(items)) => {
            for (name, count) in items {
                if count.as_u64().is_none() {
                    issues.push(FieldIssue::new(
                        format!("inventory.{name}"),
                        "must be a non-negative integer",
                    ));
                }
            }
        }
        Some(_) => issues.push(FieldIssue::new("inventory", "must be an object")),
    }

    check_string_list(obj.get("skills_index"), "skills_index", &mut issues);
    check_string_list(obj.get("rag_snippets"), "rag_snippets", &mut issues);

    match obj.get("team") {
        None => {}
        Some(Value::Object(team)) => {
            check_string_list(team.get("teammates"), "team.teammates", &mut issues);
            check_string_list(team.get("messages"), "team.messages", &mut issues);
        }
        Some(_) => issues.push(FieldIssue::new("team", "must be an object")),
    }

    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    serde_json::from_value(raw.clone()).map_err(|e| ValidationError::single("$", e.to_string()))
}

/// 校验已构建的 Context（序列化后走同一套结构检查）
pub fn validate(context: &Context) -> Result<(), ValidationError> {
    let raw = serde_json::to_value(context).map_err(|e| ValidationError::single("$", e.to_string()))?;
    validate_context(&raw).map(|_| ())
}

fn check_env(env: &Map<String, Value>, issues: &mut Vec<FieldIssue>) {
    let (key, position) = match (env.get("position"), env.get("pos")) {
        (Some(p), _) => ("env.position", Some(p)),
        (None, Some(p)) => ("env.pos", Some(p)),
        (None, None) => ("env.position", None),
    };
    match position {
        None => {}
        Some(Value::Array(coords)) if coords.len() == 3 => {
            for (i, c) in coords.iter().enumerate() {
                if c.as_i64().is_none() {
                    issues.push(FieldIssue::new(format!("{key}[{i}]"), "must be an integer"));
                }
            }
        }
        Some(_) => issues.push(FieldIssue::new(key, "must be a list of 3 integers")),
    }

    match env.get("time_of_day") {
        None | Some(Value::String(_)) => {}
        Some(_) => issues.push(FieldIssue::new("env.time_of_day", "must be a string")),
    }

    match env.get("biome") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(FieldIssue::new("env.biome", "must be a string or null")),
    }

    check_string_list(env.get("nearby"), "env.nearby", issues);
}

fn check_string_list(value: Option<&Value>, path: &str, issues: &mut Vec<FieldIssue>) {
    match value {
        None => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    issues.push(FieldIssue::new(format!("{path}[{i}]"), "must be a string"));
                }
            }
        }
        Some(_) => issues.push(FieldIssue::new(path, "must be a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use serde_json::json;

    #[test]
    fn test_build_then_validate_ok() {
        let ctx = build_context("A", "Test goal", None);
        let raw = serde_json::to_value(&ctx).unwrap();
        let parsed = validate_context(&raw).unwrap();
        assert_eq!(parsed, ctx);
        assert!(validate(&ctx).is_ok());
    }

    #[test]
    fn test_whitespace_agent_id_accepted() {
        assert!(validate(&build_context(" ", "goal", None)).is_ok());
    }

    #[test]
    fn test_build_then_validate_varied_inputs() {
        let long_id = "agent-".repeat(200);
        let long_goal = "build a shelter near the river ".repeat(100);
        let ids = ["A", "bot_7", "ボット", "агент", "🤖", "a b c", "\"quoted\"", "x/y:z", long_id.as_str()];
        let goals = ["", "demo", "Build a Shelter!", "收集木头", "mine 64 stone; craft tools", "\n\t", long_goal.as_str()];
        for id in ids {
            for goal in goals {
                let ctx = build_context(id, goal, None);
                assert!(validate(&ctx).is_ok(), "agent_id={id:?} goal={goal:?}");
                let raw = serde_json::to_value(&ctx).unwrap();
                assert_eq!(validate_context(&raw).unwrap(), ctx);
            }
        }
    }

    #[test]
    fn test_empty_agent_id_rejected() {
        let ctx = build_context("", "goal", None);
        let err = validate(&ctx).unwrap_err();
        assert_eq!(err.paths(), vec!["agent_id"]);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = validate_context(&json!({"inventory": {}})).unwrap_err();
        assert_eq!(err.paths(), vec!["agent_id", "goal", "env"]);
    }

    #[test]
    fn test_negative_inventory_count() {
        let raw = json!({
            "agent_id": "A",
            "goal": "g",
            "env": {},
            "inventory": {"log": -2, "stone": 3}
        });
        let err = validate_context(&raw).unwrap_err();
        assert_eq!(err.paths(), vec!["inventory.log"]);
    }

    #[test]
    fn test_bad_position_shape() {
        let raw = json!({
            "agent_id": "A",
            "goal": "g",
            "env": {"position": [0, "y", 0], "nearby": "tree"}
        });
        let err = validate_context(&raw).unwrap_err();
        assert_eq!(err.paths(), vec!["env.position[1]", "env.nearby"]);

        let raw = json!({"agent_id": "A", "goal": "g", "env": {"pos": [1, 2]}});
        let err = validate_context(&raw).unwrap_err();
        assert_eq!(err.paths(), vec!["env.pos"]);
    }

    #[test]
    fn test_non_object_root() {
        let err = validate_context(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.paths(), vec!["$"]);
    }

    #[test]
    fn test_minimal_env_gets_defaults() {
        let raw = json!({"agent_id": "A", "goal": "g", "env": {}});
        let ctx = validate_context(&raw).unwrap();
        assert_eq!(ctx.env.position, [0, 64, 0]);
        assert!(ctx.team.teammates.is_empty());
    }
}
