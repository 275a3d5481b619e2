//! 上下文快照（Context）数据模型
//!
//! 字段声明顺序即序列化顺序：agent_id, goal, env, inventory, skills_index, rag_snippets, team。
//! 该顺序用于稳定的 prompt / 日志 / 哈希，不要调整字段顺序。

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 序列化后的顶层键顺序
pub const CONTEXT_KEY_ORDER: [&str; 7] = [
    "agent_id",
    "goal",
    "env",
    "inventory",
    "skills_index",
    "rag_snippets",
    "team",
];

/// 默认出生点坐标
pub const DEFAULT_POSITION: [i64; 3] = [0, 64, 0];

/// 默认时间段
pub const DEFAULT_TIME_OF_DAY: &str = "noon";

/// 单个 agent 单步的上下文快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Context {
    pub agent_id: String,
    pub goal: String,
    pub env: Env,
    /// 物品名 -> 数量
    #[serde(default)]
    pub inventory: BTreeMap<String, u64>,
    #[serde(default)]
    pub skills_index: Vec<String>,
    /// 由向量记忆检索得到的背景片段（可为空）
    #[serde(default)]
    pub rag_snippets: Vec<String>,
    #[serde(default)]
    pub team: Team,
}

impl Context {
    /// 附加检索片段（仅在校验前由 StepCoordinator 调用）
    pub fn with_rag_snippets(mut self, snippets: Vec<String>) -> Self {
        self.rag_snippets = snippets;
        self
    }

    /// 序列化为 JSON 文本（键顺序固定）
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// 环境信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Env {
    #[serde(alias = "pos", default = "default_position")]
    pub position: [i64; 3],
    #[serde(default = "default_time_of_day")]
    pub time_of_day: String,
    #[serde(default)]
    pub biome: Option<String>,
    #[serde(default)]
    pub nearby: Vec<String>,
}

fn default_position() -> [i64; 3] {
    DEFAULT_POSITION
}

fn default_time_of_day() -> String {
    DEFAULT_TIME_OF_DAY.to_string()
}

impl Default for Env {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            time_of_day: default_time_of_day(),
            biome: None,
            nearby: Vec::new(),
        }
    }
}

/// 队伍信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Team {
    #[serde(default)]
    pub teammates: Vec<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Context 的 JSON Schema（供外部工具与接入层展示）
pub fn context_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Context)).unwrap_or(serde_json::Value::Null)
}
