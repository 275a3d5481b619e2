//! ContextBuilder：按默认值构建上下文快照
//!
//! 纯函数，不读时钟、不访问外部服务；相同输入必然得到相同输出。

use serde::Deserialize;

use super::model::{Context, Env, Team};

/// 调用方提供的环境覆盖项，未提供的字段沿用默认值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    #[serde(alias = "pos")]
    pub position: Option<[i64; 3]>,
    pub time_of_day: Option<String>,
    pub biome: Option<String>,
    pub nearby: Option<Vec<String>>,
}

impl EnvOverrides {
    pub fn apply(self, mut env: Env) -> Env {
        if let Some(position) = self.position {
            env.position = position;
        }
        if let Some(time_of_day) = self.time_of_day {
            env.time_of_day = time_of_day;
        }
        if self.biome.is_some() {
            env.biome = self.biome;
        }
        if let Some(nearby) = self.nearby {
            env.nearby = nearby;
        }
        env
    }
}

/// 构建上下文：环境覆盖项合并到默认环境，其余字段取空默认值
pub fn build_context(
    agent_id: impl Into<String>,
    goal: impl Into<String>,
    env: Option<EnvOverrides>,
) -> Context {
    let env = env.unwrap_or_default().apply(Env::default());
    Context {
        agent_id: agent_id.into(),
        goal: goal.into(),
        env,
        inventory: Default::default(),
        skills_index: Vec::new(),
        rag_snippets: Vec::new(),
        team: Team::default(),
    }
}
