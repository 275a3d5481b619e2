//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MCP_CRAFT__*` 覆盖（双下划线表示嵌套，如 `MCP_CRAFT__GATEWAY__URL=ws://bot:3000`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::a2a::DEFAULT_FETCH_LIMIT;
use crate::memory::DEFAULT_COLLECTION;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub memory: MemorySection,
    pub gateway: GatewaySection,
    pub mailbox: MailboxSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
}

fn default_app_name() -> String {
    "mcp-craft".to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

/// [memory] 段：向量记忆与 RAG 检索
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// step 中检索的片段数
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_collection")]
    pub default_collection: String,
    /// 每个 collection 保留的最大条目数，超出后丢弃最旧的
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default)]
    pub embedding: EmbeddingSection,
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    3
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: default_top_k(),
            default_collection: default_collection(),
            max_entries: default_max_entries(),
            embedding: EmbeddingSection::default(),
        }
    }
}

/// [memory.embedding] 段：hashing（离线）/ openai
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 仅 hashing 使用
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_provider() -> String {
    "hashing".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    256
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: None,
            dimensions: default_dimensions(),
        }
    }
}

/// [gateway] 段：动作执行网关（WebSocket）
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// 单次执行超时（毫秒），超时即 dry-run
    #[serde(default = "default_gateway_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_gateway_url() -> String {
    "ws://localhost:3000".to_string()
}

fn default_gateway_timeout_ms() -> u64 {
    2500
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_gateway_url(),
            timeout_ms: default_gateway_timeout_ms(),
        }
    }
}

/// [mailbox] 段
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxSection {
    #[serde(default = "default_fetch_limit")]
    pub default_fetch_limit: usize,
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

impl Default for MailboxSection {
    fn default() -> Self {
        Self {
            default_fetch_limit: default_fetch_limit(),
        }
    }
}

/// [server] 段：HTTP 接入层监听地址
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// 从 config 目录加载配置，环境变量 MCP_CRAFT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MCP_CRAFT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MCP_CRAFT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
