//! 嵌入提供方：供向量记忆把文本编码为向量
//!
//! - HashingEmbedder：离线、确定性的词袋哈希向量（默认，无需任何 API）
//! - OpenAiEmbedder：调用 OpenAI 兼容的 /embeddings 端点

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::EmbeddingSection;

/// 嵌入提供方
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 将文本编码为向量；失败时返回错误字符串
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

/// 将文本切分为小写词（去掉两端标点，忽略单字符）
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > 1)
        .collect()
}

/// 词袋哈希嵌入：每个词哈希到固定维度的桶，结果做 L2 归一化
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }

    pub fn embed_now(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimensions];
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        Ok(self.embed_now(text))
    }
}

/// 使用 async-openai 调用 OpenAI 兼容的 embeddings API
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// api_key 未提供时读取 OPENAI_API_KEY
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();

        let config = match base_url {
            Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| e.to_string())?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;
        Ok(response
            .data
            .first()
            .map(|e| e.embedding.clone())
            .unwrap_or_default())
    }
}

/// 按配置创建嵌入提供方；openai 缺少 API Key 时回退到 HashingEmbedder
pub fn create_embedder_from_config(cfg: &EmbeddingSection) -> Arc<dyn EmbeddingProvider> {
    if cfg.provider.eq_ignore_ascii_case("openai") {
        let key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if key.is_some() {
            tracing::info!(model = %cfg.model, "using OpenAI embeddings");
            return Arc::new(OpenAiEmbedder::new(
                cfg.base_url.as_deref(),
                &cfg.model,
                key.as_deref(),
            ));
        }
        tracing::warn!("embedding provider 'openai' requested but OPENAI_API_KEY is not set, using hashing embedder");
    }
    Arc::new(HashingEmbedder::new(cfg.dimensions))
}
