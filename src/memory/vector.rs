//! 向量记忆：按 collection 存储文本与嵌入向量，按余弦距离检索
//!
//! VectorMemoryService 是 StepCoordinator 的外部依赖（RAG 片段来源）；
//! InMemoryVectorStore 为进程内实现，嵌入由注入的 EmbeddingProvider 提供。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::core::error::MemoryError;
use crate::llm::EmbeddingProvider;

/// 默认 collection 名
pub const DEFAULT_COLLECTION: &str = "mcp_mem_v1";

/// 单条检索结果（distance 越小越相关）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryHit {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

/// collection 统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    pub count: usize,
}

/// 向量记忆服务接口
#[async_trait]
pub trait VectorMemoryService: Send + Sync {
    /// 写入一条记忆，返回 id
    async fn add(
        &self,
        text: &str,
        kind: &str,
        metadata: Map<String, Value>,
        collection: &str,
    ) -> Result<String, MemoryError>;

    /// 批量写入；metadatas 若提供，长度必须与 texts 一致
    async fn add_batch(
        &self,
        texts: &[String],
        kind: &str,
        metadatas: Option<Vec<Map<String, Value>>>,
        collection: &str,
    ) -> Result<Vec<String>, MemoryError>;

    /// 检索最相关的 k 条
    async fn query(&self, text: &str, k: usize, collection: &str) -> Result<Vec<MemoryHit>, MemoryError>;

    async fn stats(&self, collection: &str) -> CollectionStats;

    /// 删除 collection；不存在时返回 false
    async fn drop_collection(&self, collection: &str) -> bool;

    async fn list_collections(&self) -> Vec<String>;
}

struct Entry {
    id: String,
    text: String,
    metadata: Map<String, Value>,
    vector: Vec<f32>,
}

#[derive(Default)]
struct Collection {
    entries: Vec<Entry>,
    /// 单调递增，删除旧条目后 id 也不复用
    next_seq: u64,
}

/// 内存向量库
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Collection>>,
    max_entries: usize,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, max_entries: usize) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        self.embedder.embed(text).await.map_err(MemoryError::Embedding)
    }

    fn insert(&self, col: &mut Collection, collection: &str, text: &str, metadata: Map<String, Value>, vector: Vec<f32>) -> String {
        col.next_seq += 1;
        let id = format!("{}__{}", collection, col.next_seq);
        col.entries.push(Entry {
            id: id.clone(),
            text: text.to_string(),
            metadata,
            vector,
        });
        let n = col.entries.len();
        if n > self.max_entries {
            col.entries.drain(0..n - self.max_entries);
        }
        id
    }
}

fn with_kind(mut metadata: Map<String, Value>, kind: &str) -> Map<String, Value> {
    metadata
        .entry("kind")
        .or_insert_with(|| Value::String(kind.to_string()));
    metadata
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorMemoryService for InMemoryVectorStore {
    async fn add(
        &self,
        text: &str,
        kind: &str,
        metadata: Map<String, Value>,
        collection: &str,
    ) -> Result<String, MemoryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MemoryError::EmptyText);
        }
        let vector = self.embed(text).await?;
        let mut collections = self.collections.write().await;
        let col = collections.entry(collection.to_string()).or_default();
        let id = self.insert(col, collection, text, with_kind(metadata, kind), vector);
        tracing::debug!(collection, id = %id, "memory add");
        Ok(id)
    }

    async fn add_batch(
        &self,
        texts: &[String],
        kind: &str,
        metadatas: Option<Vec<Map<String, Value>>>,
        collection: &str,
    ) -> Result<Vec<String>, MemoryError> {
        if let Some(m) = &metadatas {
            if m.len() != texts.len() {
                return Err(MemoryError::BatchMismatch {
                    texts: texts.len(),
                    metadatas: m.len(),
                });
            }
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(MemoryError::EmptyText);
        }

        // 先全部编码，任一失败则整批不写入
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text.trim()).await?);
        }

        let mut metadatas = metadatas.unwrap_or_else(|| vec![Map::new(); texts.len()]);
        let mut collections = self.collections.write().await;
        let col = collections.entry(collection.to_string()).or_default();
        let ids = texts
            .iter()
            .zip(vectors)
            .zip(metadatas.drain(..))
            .map(|((text, vector), metadata)| {
                self.insert(col, collection, text.trim(), with_kind(metadata, kind), vector)
            })
            .collect();
        Ok(ids)
    }

    async fn query(&self, text: &str, k: usize, collection: &str) -> Result<Vec<MemoryHit>, MemoryError> {
        if text.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embed(text).await?;
        let collections = self.collections.read().await;
        let Some(col) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<(f32, &Entry)> = col
            .entries
            .iter()
            .map(|e| (cosine_similarity(&query, &e.vector), e))
            .filter(|(s, _)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(sim, e)| MemoryHit {
                id: e.id.clone(),
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                distance: 1.0 - sim,
            })
            .collect())
    }

    async fn stats(&self, collection: &str) -> CollectionStats {
        let count = self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.entries.len())
            .unwrap_or(0);
        CollectionStats {
            collection: collection.to_string(),
            count,
        }
    }

    async fn drop_collection(&self, collection: &str) -> bool {
        self.collections.write().await.remove(collection).is_some()
    }

    async fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
