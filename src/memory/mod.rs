//! 记忆层：向量记忆服务（RAG 片段来源）

pub mod vector;

pub use vector::{
    CollectionStats, InMemoryVectorStore, MemoryHit, VectorMemoryService, DEFAULT_COLLECTION,
};
