//! 模型侧能力：文本嵌入（HashingEmbedder 离线实现 / OpenAI 兼容实现）

pub mod embedding;

pub use embedding::{
    create_embedder_from_config, tokenize, EmbeddingProvider, HashingEmbedder, OpenAiEmbedder,
};
