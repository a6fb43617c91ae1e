use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod chroma;
#[cfg(test)]
pub mod memory;

/// What is stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Position of the chunk within its page.
    pub chunk: usize,
    pub page: usize,
    pub lesson: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct IndexedVector {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub metadata: ChunkMetadata,
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, entries: Vec<IndexedVector>) -> Result<()>;

    /// The `top_k` nearest entries, highest score first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}
