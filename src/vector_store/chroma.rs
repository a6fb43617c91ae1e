use async_trait::async_trait;
use chromadb::client::{ChromaAuthMethod, ChromaClient, ChromaClientOptions};
use chromadb::collection::{ChromaCollection, CollectionEntries, QueryOptions};
use log::{debug, info};
use serde_json::{json, map::Map, Value};

use super::{ChunkMetadata, IndexedVector, ScoredChunk, VectorStore};
use crate::error::{Result, TutorError};
use crate::Config;

/// Chroma collection holding the textbook chunks.
///
/// Chunk text goes into the collection's documents; page, lesson and chunk
/// index into the metadata. The collection uses cosine distance, reported
/// back as `1 - distance`.
pub struct ChromaStore {
    client: ChromaClient,
    collection: String,
}

fn store_error(context: &str, err: impl std::fmt::Display) -> TutorError {
    TutorError::Store(format!("{context}: {err}"))
}

impl ChromaStore {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let auth = ChromaAuthMethod::None;
        let client = ChromaClient::new(ChromaClientOptions {
            url: Some(config.db_url.clone()),
            auth,
            ..Default::default()
        })
        .await
        .map_err(|err| store_error("database connection failed", err))?;
        Ok(Self {
            client,
            collection: config.index_name.clone(),
        })
    }

    async fn get_collection(&self) -> Result<ChromaCollection> {
        let mut metadata = Map::new();
        metadata.insert("hnsw:space".to_string(), json!("cosine"));
        self.client
            .get_or_create_collection(&self.collection, Some(metadata))
            .await
            .map_err(|err| store_error(&format!("cannot open collection {}", self.collection), err))
    }
}

fn to_chroma_metadata(metadata: &ChunkMetadata) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("chunk".to_string(), json!(metadata.chunk));
    map.insert("page".to_string(), json!(metadata.page));
    // Chroma rejects null metadata values.
    if let Some(lesson) = &metadata.lesson {
        map.insert("lesson".to_string(), json!(lesson));
    }
    map
}

fn from_chroma_metadata(metadata: &Value, text: String) -> ChunkMetadata {
    let number = |key: &str| metadata.get(key).and_then(Value::as_u64).unwrap_or_default() as usize;
    let lesson = metadata.get("lesson").and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    ChunkMetadata {
        chunk: number("chunk"),
        page: number("page"),
        lesson,
        text,
    }
}

/// Results come back one row per query embedding; we only ever send one.
fn first_row(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => match rows.into_iter().next() {
            Some(Value::Array(row)) => row,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn to_scored(documents: Value, metadatas: Value, distances: Value) -> Vec<ScoredChunk> {
    let metadatas = first_row(metadatas);
    let distances = first_row(distances);
    first_row(documents)
        .into_iter()
        .enumerate()
        .map(|(i, document)| {
            let text = document.as_str().unwrap_or_default().to_string();
            let metadata = metadatas.get(i).cloned().unwrap_or(Value::Null);
            let distance = distances.get(i).and_then(Value::as_f64).unwrap_or(1.0);
            ScoredChunk {
                metadata: from_chroma_metadata(&metadata, text),
                score: 1.0 - distance as f32,
            }
        })
        .collect()
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn upsert(&self, entries: Vec<IndexedVector>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let collection = self.get_collection().await?;
        let count = entries.len();

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let documents: Vec<&str> = entries.iter().map(|e| e.metadata.text.as_str()).collect();
        let metadatas = entries.iter().map(|e| to_chroma_metadata(&e.metadata)).collect();
        let embeddings = entries.iter().map(|e| e.embedding.clone()).collect();

        let entries = CollectionEntries {
            ids,
            metadatas: Some(metadatas),
            documents: Some(documents),
            embeddings: Some(embeddings),
        };
        collection
            .upsert(entries, None)
            .await
            .map_err(|err| store_error("upsert failed", err))?;
        debug!("Upserted {} vectors into {}", count, self.collection);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let collection = self.get_collection().await?;
        let query = QueryOptions {
            query_texts: None,
            query_embeddings: Some(vec![embedding.to_vec()]),
            n_results: Some(top_k),
            ..Default::default()
        };
        let result = collection
            .query(query, None)
            .await
            .map_err(|err| store_error("query failed", err))?;

        let encode = |value: serde_json::Result<Value>| value.unwrap_or(Value::Null);
        Ok(to_scored(
            encode(serde_json::to_value(&result.documents)),
            encode(serde_json::to_value(&result.metadatas)),
            encode(serde_json::to_value(&result.distances)),
        ))
    }

    async fn clear(&self) -> Result<()> {
        self.get_collection().await?;
        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(|err| store_error(&format!("cannot remove {}", self.collection), err))?;
        info!("Removed collection {}", self.collection);
        Ok(())
    }
}
