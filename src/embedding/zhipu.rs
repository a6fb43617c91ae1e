use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::{Result, TutorError};
use crate::Config;

#[derive(Debug, Clone)]
pub struct ZhipuOptions {
    api_key: String,
    url: String,
    model: String,
    dimensions: usize,
}

impl ZhipuOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.embedding_api_key.clone(),
            url: config.embedding_url.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
        }
    }
}

#[derive(Debug, Serialize)]
struct ZhipuRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ZhipuResponse {
    data: Vec<Embed>,
}

#[derive(Debug, Deserialize)]
struct Embed {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
///
/// Failures are reported straight away; this client never retries.
pub struct EmbeddingClient {
    client: Client,
    options: ZhipuOptions,
}

impl EmbeddingClient {
    pub fn new(options: ZhipuOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| {
                TutorError::Config(format!("cannot build embedding HTTP client: {err}"))
            })?;
        Ok(Self { client, options })
    }
}

fn into_vectors(mut data: Vec<Embed>, expected: usize, dimensions: usize) -> Result<Vec<Vec<f32>>> {
    data.sort_by_key(|embed| embed.index);
    if data.len() != expected {
        return Err(TutorError::Embedding(format!(
            "got {} embeddings for {} inputs",
            data.len(),
            expected
        )));
    }
    if let Some(bad) = data.iter().find(|embed| embed.embedding.len() != dimensions) {
        return Err(TutorError::Embedding(format!(
            "embedding has {} dimensions, index expects {}",
            bad.embedding.len(),
            dimensions
        )));
    }
    Ok(data.into_iter().map(|embed| embed.embedding).collect())
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = ZhipuRequest {
            input: texts,
            model: &self.options.model,
        };

        let response = self
            .client
            .post(&self.options.url)
            .header("Authorization", format!("Bearer {}", self.options.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| TutorError::Embedding(format!("cannot reach embedding API: {err}")))?;

        if !response.status().is_success() {
            return Err(TutorError::Embedding(format!(
                "embedding request failed: {}",
                response.status()
            )));
        }

        let body = response
            .json::<ZhipuResponse>()
            .await
            .map_err(|err| TutorError::Embedding(format!("cannot parse embedding response: {err}")))?;

        into_vectors(body.data, texts.len(), self.options.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.options.dimensions
    }
}
