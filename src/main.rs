use clap::Parser;
use dotenv::dotenv;
use handler::Cli;
use serde::{Deserialize, Serialize};

use crate::error::TutorError;
use crate::pinyin::MatchMode;

mod chat;
mod document;
mod embedding;
mod error;
mod handler;
mod indexing;
mod pinyin;
mod qa;
mod vector_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = read_config()?;
    let args = Cli::parse();
    handler::handler(args, config).await?;
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    // Source material
    pub vocabulary_path: String,
    pub lesson_ranges_path: String,
    pub pdf_path: String,
    pub records_path: String,
    pub match_mode: MatchMode,
    pub page_workers: usize,

    // Chunk
    pub chunk_size: usize,
    pub chunk_overlap: usize,

    // Vector store
    pub db_url: String,
    pub index_name: String,
    pub batch_limit: usize,
    pub top_k: usize,

    // Embedding
    pub embedding_dim: usize,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: String,

    // Chat
    pub chat_url: String,
    pub chat_model: String,
    pub chat_api_key: String,
    pub max_tokens: u32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,

    // Prompt
    pub system_prompt: String,
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a patient Chinese tutor. \
Answer the student's question using the textbook excerpts given as context. \
Write pinyin with tone marks. If the context does not cover the question, say so.";

impl Config {
    pub fn validate(&self) -> Result<(), TutorError> {
        let fail = |message: &str| Err(TutorError::Config(message.to_string()));
        if self.chunk_size == 0 {
            return fail("chunk_size must be positive");
        }
        if self.chunk_overlap >= self.chunk_size {
            return fail("chunk_overlap must be smaller than chunk_size");
        }
        if self.batch_limit == 0 {
            return fail("batch_limit must be positive");
        }
        if self.top_k == 0 {
            return fail("top_k must be positive");
        }
        if self.embedding_dim == 0 {
            return fail("embedding_dim must be positive");
        }
        if self.retry_max_attempts == 0 {
            return fail("retry_max_attempts must be positive");
        }
        Ok(())
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("vocabulary_path", "data/pinyin.txt")?
        .set_default("lesson_ranges_path", "data/lessons.json")?
        .set_default("pdf_path", "data/textbook.pdf")?
        .set_default("records_path", "data/textbook.json")?
        .set_default("match_mode", "edit_distance")?
        .set_default("page_workers", 4)?
        .set_default("chunk_size", 400)?
        .set_default("chunk_overlap", 20)?
        .set_default("db_url", "http://localhost:8000")?
        .set_default("index_name", "chinese-tutor")?
        .set_default("batch_limit", 100)?
        .set_default("top_k", 5)?
        .set_default("embedding_dim", 1024)?
        .set_default("embedding_url", "https://open.bigmodel.cn/api/paas/v4/embeddings")?
        .set_default("embedding_model", "embedding-3")?
        .set_default("embedding_api_key", "")?
        .set_default("chat_url", "https://api.deepseek.com/chat/completions")?
        .set_default("chat_model", "deepseek-chat")?
        .set_default("chat_api_key", "")?
        .set_default("max_tokens", 512)?
        .set_default("retry_max_attempts", 5)?
        .set_default("retry_base_delay_ms", 1000)?
        .set_default("retry_max_delay_ms", 30000)?
        .set_default("system_prompt", DEFAULT_SYSTEM_PROMPT)
}

fn read_config() -> Result<Config, TutorError> {
    let config = builder()
        .and_then(|builder| {
            builder
                .add_source(config::File::with_name("config").required(false))
                .add_source(config::Environment::with_prefix("TUTOR").try_parsing(true))
                .build()
        })
        .and_then(|config| config.try_deserialize::<Config>())
        .map_err(|err| TutorError::Config(err.to_string()))?;
    config.validate()?;
    Ok(config)
}
