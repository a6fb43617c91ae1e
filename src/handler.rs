use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::chat::deepseek::ChatClient;
use crate::chat::RetryPolicy;
use crate::Config;

mod document;
mod query;

#[derive(Parser)]
#[command(name = "chinese-tutor")]
#[command(about = "Question answering over a scanned Chinese textbook", version = "0.1")]
pub enum Cli {
    /// Extract and correct textbook pages into the records file
    Extract {
        #[arg(long, help = "Textbook PDF (defaults to pdf_path)")]
        pdf: Option<PathBuf>,

        #[arg(long, help = "Output records file (defaults to records_path)")]
        out: Option<PathBuf>,

        #[arg(long, help = "Let the language model repair each page")]
        refine: bool,
    },

    /// Chunk, embed and store the records
    Index {
        #[arg(long, help = "Records file (defaults to records_path)")]
        records: Option<PathBuf>,

        #[arg(long, help = "Clear the collection before indexing")]
        reset: bool,
    },

    /// Start a question session
    Chat {
        #[arg(long, help = "Chunks retrieved per question")]
        top_k: Option<usize>,
    },

    /// Answer a single question
    Ask {
        question: String,

        #[arg(long, help = "Chunks retrieved per question")]
        top_k: Option<usize>,
    },
}

pub async fn handler(args: Cli, config: Config) -> anyhow::Result<()> {
    match args {
        Cli::Extract { pdf, out, refine } => {
            let pdf = pdf.unwrap_or_else(|| PathBuf::from(&config.pdf_path));
            let out = out.unwrap_or_else(|| PathBuf::from(&config.records_path));
            document::extract_textbook(&config, &pdf, &out, refine).await
        }
        Cli::Index { records, reset } => {
            let records = records.unwrap_or_else(|| PathBuf::from(&config.records_path));
            document::index_textbook(&config, &records, reset).await
        }
        Cli::Chat { top_k } => {
            let top_k = top_k.unwrap_or(config.top_k);
            query::handle_query_session(&config, top_k).await
        }
        Cli::Ask { question, top_k } => {
            let top_k = top_k.unwrap_or(config.top_k);
            query::answer_once(&config, &question, top_k).await
        }
    }
}

fn chat_client(config: &Config) -> crate::error::Result<Arc<ChatClient>> {
    let retry = RetryPolicy::new(
        config.retry_max_attempts,
        Duration::from_millis(config.retry_base_delay_ms),
        Duration::from_millis(config.retry_max_delay_ms),
    );
    Ok(Arc::new(ChatClient::from_config(config, retry)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["chinese-tutor", "index", "--reset"]).expect("valid args");
        assert!(matches!(cli, Cli::Index { records: None, reset: true }));

        let cli = Cli::try_parse_from(["chinese-tutor", "ask", "What is 了?", "--top-k", "3"])
            .expect("valid args");
        match cli {
            Cli::Ask { question, top_k } => {
                assert_eq!(question, "What is 了?");
                assert_eq!(top_k, Some(3));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn clients_build_from_default_config() -> anyhow::Result<()> {
        use crate::embedding::zhipu::{EmbeddingClient, ZhipuOptions};
        use crate::embedding::Embedder;

        let config: Config = crate::builder()?.build()?.try_deserialize()?;
        chat_client(&config)?;
        let embedder = EmbeddingClient::new(ZhipuOptions::from_config(&config))?;
        assert_eq!(embedder.dimensions(), config.embedding_dim);
        Ok(())
    }
}
