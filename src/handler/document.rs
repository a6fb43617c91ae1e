use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::info;

use crate::chat::CompletionModel;
use crate::document::chunk::{TextSplitter, TokenCounter};
use crate::document::lesson::LessonTable;
use crate::document::{build_records, load_records, pdf, save_records};
use crate::embedding::zhipu::{EmbeddingClient, ZhipuOptions};
use crate::indexing;
use crate::pinyin::Vocabulary;
use crate::vector_store::chroma::ChromaStore;
use crate::vector_store::VectorStore;
use crate::Config;

pub async fn extract_textbook(config: &Config, pdf: &Path, out: &Path, refine: bool) -> anyhow::Result<()> {
    let vocabulary = Arc::new(Vocabulary::load(Path::new(&config.vocabulary_path))?);
    let lessons = Arc::new(LessonTable::load(Path::new(&config.lesson_ranges_path))?);

    println!("Extracting {}", pdf.display());
    let pages = pdf::extract_pages(pdf)?;
    info!("Extracted {} pages from {}", pages.len(), pdf.display());

    let refiner: Option<Arc<dyn CompletionModel>> = if refine {
        Some(super::chat_client(config)? as Arc<dyn CompletionModel>)
    } else {
        None
    };
    let records = build_records(
        pages,
        vocabulary,
        lessons,
        config.match_mode,
        refiner,
        config.page_workers,
    )
    .await?;

    save_records(out, &records).with_context(|| format!("Cannot write {}", out.display()))?;
    println!("Wrote {} pages to {}", records.len(), out.display());
    Ok(())
}

pub async fn index_textbook(config: &Config, records: &Path, reset: bool) -> anyhow::Result<()> {
    let records = load_records(records)?;
    let store = ChromaStore::from_config(config).await?;
    if reset {
        store.clear().await?;
        println!("Cleared collection {}", config.index_name);
    }

    let embedder = EmbeddingClient::new(ZhipuOptions::from_config(config))?;
    let counter = Arc::new(TokenCounter::new());
    let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap, counter.length_fn());

    let report = indexing::index(&records, &splitter, &embedder, &store, config.batch_limit).await?;
    println!(
        "Indexed {} chunks from {} pages into {}",
        report.chunks, report.records, config.index_name
    );
    Ok(())
}
