use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use uuid::Uuid;

use crate::document::chunk::TextSplitter;
use crate::document::TextRecord;
use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use crate::vector_store::{ChunkMetadata, IndexedVector, VectorStore};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub records: usize,
    pub chunks: usize,
    pub batches: usize,
}

/// Chunks, embeds and upserts every record.
///
/// Entries are flushed as soon as `batch_limit` of them are pending, plus
/// one final partial flush, so N chunks always take `ceil(N / batch_limit)`
/// upserts. Each entry gets a fresh UUID: indexing the same records twice
/// stores them twice unless the store is cleared first. The first embedding
/// or store failure aborts the run and leaves earlier batches in place.
pub async fn index(
    records: &[TextRecord],
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    batch_limit: usize,
) -> Result<IndexReport> {
    if batch_limit == 0 {
        return Err(TutorError::Config("batch_limit must be positive".to_string()));
    }
    let mut report = IndexReport::default();
    let mut batch: Vec<ChunkMetadata> = Vec::with_capacity(batch_limit);
    let pb = progress_bar(records.len());

    for record in records {
        report.records += 1;
        pb.set_message(format!("page {}", record.page));
        for (chunk, text) in splitter.split(&record.text).into_iter().enumerate() {
            batch.push(ChunkMetadata {
                chunk,
                page: record.page,
                lesson: record.lesson.clone(),
                text,
            });
            if batch.len() == batch_limit {
                report.chunks += flush(&mut batch, embedder, store).await?;
                report.batches += 1;
            }
        }
        pb.inc(1);
    }
    if !batch.is_empty() {
        report.chunks += flush(&mut batch, embedder, store).await?;
        report.batches += 1;
    }
    pb.finish_with_message(format!("{} chunks", report.chunks));

    info!(
        "Indexed {} chunks from {} records in {} batches",
        report.chunks, report.records, report.batches
    );
    Ok(report)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(err) => warn!("Progress bar template rejected: {}", err),
    }
    pb
}

async fn flush(
    batch: &mut Vec<ChunkMetadata>,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<usize> {
    let texts: Vec<&str> = batch.iter().map(|m| m.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != batch.len() {
        return Err(TutorError::Embedding(format!(
            "got {} embeddings for {} chunks",
            embeddings.len(),
            batch.len()
        )));
    }
    if let Some(bad) = embeddings.iter().find(|e| e.len() != embedder.dimensions()) {
        return Err(TutorError::Embedding(format!(
            "embedding has {} dimensions, expected {}",
            bad.len(),
            embedder.dimensions()
        )));
    }

    let entries: Vec<IndexedVector> = batch
        .drain(..)
        .zip(embeddings)
        .map(|(metadata, embedding)| IndexedVector {
            id: Uuid::new_v4().to_string(),
            embedding,
            metadata,
        })
        .collect();
    let count = entries.len();
    store.upsert(entries).await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::document::chunk::char_length;
    use crate::embedding::testing::CharEmbedder;
    use crate::vector_store::memory::MemoryStore;

    fn record(page: usize, lesson: Option<&str>, text: &str) -> TextRecord {
        TextRecord {
            page,
            lesson: lesson.map(str::to_string),
            text: text.to_string(),
        }
    }

    fn word_records(pages: usize, words_per_page: usize) -> Vec<TextRecord> {
        (0..pages)
            .map(|page| {
                let words: Vec<String> = (0..words_per_page).map(|w| format!("w{page}x{w}")).collect();
                record(page, Some("1"), &words.join(" "))
            })
            .collect()
    }

    #[tokio::test]
    async fn batches_flush_at_limit_and_at_end() -> anyhow::Result<()> {
        // One word per chunk: 7 pages x 3 words = 21 chunks.
        let splitter = TextSplitter::new(6, 0, char_length());
        let records = word_records(7, 3);
        for batch_limit in [1, 2, 5, 7, 21, 100] {
            let embedder = CharEmbedder::new(8);
            let store = MemoryStore::new();
            let report = index(&records, &splitter, &embedder, &store, batch_limit).await?;

            let expected_batches = (21 + batch_limit - 1) / batch_limit;
            assert_eq!(report.chunks, 21);
            assert_eq!(report.batches, expected_batches);
            assert_eq!(store.upsert_calls(), expected_batches);
            assert_eq!(embedder.calls(), expected_batches);

            let entries = store.entries().await;
            assert_eq!(entries.len(), 21);
            let ids: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids.len(), 21);
        }
        Ok(())
    }

    #[tokio::test]
    async fn metadata_follows_record_and_chunk_order() -> anyhow::Result<()> {
        let splitter = TextSplitter::new(3, 0, char_length());
        let records = vec![
            record(4, Some("2"), "a\n\nb\n\nc"),
            record(5, None, ""),
            record(6, None, "d"),
        ];
        let embedder = CharEmbedder::new(4);
        let store = MemoryStore::new();
        let report = index(&records, &splitter, &embedder, &store, 2).await?;
        assert_eq!(report, IndexReport { records: 3, chunks: 4, batches: 2 });

        let stored: Vec<(usize, usize, Option<String>, String)> = store
            .entries()
            .await
            .into_iter()
            .map(|e| (e.metadata.page, e.metadata.chunk, e.metadata.lesson, e.metadata.text))
            .collect();
        assert_eq!(
            stored,
            vec![
                (4, 0, Some("2".to_string()), "a".to_string()),
                (4, 1, Some("2".to_string()), "b".to_string()),
                (4, 2, Some("2".to_string()), "c".to_string()),
                (6, 0, None, "d".to_string()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn reindexing_duplicates_entries() -> anyhow::Result<()> {
        let splitter = TextSplitter::new(400, 20, char_length());
        let records = vec![record(0, None, "nǐ hǎo")];
        let embedder = CharEmbedder::new(4);
        let store = MemoryStore::new();
        index(&records, &splitter, &embedder, &store, 10).await?;
        index(&records, &splitter, &embedder, &store, 10).await?;
        assert_eq!(store.entries().await.len(), 2);

        store.clear().await?;
        index(&records, &splitter, &embedder, &store, 10).await?;
        assert_eq!(store.entries().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn embedding_failure_aborts_run() {
        let splitter = TextSplitter::new(6, 0, char_length());
        let embedder = CharEmbedder::failing(4);
        let store = MemoryStore::new();
        let result = index(&word_records(2, 3), &splitter, &embedder, &store, 2).await;
        assert!(matches!(result, Err(TutorError::Embedding(_))));
        assert_eq!(embedder.calls(), 1);
        assert_eq!(store.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_aborts_run() {
        let splitter = TextSplitter::new(6, 0, char_length());
        let embedder = CharEmbedder::new(4);
        let store = MemoryStore::failing();
        let result = index(&word_records(2, 3), &splitter, &embedder, &store, 2).await;
        assert!(matches!(result, Err(TutorError::Store(_))));
        assert_eq!(store.upsert_calls(), 1);
    }

    #[test]
    fn progress_counts_pages() {
        let pb = progress_bar(7);
        assert_eq!(pb.length(), Some(7));
        assert_eq!(pb.position(), 0);
    }

    #[tokio::test]
    async fn zero_batch_limit_is_rejected() {
        let splitter = TextSplitter::new(6, 0, char_length());
        let result = index(&[], &splitter, &CharEmbedder::new(4), &MemoryStore::new(), 0).await;
        assert!(matches!(result, Err(TutorError::Config(_))));
    }
}
