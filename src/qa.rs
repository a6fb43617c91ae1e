use std::sync::Arc;

use log::debug;

use crate::chat::CompletionModel;
use crate::embedding::Embedder;
use crate::error::{Result, TutorError};
use crate::vector_store::{ScoredChunk, VectorStore};

/// Answers questions from the indexed textbook.
///
/// `embedder` must be the one the index was built with.
pub struct RetrievalQa {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn CompletionModel>,
    system_prompt: String,
}

impl RetrievalQa {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn CompletionModel>,
        system_prompt: String,
    ) -> Self {
        Self {
            embedder,
            store,
            model,
            system_prompt,
        }
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let embedding = self
            .embedder
            .embed_batch(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TutorError::Embedding("no embedding returned for query".to_string()))?;
        self.store.query(&embedding, top_k).await
    }

    /// Raw model output; nothing checks whether the context was relevant.
    pub async fn answer(&self, query: &str, top_k: usize) -> Result<String> {
        let hits = self.retrieve(query, top_k).await?;
        debug!(
            "Retrieved (page, score) {:?} for {:?}",
            hits.iter().map(|hit| (hit.metadata.page, hit.score)).collect::<Vec<_>>(),
            query
        );
        let user_text = compose(query, &hits);
        self.model.complete(&self.system_prompt, &user_text).await
    }
}

fn compose(query: &str, hits: &[ScoredChunk]) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("Context:\n{context}\n\nQuestion: {query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedModel;
    use crate::embedding::testing::CharEmbedder;
    use crate::vector_store::memory::MemoryStore;
    use crate::vector_store::{ChunkMetadata, IndexedVector};

    async fn store_with(embedder: &CharEmbedder, texts: &[&str]) -> anyhow::Result<MemoryStore> {
        let store = MemoryStore::new();
        let entries = texts
            .iter()
            .enumerate()
            .map(|(i, text)| IndexedVector {
                id: format!("id-{i}"),
                embedding: embedder.embed(text),
                metadata: ChunkMetadata {
                    chunk: 0,
                    page: i,
                    lesson: None,
                    text: text.to_string(),
                },
            })
            .collect();
        store.upsert(entries).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn context_is_ordered_by_similarity() -> anyhow::Result<()> {
        let embedder = Arc::new(CharEmbedder::new(64));
        let store = store_with(&embedder, &["zzzz", "abcd", "abzz"]).await?;
        let model = Arc::new(ScriptedModel::answering("Nouns take measure words."));
        let qa = RetrievalQa::new(
            embedder.clone(),
            Arc::new(store),
            model.clone(),
            "You are a Chinese tutor.".to_string(),
        );

        let answer = qa.answer("abcd", 2).await?;
        assert_eq!(answer, "Nouns take measure words.");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "You are a Chinese tutor.");
        assert_eq!(calls[0].1, "Context:\nabcd\n\n---\n\nabzz\n\nQuestion: abcd");
        assert_eq!(embedder.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_store_still_asks_the_model() -> anyhow::Result<()> {
        let model = Arc::new(ScriptedModel::default());
        let qa = RetrievalQa::new(
            Arc::new(CharEmbedder::new(8)),
            Arc::new(MemoryStore::new()),
            model.clone(),
            String::new(),
        );
        let answer = qa.answer("nǐ hǎo?", 3).await?;
        assert_eq!(answer, "Context:\n\n\nQuestion: nǐ hǎo?");
        Ok(())
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let qa = RetrievalQa::new(
            Arc::new(CharEmbedder::failing(8)),
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedModel::default()),
            String::new(),
        );
        assert!(matches!(qa.answer("q", 1).await, Err(TutorError::Embedding(_))));
    }
}
