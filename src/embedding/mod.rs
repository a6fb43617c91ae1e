use async_trait::async_trait;

use crate::error::Result;

pub mod zhipu;

/// Turns text into fixed-length vectors. Index time and query time must
/// share one embedder, otherwise similarity scores are meaningless.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize;
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::TutorError;

    /// Deterministic bag-of-characters embedder.
    pub struct CharEmbedder {
        pub dimensions: usize,
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl CharEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self { dimensions, calls: AtomicUsize::new(0), fail: false }
        }

        pub fn failing(dimensions: usize) -> Self {
            Self { fail: true, ..Self::new(dimensions) }
        }

        pub fn embed(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; self.dimensions];
            for ch in text.chars() {
                vector[ch as usize % self.dimensions] += 1.0;
            }
            vector
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for CharEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TutorError::Embedding("embedding service unavailable".into()));
            }
            Ok(texts.iter().map(|text| self.embed(text)).collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}
