pub mod chunk;
pub mod lesson;
pub mod normalize;
pub mod pdf;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chat::{CompletionModel, REFINE_PROMPT};
use crate::error::{Result, TutorError};
use crate::pinyin::{MatchMode, Vocabulary};
use lesson::LessonTable;
use normalize::normalize;

/// One textbook page after correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct TextRecord {
    pub page: usize,
    pub lesson: Option<String>,
    pub text: String,
}

/// Normalizes every page in parallel and returns the records in page
/// order. With a `refiner`, each normalized page is additionally repaired
/// by the language model, at most `workers` requests at a time.
pub async fn build_records(
    pages: Vec<String>,
    vocabulary: Arc<Vocabulary>,
    lessons: Arc<LessonTable>,
    mode: MatchMode,
    refiner: Option<Arc<dyn CompletionModel>>,
    workers: usize,
) -> Result<Vec<TextRecord>> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (page, raw) in pages.into_iter().enumerate() {
        let vocabulary = Arc::clone(&vocabulary);
        let lessons = Arc::clone(&lessons);
        let refiner = refiner.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let text = tokio::task::spawn_blocking(move || normalize(&raw, &vocabulary, mode))
                .await
                .map_err(|err| TutorError::Extraction {
                    path: format!("page {page}").into(),
                    message: err.to_string(),
                })?;
            let text = match refiner {
                Some(model) if !text.is_empty() => {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|err| TutorError::Completion(err.to_string()))?;
                    refine(model.as_ref(), page, text).await?
                }
                _ => text,
            };
            Ok::<_, TutorError>(TextRecord {
                page,
                lesson: lessons.lesson_for(page).map(str::to_string),
                text,
            })
        });
    }

    let mut records = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let record = joined.map_err(|err| TutorError::Completion(err.to_string()))??;
        debug!("Page {} done ({} chars)", record.page, record.text.len());
        records.push(record);
    }
    records.sort_by_key(|record| record.page);
    info!("Built {} page records", records.len());
    Ok(records)
}

async fn refine(model: &dyn CompletionModel, page: usize, text: String) -> Result<String> {
    let refined = model.complete(REFINE_PROMPT, &text).await?;
    let refined = refined.trim();
    if refined.is_empty() {
        warn!("Model returned nothing for page {}, keeping normalized text", page);
        return Ok(text);
    }
    Ok(refined.to_string())
}

pub fn save_records(path: &Path, records: &[TextRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<TextRecord>> {
    let content = fs::read_to_string(path).map_err(|err| TutorError::Extraction {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|err| TutorError::Extraction {
        path: path.to_path_buf(),
        message: format!("invalid records file: {err}"),
    })
}
