use std::path::Path;

use crate::error::{Result, TutorError};

/// Raw text of every page, in page order.
pub fn extract_pages(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(TutorError::Extraction {
            path: path.to_path_buf(),
            message: "file not found".to_string(),
        });
    }
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|err| TutorError::Extraction {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(pages.iter().map(|page| strip_control(page)).collect())
}

/// Whitespace controls other than `\n` become spaces so neighbouring words
/// stay apart; the rest are dropped.
fn strip_control(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some(c),
            c if c.is_control() && c.is_whitespace() => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}
