use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Result, TutorError};

/// One `{LESSON, START, END}` entry; pages are 0-based and inclusive.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LessonRange {
    #[serde(rename = "LESSON", deserialize_with = "lesson_id")]
    pub lesson: String,
    #[serde(rename = "START")]
    pub start: usize,
    #[serde(rename = "END")]
    pub end: usize,
}

fn lesson_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(i64),
        Text(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}

#[derive(Debug, Clone, Default)]
pub struct LessonTable {
    ranges: Vec<LessonRange>,
}

impl LessonTable {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            TutorError::Config(format!(
                "cannot read lesson ranges {}: {}",
                path.display(),
                err
            ))
        })?;
        let ranges: Vec<LessonRange> = serde_json::from_str(&content).map_err(|err| {
            TutorError::Config(format!(
                "invalid lesson ranges {}: {}",
                path.display(),
                err
            ))
        })?;
        Self::new(ranges)
    }

    pub fn new(ranges: Vec<LessonRange>) -> Result<Self> {
        if let Some(bad) = ranges.iter().find(|r| r.start > r.end) {
            return Err(TutorError::Config(format!(
                "lesson {} starts at page {} after it ends at {}",
                bad.lesson, bad.start, bad.end
            )));
        }
        Ok(Self { ranges })
    }

    /// First range in file order containing `page`.
    pub fn lesson_for(&self, page: usize) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| (r.start..=r.end).contains(&page))
            .map(|r| r.lesson.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn range(lesson: &str, start: usize, end: usize) -> LessonRange {
        LessonRange { lesson: lesson.to_string(), start, end }
    }

    #[test]
    fn test_lesson_for() -> anyhow::Result<()> {
        let table = LessonTable::new(vec![range("1", 10, 19), range("2", 20, 29)])?;
        assert_eq!(table.lesson_for(10), Some("1"));
        assert_eq!(table.lesson_for(19), Some("1"));
        assert_eq!(table.lesson_for(20), Some("2"));
        assert_eq!(table.lesson_for(29), Some("2"));
        Ok(())
    }

    #[test]
    fn page_outside_every_range_has_no_lesson() -> anyhow::Result<()> {
        let table = LessonTable::new(vec![range("1", 10, 19)])?;
        assert_eq!(table.lesson_for(0), None);
        assert_eq!(table.lesson_for(30), None);
        assert_eq!(LessonTable::default().lesson_for(5), None);
        Ok(())
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = LessonTable::new(vec![range("1", 5, 4)]).unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
    }

    #[test]
    fn test_load() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"[{{"LESSON": 1, "START": 3, "END": 8}}, {{"LESSON": "Review", "START": 9, "END": 9}}]"#
        )?;
        let table = LessonTable::load(file.path())?;
        assert_eq!(table.lesson_for(3), Some("1"));
        assert_eq!(table.lesson_for(9), Some("Review"));
        Ok(())
    }

    #[test]
    fn malformed_file_is_config_error() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"LESSON": 1}}"#)?;
        assert!(matches!(
            LessonTable::load(file.path()),
            Err(TutorError::Config(_))
        ));
        Ok(())
    }
}
