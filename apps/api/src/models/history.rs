use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tailoring::FAILURE_SENTINEL;

pub const DEFAULT_TITLE: &str = "Tailored Resume";
pub const DEFAULT_COMPANY: &str = "Custom";

/// Result of one tailoring attempt. Always produced, success or failure.
///
/// `match_score` is 0 exactly when `tailored_resume` is the failure sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorOutcome {
    pub original_resume: String,
    pub job_description: String,
    pub tailored_resume: String,
    pub match_score: u8,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TailorOutcome {
    pub fn is_failure(&self) -> bool {
        self.tailored_resume == FAILURE_SENTINEL
    }
}

/// Caller-supplied labels attached to an outcome when it is archived.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryMeta {
    pub title: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A persisted tailoring attempt.
///
/// Only `is_favorite` and `is_downloaded` change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub tags: BTreeSet<String>,
    pub is_favorite: bool,
    pub is_downloaded: bool,
    #[serde(flatten)]
    pub outcome: TailorOutcome,
}

impl HistoryEntry {
    /// Builds a fresh entry: new time-ordered id, creation stamp set to now.
    pub fn new(mut outcome: TailorOutcome, meta: EntryMeta) -> Self {
        outcome.created_at = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: non_blank(meta.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            company: non_blank(meta.company).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            tags: meta
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            is_favorite: false,
            is_downloaded: false,
            outcome,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.outcome.created_at
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Row shape of the remote `tailored_resumes` table.
#[derive(Debug, Clone, FromRow)]
pub struct TailoredResumeRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub job_description: String,
    pub original_resume: String,
    pub tailored_resume: String,
    pub match_score: i16,
    pub tags: Vec<String>,
    pub suggestions: Vec<String>,
    pub is_favorite: bool,
    pub is_downloaded: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TailoredResumeRow> for HistoryEntry {
    fn from(row: TailoredResumeRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            company: row.company,
            tags: row.tags.into_iter().collect(),
            is_favorite: row.is_favorite,
            is_downloaded: row.is_downloaded,
            outcome: TailorOutcome {
                original_resume: row.original_resume,
                job_description: row.job_description,
                tailored_resume: row.tailored_resume,
                match_score: row.match_score.clamp(0, 100) as u8,
                suggestions: row.suggestions,
                created_at: row.created_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> TailorOutcome {
        TailorOutcome {
            original_resume: "resume".to_string(),
            job_description: "jd".to_string(),
            tailored_resume: "tailored".to_string(),
            match_score: 88,
            suggestions: vec!["Add metrics".to_string()],
            created_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    #[test]
    fn test_new_entry_applies_defaults() {
        let entry = HistoryEntry::new(outcome(), EntryMeta::default());
        assert_eq!(entry.title, DEFAULT_TITLE);
        assert_eq!(entry.company, DEFAULT_COMPANY);
        assert!(entry.tags.is_empty());
        assert!(!entry.is_favorite);
        assert!(!entry.is_downloaded);
        assert!(entry.created_at() > DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_new_entry_normalizes_meta() {
        let meta = EntryMeta {
            title: Some("  Staff Engineer ".to_string()),
            company: Some("   ".to_string()),
            tags: vec![
                "rust".to_string(),
                " rust ".to_string(),
                "".to_string(),
                "aws".to_string(),
            ],
        };
        let entry = HistoryEntry::new(outcome(), meta);
        assert_eq!(entry.title, "Staff Engineer");
        assert_eq!(entry.company, DEFAULT_COMPANY);
        assert_eq!(
            entry.tags.into_iter().collect::<Vec<_>>(),
            vec!["aws".to_string(), "rust".to_string()]
        );
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let a = HistoryEntry::new(outcome(), EntryMeta::default());
        let b = HistoryEntry::new(outcome(), EntryMeta::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let entry = HistoryEntry::new(outcome(), EntryMeta::default());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["match_score"], 88);
        assert_eq!(value["title"], DEFAULT_TITLE);
        let back: HistoryEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_row_score_is_clamped() {
        let row = TailoredResumeRow {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            company: "c".to_string(),
            job_description: "jd".to_string(),
            original_resume: "r".to_string(),
            tailored_resume: "x".to_string(),
            match_score: 140,
            tags: vec!["b".to_string(), "a".to_string()],
            suggestions: vec![],
            is_favorite: true,
            is_downloaded: false,
            created_at: Utc::now(),
        };
        let entry = HistoryEntry::from(row);
        assert_eq!(entry.outcome.match_score, 100);
        assert!(entry.is_favorite);
        assert_eq!(entry.tags.iter().next().map(String::as_str), Some("a"));
    }
}
