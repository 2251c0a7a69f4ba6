use std::collections::HashSet;

use uuid::Uuid;

use crate::models::history::HistoryEntry;

/// Reconciles the local slot with the remote source.
///
/// Union keyed by id; when both hold an id the local copy wins, since flag
/// toggles land there first. The result is ordered by creation time, newest
/// first; entries with equal timestamps keep local-then-remote order.
pub fn merge_sources(local: Vec<HistoryEntry>, remote: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let local_ids: HashSet<Uuid> = local.iter().map(|e| e.id).collect();
    let mut merged = local;
    merged.extend(remote.into_iter().filter(|e| !local_ids.contains(&e.id)));
    merged.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    merged
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::history::{EntryMeta, TailorOutcome};

    fn entry(minutes: i64, title: &str) -> HistoryEntry {
        let mut entry = HistoryEntry::new(
            TailorOutcome {
                original_resume: "r".to_string(),
                job_description: "j".to_string(),
                tailored_resume: "t".to_string(),
                match_score: 90,
                suggestions: vec![],
                created_at: Utc::now(),
            },
            EntryMeta {
                title: Some(title.to_string()),
                ..Default::default()
            },
        );
        entry.outcome.created_at =
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        entry
    }

    #[test]
    fn test_local_copy_wins_on_duplicate_id() {
        let local = entry(10, "local");
        let mut remote = local.clone();
        remote.title = "remote".to_string();
        remote.is_favorite = true;

        let merged = merge_sources(vec![local], vec![remote]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "local");
        assert!(!merged[0].is_favorite);
    }

    #[test]
    fn test_remote_only_entries_are_interleaved_by_time() {
        let local = vec![entry(30, "l30"), entry(10, "l10")];
        let remote = vec![entry(20, "r20"), entry(40, "r40")];

        let titles: Vec<String> = merge_sources(local, remote)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["r40", "l30", "r20", "l10"]);
    }

    #[test]
    fn test_empty_remote_keeps_local_order() {
        let local = vec![entry(2, "b"), entry(1, "a")];
        let merged = merge_sources(local.clone(), vec![]);
        assert_eq!(merged, local);
    }
}
