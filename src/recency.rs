//! "New announcements": records created within a trailing window.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::models::RecommendationRecord;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Records created at or after `reference - window_days`, in input order.
///
/// The comparison is between instants, not calendar dates. Records without a
/// creation time are left out. A window too large to represent has no cutoff.
pub fn recent(
    records: &[RecommendationRecord],
    reference: DateTime<Utc>,
    window_days: i64,
) -> Vec<RecommendationRecord> {
    let cutoff = Duration::try_days(window_days).and_then(|window| reference.checked_sub_signed(window));
    if cutoff.is_none() {
        warn!(window_days, "recency window out of range, keeping every dated record");
    }
    records
        .iter()
        .filter(|record| {
            record
                .created_at
                .is_some_and(|created| cutoff.map_or(true, |cutoff| created >= cutoff))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 24, 3, 46, 48).unwrap()
    }

    fn created(title: &str, at: Option<DateTime<Utc>>) -> RecommendationRecord {
        let mut record = RecommendationRecord::new("acme", 0.5);
        record.title = Some(title.to_string());
        record.created_at = at;
        record
    }

    #[test]
    fn test_window_boundaries() {
        let records = vec![
            created("old", Some(reference() - Duration::days(31))),
            created("fresh", Some(reference() - Duration::days(29))),
            created("edge", Some(reference() - Duration::days(30))),
            created("just-outside", Some(reference() - Duration::days(30) - Duration::seconds(1))),
        ];
        let kept = recent(&records, reference(), DEFAULT_WINDOW_DAYS);
        let titles: Vec<_> = kept.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["fresh", "edge"]);
    }

    #[test]
    fn test_missing_created_at_is_excluded() {
        let records = vec![created("unknown", None)];
        assert!(recent(&records, reference(), DEFAULT_WINDOW_DAYS).is_empty());
    }

    #[test]
    fn test_oversized_window_keeps_all_dated_records() {
        let records = vec![
            created("ancient", Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap())),
            created("undated", None),
        ];
        let kept = recent(&records, reference(), 1_000_000_000);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title.as_deref(), Some("ancient"));
        assert_eq!(recent(&records, reference(), i64::MAX).len(), 1);
    }

    #[test]
    fn test_custom_window() {
        let records = vec![created("week-old", Some(reference() - Duration::days(7)))];
        assert!(recent(&records, reference(), 3).is_empty());
        assert_eq!(recent(&records, reference(), 7).len(), 1);
    }
}
