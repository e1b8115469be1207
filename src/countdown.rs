//! D-day arithmetic over calendar dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::RecommendationRecord;
use crate::period::{parse_period, DateOrder};

/// Whole days from `reference` to `end_date`. Negative once the deadline has passed.
pub fn countdown(end_date: NaiveDate, reference: NaiveDate) -> i64 {
    (end_date - reference).num_days()
}

/// Where a deadline stands relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeadlineStatus {
    Open { days_left: i64 },
    ClosesToday,
    Overdue { days_over: i64 },
}

impl DeadlineStatus {
    pub fn from_countdown(days: i64) -> Self {
        match days {
            0 => DeadlineStatus::ClosesToday,
            d if d > 0 => DeadlineStatus::Open { days_left: d },
            d => DeadlineStatus::Overdue { days_over: -d },
        }
    }
}

/// Countdown to the end of a record's application period, if it has one.
pub fn record_countdown(
    record: &RecommendationRecord,
    today: NaiveDate,
    order: DateOrder,
) -> Option<i64> {
    let period = parse_period(record.period_raw.as_deref(), order).ok()?;
    period.end_date.map(|end| countdown(end, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()
    }

    #[test]
    fn test_countdown_is_signed_day_difference() {
        assert_eq!(countdown(today(), today()), 0);
        assert_eq!(countdown(today() + Duration::days(5), today()), 5);
        assert_eq!(countdown(today() - Duration::days(3), today()), -3);
    }

    #[test]
    fn test_countdown_crosses_year_boundary() {
        let end = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let reference = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        assert_eq!(countdown(end, reference), 3);
    }

    #[test]
    fn test_deadline_status() {
        assert_eq!(DeadlineStatus::from_countdown(0), DeadlineStatus::ClosesToday);
        assert_eq!(DeadlineStatus::from_countdown(7), DeadlineStatus::Open { days_left: 7 });
        assert_eq!(DeadlineStatus::from_countdown(-2), DeadlineStatus::Overdue { days_over: 2 });
    }

    #[test]
    fn test_record_countdown_uses_range_end() {
        let mut record = RecommendationRecord::new("acme", 0.5);
        record.period_raw = Some("2025-08-01~2025-08-31".to_string());
        assert_eq!(record_countdown(&record, today(), DateOrder::MonthFirst), Some(21));
    }

    #[test]
    fn test_record_countdown_absent_without_end_date() {
        let mut record = RecommendationRecord::new("acme", 0.5);
        record.period_raw = Some("2025-08-01 ~ TBD".to_string());
        assert_eq!(record_countdown(&record, today(), DateOrder::MonthFirst), None);

        record.period_raw = Some("varies per sub-program".to_string());
        assert_eq!(record_countdown(&record, today(), DateOrder::MonthFirst), None);
    }
}
