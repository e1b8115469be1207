use crate::countdown::{record_countdown, DeadlineStatus};
use crate::filter::RecordFilter;
use crate::models::{Config, RecommendationRecord, ScoreTier};
use crate::period::{parse_period, DateOrder};
use crate::recency::recent;
use crate::roadmap::{build_roadmap, Roadmap};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A record as shown in a list view, with its deadline worked out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub record: RecommendationRecord,
    pub score_percent: i64,
    pub tier: ScoreTier,
    pub countdown: Option<i64>,
    pub deadline: Option<DeadlineStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub total_records: usize,
    /// Records with no usable application period.
    pub unparseable_count: usize,
    pub ranked: Vec<RankedRecommendation>,
    pub recent: Vec<RankedRecommendation>,
    pub roadmap: Roadmap,
}

/// Derives every view for one company from a single snapshot and a single "now".
#[derive(Debug, Clone)]
pub struct RecommendationAnalyzer {
    pub filter: RecordFilter,
    pub window_days: i64,
    pub date_order: DateOrder,
    /// Offset whose wall clock decides which calendar date "today" is.
    pub reference_offset: FixedOffset,
}

impl RecommendationAnalyzer {
    pub fn new(filter: RecordFilter, window_days: i64, date_order: DateOrder) -> Self {
        Self {
            filter,
            window_days,
            date_order,
            reference_offset: Utc.fix(),
        }
    }

    pub fn with_reference_offset(mut self, offset: FixedOffset) -> Self {
        self.reference_offset = offset;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let filter = RecordFilter::new(config.min_score)
            .with_region(&config.region)
            .with_agency(&config.agency);
        let analyzer = Self::new(filter, config.window_days, config.date_order);
        match config
            .reference_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
        {
            Some(offset) => analyzer.with_reference_offset(offset),
            None => {
                warn!(
                    hours = config.reference_utc_offset_hours,
                    "reference_utc_offset_hours out of range, using UTC"
                );
                analyzer
            }
        }
    }

    /// Main analysis function. `now` is read once by the caller and every
    /// date comparison below uses it, so all views agree on what today is.
    ///
    /// "Today" is the calendar date of `now` on the `reference_offset` wall
    /// clock, not the UTC date. Recency still compares instants.
    pub fn analyze(&self, records: &[RecommendationRecord], now: DateTime<Utc>) -> CompanyAnalysis {
        let today = now.with_timezone(&self.reference_offset).date_naive();

        // Step 1: Score/region/agency view
        let ranked = self.annotate(self.filter.apply(records), today);

        // Step 2: New announcements, newest data only
        let recent = self.annotate(recent(records, now, self.window_days), today);

        // Step 3: Month-by-month roadmap
        let roadmap = build_roadmap(records, today, self.date_order);

        let unparseable_count = records
            .iter()
            .filter(|record| parse_period(record.period_raw.as_deref(), self.date_order).is_err())
            .count();

        info!(
            records = records.len(),
            ranked = ranked.len(),
            recent = recent.len(),
            roadmap = roadmap.total_count,
            unparseable = unparseable_count,
            "analysis complete"
        );

        CompanyAnalysis {
            generated_at: now,
            today,
            total_records: records.len(),
            unparseable_count,
            ranked,
            recent,
            roadmap,
        }
    }

    fn annotate(&self, records: Vec<RecommendationRecord>, today: NaiveDate) -> Vec<RankedRecommendation> {
        records
            .into_iter()
            .map(|record| {
                let countdown = record_countdown(&record, today, self.date_order);
                RankedRecommendation {
                    score_percent: record.score_percent(),
                    tier: record.score_tier(),
                    deadline: countdown.map(DeadlineStatus::from_countdown),
                    countdown,
                    record,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 10, 23, 59, 0).unwrap()
    }

    fn record(title: &str, score: f64, period: Option<&str>, age_days: Option<i64>) -> RecommendationRecord {
        let mut record = RecommendationRecord::new("acme", score);
        record.title = Some(title.to_string());
        record.period_raw = period.map(str::to_string);
        record.created_at = age_days.map(|days| now() - Duration::days(days));
        record
    }

    #[test]
    fn test_analysis_views_share_one_today() {
        let records = vec![
            record("closing", 0.9, Some("2025-08-01~2025-08-10"), Some(2)),
            record("open", 0.7, Some("2025-09-01~2025-09-30"), Some(45)),
            record("varies", 0.6, Some("varies per sub-program"), None),
            record("weak", 0.1, Some("20250820"), Some(1)),
        ];
        let analyzer = RecommendationAnalyzer::new(RecordFilter::new(0.3), 30, DateOrder::MonthFirst);
        let analysis = analyzer.analyze(&records, now());

        assert_eq!(analysis.today, NaiveDate::from_ymd_opt(2025, 8, 10).unwrap());
        assert_eq!(analysis.total_records, 4);
        assert_eq!(analysis.unparseable_count, 1);

        // Late in the day still counts as the same calendar date
        assert_eq!(analysis.ranked[0].record.title.as_deref(), Some("closing"));
        assert_eq!(analysis.ranked[0].countdown, Some(0));
        assert_eq!(analysis.ranked[0].deadline, Some(DeadlineStatus::ClosesToday));
        assert_eq!(analysis.ranked[1].countdown, Some(51));
        assert_eq!(analysis.ranked[2].countdown, None);
        assert_eq!(analysis.ranked.len(), 3);

        let recent_titles: Vec<_> = analysis
            .recent
            .iter()
            .filter_map(|r| r.record.title.as_deref())
            .collect();
        assert_eq!(recent_titles, vec!["closing", "weak"]);

        // Roadmap ignores the score threshold
        assert_eq!(analysis.roadmap.total_count, 3);
        assert_eq!(analysis.roadmap.reference_date, analysis.today);
    }

    #[test]
    fn test_today_follows_reference_offset() {
        // 02:00 KST on the 11th is still the 10th in UTC
        let early_kst = Utc.with_ymd_and_hms(2025, 8, 10, 17, 0, 0).unwrap();
        let records = vec![record("closing", 0.9, Some("2025-08-01~2025-08-11"), None)];

        let utc = RecommendationAnalyzer::new(RecordFilter::new(0.0), 30, DateOrder::MonthFirst);
        let analysis = utc.analyze(&records, early_kst);
        assert_eq!(analysis.today, NaiveDate::from_ymd_opt(2025, 8, 10).unwrap());
        assert_eq!(analysis.ranked[0].countdown, Some(1));

        let kst = utc.with_reference_offset(FixedOffset::east_opt(9 * 3600).unwrap());
        let analysis = kst.analyze(&records, early_kst);
        assert_eq!(analysis.today, NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
        assert_eq!(analysis.ranked[0].countdown, Some(0));
        assert_eq!(analysis.roadmap.reference_date, analysis.today);
    }

    #[test]
    fn test_from_config_uses_reference_offset() {
        let analyzer = RecommendationAnalyzer::from_config(&Config::default());
        assert_eq!(analyzer.reference_offset, FixedOffset::east_opt(9 * 3600).unwrap());

        let config = Config {
            reference_utc_offset_hours: 100,
            ..Config::default()
        };
        let analyzer = RecommendationAnalyzer::from_config(&config);
        assert_eq!(analyzer.reference_offset, Utc.fix());
    }

    #[test]
    fn test_from_config_reads_filters() {
        let config = Config {
            min_score: 0.5,
            region: "Seoul".to_string(),
            ..Config::default()
        };
        let analyzer = RecommendationAnalyzer::from_config(&config);
        assert_eq!(analyzer.filter.region, crate::filter::Selection::Only("Seoul".to_string()));
        assert_eq!(analyzer.filter.agency, crate::filter::Selection::All);
        assert_eq!(analyzer.window_days, 30);
    }
}
