//! 12-month roadmap of application openings.
//!
//! The roadmap is a recurring calendar template: records are grouped by the
//! month their application period starts in, whatever the year. An August
//! 2024 call and an August 2026 call both land in the August bucket. Making
//! this year-aware would turn it into a timeline, which is a different view.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::sort_by_score_desc;
use crate::models::RecommendationRecord;
use crate::period::{parse_record_period, DateOrder};

pub const MONTHS_PER_YEAR: usize = 12;
pub const TOP_ENTRIES_PER_MONTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapEntry {
    pub record: RecommendationRecord,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapBucket {
    /// 1 = January.
    pub month: u32,
    /// Every record starting in this month, before truncation.
    pub count: usize,
    pub top_entries: Vec<RoadmapEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub reference_date: NaiveDate,
    pub buckets: [RoadmapBucket; MONTHS_PER_YEAR],
    pub total_count: usize,
    pub active_month_count: usize,
    pub peak_month: Option<u32>,
}

impl Roadmap {
    pub fn bucket(&self, month: u32) -> Option<&RoadmapBucket> {
        self.buckets.iter().find(|bucket| bucket.month == month)
    }

    /// Per-month counts, January first.
    pub fn monthly_counts(&self) -> [usize; MONTHS_PER_YEAR] {
        std::array::from_fn(|i| self.buckets[i].count)
    }
}

/// Bucket index for a date under the recurring calendar template.
pub fn template_month(date: NaiveDate) -> u32 {
    date.month()
}

/// Build the roadmap for one company's records.
///
/// Records without a readable start date are skipped and do not count.
pub fn build_roadmap(
    records: &[RecommendationRecord],
    reference_date: NaiveDate,
    order: DateOrder,
) -> Roadmap {
    // Step 1: Place every record with a start date into its month
    let mut grouped: [Vec<RoadmapEntry>; MONTHS_PER_YEAR] = std::array::from_fn(|_| Vec::new());
    for record in records {
        let Ok(period) = parse_record_period(record, order) else {
            continue;
        };
        let month = template_month(period.start_date);
        grouped[(month - 1) as usize].push(RoadmapEntry {
            record: record.clone(),
            start_date: period.start_date,
            end_date: period.end_date,
        });
    }

    // Step 2: Rank within each month and keep the top entries
    let buckets: [RoadmapBucket; MONTHS_PER_YEAR] = std::array::from_fn(|i| {
        let mut entries = std::mem::take(&mut grouped[i]);
        let count = entries.len();
        sort_by_score_desc(&mut entries, |entry| entry.record.score);
        entries.truncate(TOP_ENTRIES_PER_MONTH);
        RoadmapBucket {
            month: i as u32 + 1,
            count,
            top_entries: entries,
        }
    });

    // Step 3: Summaries
    let total_count: usize = buckets.iter().map(|bucket| bucket.count).sum();
    let active_month_count = buckets.iter().filter(|bucket| bucket.count > 0).count();
    // Earliest month wins ties, so only replace on a strictly larger count
    let peak_month = buckets
        .iter()
        .filter(|bucket| bucket.count > 0)
        .fold(None::<&RoadmapBucket>, |best, bucket| match best {
            Some(best) if best.count >= bucket.count => Some(best),
            _ => Some(bucket),
        })
        .map(|bucket| bucket.month);

    debug!(total_count, active_month_count, ?peak_month, "roadmap built");

    Roadmap {
        reference_date,
        buckets,
        total_count,
        active_month_count,
        peak_month,
    }
}
