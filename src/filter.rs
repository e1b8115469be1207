//! Score, region and agency filtering for the recommendations view.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::RecommendationRecord;

/// Selector value that disables a region or agency filter.
pub const ALL_SENTINEL: &str = "all";

/// The source's own spelling of [`ALL_SENTINEL`].
const ALL_SENTINEL_NATIVE: &str = "전체";

/// An exact-match restriction on one text field, or none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value == ALL_SENTINEL || value == ALL_SENTINEL_NATIVE {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    /// Case-sensitive, no normalization. An absent field never matches `Only`.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub min_score: f64,
    pub region: Selection,
    pub agency: Selection,
}

impl RecordFilter {
    pub fn new(min_score: f64) -> Self {
        Self {
            min_score,
            region: Selection::All,
            agency: Selection::All,
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Selection::parse(region);
        self
    }

    pub fn with_agency(mut self, agency: &str) -> Self {
        self.agency = Selection::parse(agency);
        self
    }

    pub fn accepts(&self, record: &RecommendationRecord) -> bool {
        record.score >= self.min_score
            && self.region.matches(record.region.as_deref())
            && self.agency.matches(record.agency.as_deref())
    }

    /// Keep accepted records, best score first. Ties keep input order.
    pub fn apply(&self, records: &[RecommendationRecord]) -> Vec<RecommendationRecord> {
        let mut kept: Vec<RecommendationRecord> = records
            .iter()
            .filter(|record| self.accepts(record))
            .cloned()
            .collect();
        sort_by_score_desc(&mut kept, |record| record.score);
        kept
    }
}

/// Stable descending sort on a float key; incomparable scores count as equal.
pub(crate) fn sort_by_score_desc<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
}

/// Sorted unique agencies, for building a selector list.
pub fn distinct_agencies(records: &[RecommendationRecord]) -> Vec<String> {
    distinct(records.iter().map(|record| record.agency.as_deref()))
}

/// Sorted unique regions, for building a selector list.
pub fn distinct_regions(records: &[RecommendationRecord]) -> Vec<String> {
    distinct(records.iter().map(|record| record.region.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
