use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::ALL_SENTINEL;
use crate::period::DateOrder;
use crate::recency::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_file: String,
    pub company_name: Option<String>,
    // Filter defaults for the recommendations view
    pub min_score: f64,
    pub region: String,
    pub agency: String,
    // New announcements window
    pub window_days: i64,
    pub date_order: DateOrder,
    /// Wall clock used to decide today's date for D-day. The source data is KST.
    #[serde(default = "default_reference_utc_offset_hours")]
    pub reference_utc_offset_hours: i32,
    pub output_directory: Option<String>,
}

fn default_reference_utc_offset_hours() -> i32 {
    9
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: "data-source/recommendations.json".to_string(),
            company_name: None,
            min_score: 0.30,
            region: ALL_SENTINEL.to_string(),
            agency: ALL_SENTINEL.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            date_order: DateOrder::MonthFirst,
            reference_utc_offset_hours: default_reference_utc_offset_hours(),
            output_directory: Some("output".to_string()),
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }
}

/// One recommendation of one announcement for one company.
///
/// Field names are canonical; source-specific column names are mapped
/// before a record is built (see [`crate::source::COLUMN_MAPPING`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub company_name: String,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub region: Option<String>,
    pub support_field: Option<String>,
    pub content: Option<String>,
    pub reason: Option<String>,
    pub url: Option<String>,
    pub period_raw: Option<String>,
    pub score: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Coarse band of a recommendation score on the 0-100 display scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::High => "high",
            ScoreTier::Medium => "medium",
            ScoreTier::Low => "low",
        }
    }
}

impl RecommendationRecord {
    /// Minimal record for a company; every optional field absent.
    pub fn new(company_name: impl Into<String>, score: f64) -> Self {
        Self {
            company_name: company_name.into(),
            title: None,
            agency: None,
            region: None,
            support_field: None,
            content: None,
            reason: None,
            url: None,
            period_raw: None,
            score,
            created_at: None,
        }
    }

    /// Score on the 0-100 scale, truncated toward zero.
    pub fn score_percent(&self) -> i64 {
        (self.score * 100.0) as i64
    }

    pub fn score_tier(&self) -> ScoreTier {
        match self.score_percent() {
            p if p >= 80 => ScoreTier::High,
            p if p >= 60 => ScoreTier::Medium,
            _ => ScoreTier::Low,
        }
    }
}
