//! Ranked support-program recommendations and the 12-month application roadmap.
//!
//! Everything here is a pure function of a record snapshot and a reference
//! time. Fetching records is the job of a [`source::RecordSource`] owned by
//! the caller.

pub mod analyzer;
pub mod countdown;
pub mod error;
pub mod filter;
pub mod models;
pub mod period;
pub mod recency;
pub mod roadmap;
pub mod source;

pub use analyzer::{CompanyAnalysis, RankedRecommendation, RecommendationAnalyzer};
pub use countdown::{countdown, DeadlineStatus};
pub use error::{SourceError, SourceResult};
pub use filter::{RecordFilter, Selection};
pub use models::{Config, RecommendationRecord, ScoreTier};
pub use period::{parse_period, DateOrder, ParsedPeriod, Unparseable};
pub use recency::recent;
pub use roadmap::{build_roadmap, Roadmap, RoadmapBucket, RoadmapEntry};
pub use source::{FileRecordSource, RecordSource};
