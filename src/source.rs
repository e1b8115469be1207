use crate::error::{SourceError, SourceResult};
use crate::models::RecommendationRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source column name -> canonical field name.
///
/// Applied once, when rows are read. Canonical names are accepted as-is and
/// any other column is ignored.
pub const COLUMN_MAPPING: &[(&str, &str)] = &[
    ("회사명", "company_name"),
    ("기업명", "company_name"),
    ("공고명", "title"),
    ("공고_기관", "agency"),
    ("공고_지역", "region"),
    ("공고_지원분야", "support_field"),
    ("공고_신청기간", "period_raw"),
    ("공고_내용", "content"),
    ("추천_이유", "reason"),
    ("공고_URL", "url"),
    ("추천_점수", "score"),
    ("생성_시간", "created_at"),
];

const CANONICAL_COLUMNS: &[&str] = &[
    "company_name",
    "title",
    "agency",
    "region",
    "support_field",
    "period_raw",
    "content",
    "reason",
    "url",
    "score",
    "created_at",
];

/// Map a source column name onto its canonical field name.
pub fn canonical_column(name: &str) -> Option<&'static str> {
    let name = name.trim_start_matches('\u{feff}').trim();
    COLUMN_MAPPING
        .iter()
        .find(|(source, _)| *source == name)
        .map(|(_, canonical)| *canonical)
        .or_else(|| CANONICAL_COLUMNS.iter().find(|c| **c == name).copied())
}

/// Supplies recommendation records keyed by company name.
pub trait RecordSource {
    /// Every company with at least one recommendation, in first-seen order.
    fn companies(&self) -> SourceResult<Vec<String>>;

    /// All recommendations for one company, exact name match.
    fn recommendations(&self, company_name: &str) -> SourceResult<Vec<RecommendationRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> SourceResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(FileFormat::Json),
            Some("csv") => Ok(FileFormat::Csv),
            _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Reads an exported recommendation table from a local JSON or CSV file.
///
/// The file is re-read on every call so each lookup sees a fresh snapshot.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
    format: FileFormat,
}

impl FileRecordSource {
    pub fn open(path: impl Into<PathBuf>) -> SourceResult<Self> {
        let path = path.into();
        let format = FileFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> SourceResult<Vec<RecommendationRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let rows = match self.format {
            FileFormat::Json => parse_json_rows(&content)?,
            FileFormat::Csv => parse_csv_rows(&content)?,
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| record_from_row(&row, i + 1))
            .collect::<SourceResult<Vec<_>>>()?;

        info!(path = %self.path.display(), rows = records.len(), "loaded recommendation table");
        Ok(records)
    }
}

impl RecordSource for FileRecordSource {
    fn companies(&self) -> SourceResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .load_all()?
            .into_iter()
            .map(|record| record.company_name)
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }

    fn recommendations(&self, company_name: &str) -> SourceResult<Vec<RecommendationRecord>> {
        let records: Vec<RecommendationRecord> = self
            .load_all()?
            .into_iter()
            .filter(|record| record.company_name == company_name)
            .collect();
        debug!(company = company_name, count = records.len(), "selected company recommendations");
        Ok(records)
    }
}

/// Rows keyed by canonical field name.
type Row = Map<String, Value>;

fn canonicalize(row: Map<String, Value>) -> Row {
    row.into_iter()
        .filter_map(|(key, value)| canonical_column(&key).map(|c| (c.to_string(), value)))
        .collect()
}

fn parse_json_rows(content: &str) -> SourceResult<Vec<Row>> {
    let root: Value = serde_json::from_str(content)?;
    let items = match root {
        Value::Array(items) => items,
        other => {
            return Err(SourceError::MalformedCollection(format!(
                "expected a JSON array of rows, found {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(canonicalize(row)),
            other => Err(SourceError::row(
                i + 1,
                format!("expected an object, found {}", json_kind(&other)),
            )),
        })
        .collect()
}

fn parse_csv_rows(content: &str) -> SourceResult<Vec<Row>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<Option<&'static str>> =
        reader.headers()?.iter().map(canonical_column).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter_map(|(header, cell)| {
                let header = (*header)?;
                // An empty CSV cell is how the export writes a null
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                Some((header.to_string(), value))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn record_from_row(row: &Row, index: usize) -> SourceResult<RecommendationRecord> {
    let company_name = text_field(row, "company_name")
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| SourceError::row(index, "company_name is missing"))?;

    Ok(RecommendationRecord {
        company_name,
        title: text_field(row, "title"),
        agency: text_field(row, "agency"),
        region: text_field(row, "region"),
        support_field: text_field(row, "support_field"),
        content: text_field(row, "content"),
        reason: text_field(row, "reason"),
        url: text_field(row, "url"),
        period_raw: text_field(row, "period_raw"),
        score: score_field(row, index)?,
        created_at: timestamp_field(row, index),
    })
}

/// Optional text. Numbers and booleans are kept as their JSON spelling, so a
/// period exported as the integer `20250815` still reads as a compact date.
fn text_field(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn score_field(row: &Row, index: usize) -> SourceResult<f64> {
    match row.get("score") {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| SourceError::row(index, format!("score {n} is not representable"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SourceError::row(index, format!("score {s:?} is not a number"))),
        Some(other) => Err(SourceError::row(
            index,
            format!("score must be a number, found {}", json_kind(other)),
        )),
        None => Err(SourceError::row(index, "score is missing")),
    }
}

/// Unreadable timestamps are dropped rather than failing the row; the record
/// just won't appear among new announcements.
fn timestamp_field(row: &Row, index: usize) -> Option<DateTime<Utc>> {
    let raw = text_field(row, "created_at")?;
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        warn!(row = index, value = %raw, "ignoring unreadable created_at");
    }
    parsed
}

/// Parse a creation timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
