// ABOUTME: Report type definitions
// ABOUTME: Reports summarise a set of entries and cite their sources

use chrono::{DateTime, Utc};
use collector_entries::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Citation number ("1", "2", ...) to URL
pub type Sources = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Processed,
    Done,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Processed => "processed",
            ReportStatus::Done => "done",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(ReportStatus::Processed),
            "done" => Ok(ReportStatus::Done),
            other => Err(format!("Invalid report status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub summary: String,
    pub markdown_content: String,
    pub entry_ids: Vec<String>,
    pub run_id: Option<String>,
    pub sources: Option<Sources>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWithEntries {
    #[serde(flatten)]
    pub report: Report,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportCreateInput {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub markdown_content: String,
    #[serde(default)]
    pub entry_ids: Vec<String>,
    pub run_id: Option<String>,
    pub sources: Option<Sources>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_missing_fields_default_to_empty() {
        let input: ReportCreateInput =
            serde_json::from_str(r#"{"summary":"s","markdown_content":"m"}"#).unwrap();
        assert_eq!(input.summary, "s");
        assert!(input.entry_ids.is_empty());
        assert!(input.run_id.is_none());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("done".parse::<ReportStatus>(), Ok(ReportStatus::Done));
        assert_eq!(
            "processed".parse::<ReportStatus>(),
            Ok(ReportStatus::Processed)
        );
        assert!("archived".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_create_input_sources_optional() {
        let input: ReportCreateInput = serde_json::from_str(
            r#"{"summary":"s","markdown_content":"m","entry_ids":["entry-1"]}"#,
        )
        .unwrap();
        assert!(input.sources.is_none());
        assert!(input.run_id.is_none());
    }
}
