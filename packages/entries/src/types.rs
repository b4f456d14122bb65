// ABOUTME: Entry and type definitions
// ABOUTME: Status lifecycle of a content item as it moves through runs and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// pending → processing (claimed) → processed (in a report) → archived (report done)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Processing,
    Processed,
    Archived,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Processing => "processing",
            EntryStatus::Processed => "processed",
            EntryStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EntryStatus::Pending),
            "processing" => Ok(EntryStatus::Processing),
            "processed" => Ok(EntryStatus::Processed),
            "archived" => Ok(EntryStatus::Archived),
            _ => Err(format!("Invalid entry status: {}", s)),
        }
    }
}

/// Classification for entries. Named `EntryType` to stay clear of the keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryType {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub type_id: String,
    pub content: String,
    pub status: EntryStatus,
    pub run_id: Option<String>,
    pub why_it_matters: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Same content filed once per selected type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCreateInput {
    pub content: String,
    pub type_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdateInput {
    pub content: Option<String>,
    pub status: Option<EntryStatus>,
    pub type_id: Option<String>,
    pub why_it_matters: Option<String>,
}

impl EntryUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.status.is_none()
            && self.type_id.is_none()
            && self.why_it_matters.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub status: Option<EntryStatus>,
    pub type_ids: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            EntryStatus::Pending,
            EntryStatus::Processing,
            EntryStatus::Processed,
            EntryStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<EntryStatus>().unwrap(), status);
        }
        assert!("done".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EntryStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn test_empty_update() {
        assert!(EntryUpdateInput::default().is_empty());
        assert!(!EntryUpdateInput {
            status: Some(EntryStatus::Archived),
            ..Default::default()
        }
        .is_empty());
    }
}
