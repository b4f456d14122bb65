// ABOUTME: Research queue type definitions
// ABOUTME: Note kinds, queued items, and the intake validation rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_NOTES_CHARS: usize = 5;
pub const MAX_NOTES_CHARS: usize = 2000;

/// Every new queue item starts here; downstream workers move it on
pub const PENDING_STATUS: &str = "PENDING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResearchType {
    University,
    Person,
    Paper,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchItem {
    pub id: String,
    pub notes: String,
    pub urls: Vec<String>,
    #[serde(rename = "type")]
    pub research_type: ResearchType,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchInput {
    pub notes: String,
    #[serde(rename = "type")]
    pub research_type: ResearchType,
}

impl ResearchInput {
    pub fn validate(&self) -> Result<(), String> {
        let len = self.notes.chars().count();
        if len < MIN_NOTES_CHARS {
            return Err(format!(
                "Notes must be at least {} characters",
                MIN_NOTES_CHARS
            ));
        }
        if len > MAX_NOTES_CHARS {
            return Err(format!(
                "Notes too long (max {} characters)",
                MAX_NOTES_CHARS
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSubmission {
    pub id: String,
    pub urls_found: usize,
}
