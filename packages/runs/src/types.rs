// ABOUTME: Run type definitions
// ABOUTME: A named batch of entries of one type, handed to the workflow webhook together

use chrono::{DateTime, Utc};
use collector_entries::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Created => "created",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// created → running → completed | failed
    pub fn is_forward_transition(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Created, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        ) || *self == next
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub name: String,
    pub type_id: String,
    /// Joined from the run's type for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub limit_count: i64,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunWithEntries {
    #[serde(flatten)]
    pub run: Run,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreateInput {
    pub name: String,
    pub type_id: String,
    pub limit_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunUpdateInput {
    pub name: Option<String>,
    pub status: Option<RunStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunUpdateInput {
    pub fn status(status: RunStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.started_at.is_none()
            && self.completed_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResult {
    pub entries: Vec<Entry>,
    pub claimed_count: usize,
}

impl From<Vec<Entry>> for ClaimResult {
    fn from(entries: Vec<Entry>) -> Self {
        Self {
            claimed_count: entries.len(),
            entries,
        }
    }
}
