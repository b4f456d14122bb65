// ABOUTME: Research queue storage using SQLite
// ABOUTME: Validated intake of notes and the newest-first feed

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use super::types::{ResearchInput, ResearchItem, ResearchSubmission, PENDING_STATUS};
use collector_core::{extract_urls, generate_id, InvalidationBus, Resource};
use collector_storage::{StorageError, StorageResult};

pub struct ResearchStorage {
    pool: SqlitePool,
    bus: InvalidationBus,
}

impl ResearchStorage {
    pub fn new(pool: SqlitePool, bus: InvalidationBus) -> Self {
        Self { pool, bus }
    }

    /// Queue a note as `PENDING` along with the URLs found in it
    pub async fn submit(&self, input: ResearchInput) -> StorageResult<ResearchSubmission> {
        input.validate().map_err(StorageError::Validation)?;

        let urls = extract_urls(&input.notes);
        let id = generate_id("research");

        sqlx::query(
            r#"
            INSERT INTO research_queue (id, notes, urls, type, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.notes)
        .bind(serde_json::to_string(&urls)?)
        .bind(input.research_type)
        .bind(PENDING_STATUS)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(research_id = %id, urls_found = urls.len(), "Research item queued");
        self.bus.invalidate(&[Resource::Research]);

        Ok(ResearchSubmission {
            id,
            urls_found: urls.len(),
        })
    }

    /// All queued items, newest first
    pub async fn list_feed(&self) -> StorageResult<Vec<ResearchItem>> {
        let rows = sqlx::query(
            "SELECT id, notes, urls, type, status, created_at FROM research_queue \
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }
}

fn row_to_item(row: &SqliteRow) -> StorageResult<ResearchItem> {
    let urls: String = row.try_get("urls")?;

    Ok(ResearchItem {
        id: row.try_get("id")?,
        notes: row.try_get("notes")?,
        urls: serde_json::from_str(&urls)?,
        research_type: row.try_get("type")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}
