// ABOUTME: Entry and type storage layer using SQLite
// ABOUTME: Handles CRUD for types and entries plus the oldest-first pending queue

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

use super::types::{
    Entry, EntryCreateInput, EntryFilter, EntryStatus, EntryType, EntryUpdateInput,
};
use collector_core::{generate_id, InvalidationBus, Resource};
use collector_storage::{placeholders, StorageError, StorageResult};

/// Column list shared by every query that materializes an [`Entry`]
pub const ENTRY_COLUMNS: &str =
    "id, type_id, content, status, run_id, why_it_matters, created_at, modified_at";

/// Map a row selected with [`ENTRY_COLUMNS`] into an [`Entry`]
pub fn row_to_entry(row: &SqliteRow) -> StorageResult<Entry> {
    Ok(Entry {
        id: row.try_get("id")?,
        type_id: row.try_get("type_id")?,
        content: row.try_get("content")?,
        status: row.try_get("status")?,
        run_id: row.try_get("run_id")?,
        why_it_matters: row.try_get("why_it_matters")?,
        created_at: row.try_get("created_at")?,
        modified_at: row.try_get("modified_at")?,
    })
}

// ==================== Types ====================

pub struct TypeStorage {
    pool: SqlitePool,
    bus: InvalidationBus,
}

impl TypeStorage {
    pub fn new(pool: SqlitePool, bus: InvalidationBus) -> Self {
        Self { pool, bus }
    }

    /// List all types ordered by name
    pub async fn list_types(&self) -> StorageResult<Vec<EntryType>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM types ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_type).collect()
    }

    pub async fn get_type(&self, type_id: &str) -> StorageResult<EntryType> {
        let row = sqlx::query("SELECT id, name, created_at FROM types WHERE id = ?")
            .bind(type_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Type {}", type_id)))?;

        row_to_type(&row)
    }

    pub async fn create_type(&self, name: &str) -> StorageResult<EntryType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation("name is required".to_string()));
        }

        let entry_type = EntryType {
            id: generate_id("type"),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        debug!("Creating type: {} ({})", entry_type.name, entry_type.id);

        sqlx::query("INSERT INTO types (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&entry_type.id)
            .bind(&entry_type.name)
            .bind(entry_type.created_at)
            .execute(&self.pool)
            .await?;

        self.bus.invalidate(&[Resource::Types]);
        Ok(entry_type)
    }
}

fn row_to_type(row: &SqliteRow) -> StorageResult<EntryType> {
    Ok(EntryType {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

// ==================== Entries ====================

pub struct EntryStorage {
    pool: SqlitePool,
    bus: InvalidationBus,
}

impl EntryStorage {
    pub fn new(pool: SqlitePool, bus: InvalidationBus) -> Self {
        Self { pool, bus }
    }

    /// List entries, newest first, optionally narrowed by status and types
    pub async fn list_entries(&self, filter: EntryFilter) -> StorageResult<Vec<Entry>> {
        let mut query = format!("SELECT {} FROM entries WHERE 1 = 1", ENTRY_COLUMNS);

        if filter.status.is_some() {
            query.push_str(" AND status = ?");
        }
        if let Some(type_ids) = &filter.type_ids {
            if type_ids.is_empty() {
                return Ok(Vec::new());
            }
            query.push_str(&format!(" AND type_id IN ({})", placeholders(type_ids.len())));
        }
        query.push_str(" ORDER BY created_at DESC, rowid DESC");

        let mut q = sqlx::query(&query);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(type_ids) = &filter.type_ids {
            for type_id in type_ids {
                q = q.bind(type_id);
            }
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_entry).collect()
    }

    pub async fn get_entry(&self, entry_id: &str) -> StorageResult<Entry> {
        let row = sqlx::query(&format!("SELECT {} FROM entries WHERE id = ?", ENTRY_COLUMNS))
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Entry {}", entry_id)))?;

        row_to_entry(&row)
    }

    /// Create one pending entry per requested type, all or nothing
    pub async fn create_entries(&self, input: EntryCreateInput) -> StorageResult<Vec<Entry>> {
        if input.content.trim().is_empty() {
            return Err(StorageError::Validation("content is required".to_string()));
        }
        if input.type_ids.is_empty() {
            return Err(StorageError::Validation(
                "at least one type_id is required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(input.type_ids.len());

        for type_id in &input.type_ids {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM types WHERE id = ?")
                .bind(type_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(StorageError::Validation(format!("Unknown type: {}", type_id)));
            }

            let entry = Entry {
                id: generate_id("entry"),
                type_id: type_id.clone(),
                content: input.content.clone(),
                status: EntryStatus::Pending,
                run_id: None,
                why_it_matters: None,
                created_at: now,
                modified_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO entries (id, type_id, content, status, created_at, modified_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.type_id)
            .bind(&entry.content)
            .bind(entry.status)
            .bind(entry.created_at)
            .bind(entry.modified_at)
            .execute(&mut *tx)
            .await?;

            created.push(entry);
        }

        tx.commit().await?;

        info!("Created {} entries", created.len());
        self.bus.invalidate(&[Resource::Entries]);
        Ok(created)
    }

    /// Partially update an entry
    pub async fn update_entry(
        &self,
        entry_id: &str,
        input: EntryUpdateInput,
    ) -> StorageResult<Entry> {
        if input.is_empty() {
            return Err(StorageError::Validation("no fields to update".to_string()));
        }
        if let Some(content) = &input.content {
            if content.trim().is_empty() {
                return Err(StorageError::Validation("content cannot be empty".to_string()));
            }
        }

        debug!("Updating entry: {}", entry_id);

        let mut updates = vec!["modified_at = ?"];
        if input.content.is_some() {
            updates.push("content = ?");
        }
        if input.status.is_some() {
            updates.push("status = ?");
        }
        if input.type_id.is_some() {
            updates.push("type_id = ?");
        }
        if input.why_it_matters.is_some() {
            updates.push("why_it_matters = ?");
        }

        let query_str = format!("UPDATE entries SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str).bind(Utc::now());

        if let Some(content) = input.content {
            query = query.bind(content);
        }
        if let Some(status) = input.status {
            query = query.bind(status);
        }
        if let Some(type_id) = input.type_id {
            query = query.bind(type_id);
        }
        if let Some(why) = input.why_it_matters {
            query = query.bind(why);
        }

        let result = query.bind(entry_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Entry {}", entry_id)));
        }

        self.bus.invalidate(&[Resource::Entries]);
        self.get_entry(entry_id).await
    }

    pub async fn delete_entry(&self, entry_id: &str) -> StorageResult<()> {
        debug!("Deleting entry: {}", entry_id);

        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Entry {}", entry_id)));
        }

        self.bus.invalidate(&[Resource::Entries]);
        Ok(())
    }

    /// Set the status of many entries at once; returns how many rows changed
    pub async fn bulk_update_status(
        &self,
        entry_ids: &[String],
        status: EntryStatus,
    ) -> StorageResult<u64> {
        if entry_ids.is_empty() {
            return Err(StorageError::Validation("ids are required".to_string()));
        }

        let query_str = format!(
            "UPDATE entries SET status = ?, modified_at = ? WHERE id IN ({})",
            placeholders(entry_ids.len())
        );
        let mut query = sqlx::query(&query_str).bind(status).bind(Utc::now());
        for id in entry_ids {
            query = query.bind(id);
        }

        let updated = query.execute(&self.pool).await?.rows_affected();
        info!("Bulk updated {} entries to {}", updated, status);

        self.bus.invalidate(&[Resource::Entries]);
        Ok(updated)
    }

    /// Delete many entries at once; returns how many rows were removed
    pub async fn bulk_delete(&self, entry_ids: &[String]) -> StorageResult<u64> {
        if entry_ids.is_empty() {
            return Err(StorageError::Validation("ids are required".to_string()));
        }

        let query_str = format!(
            "DELETE FROM entries WHERE id IN ({})",
            placeholders(entry_ids.len())
        );
        let mut query = sqlx::query(&query_str);
        for id in entry_ids {
            query = query.bind(id);
        }

        let deleted = query.execute(&self.pool).await?.rows_affected();
        info!("Bulk deleted {} entries", deleted);

        self.bus.invalidate(&[Resource::Entries]);
        Ok(deleted)
    }

    /// Pending entries of one type, oldest first
    pub async fn list_pending(&self, type_id: &str, limit: i64) -> StorageResult<Vec<Entry>> {
        debug!("Listing pending entries for type {} (limit {})", type_id, limit);

        let rows = sqlx::query(&format!(
            "SELECT {} FROM entries WHERE type_id = ? AND status = ? \
             ORDER BY created_at ASC, rowid ASC LIMIT ?",
            ENTRY_COLUMNS
        ))
        .bind(type_id)
        .bind(EntryStatus::Pending)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}
