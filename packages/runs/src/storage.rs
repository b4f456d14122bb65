// ABOUTME: Run storage layer using SQLite
// ABOUTME: Run CRUD plus the transactional claim, attach, release, and delete cascades

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Executor, Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use super::types::{ClaimResult, Run, RunCreateInput, RunStatus, RunUpdateInput, RunWithEntries};
use collector_core::{
    generate_id, InvalidationBus, Resource, DEFAULT_LIMIT_COUNT, MAX_LIMIT_COUNT, MIN_LIMIT_COUNT,
};
use collector_entries::{row_to_entry, Entry, EntryStatus, ENTRY_COLUMNS};
use collector_storage::{placeholders, StorageError, StorageResult};

const RUN_SELECT: &str = r#"
    SELECT r.id, r.name, r.type_id, t.name AS type_name, r.limit_count, r.status,
           r.created_at, r.started_at, r.completed_at
    FROM runs r
    LEFT JOIN types t ON t.id = r.type_id
"#;

pub struct RunStorage {
    pool: SqlitePool,
    bus: InvalidationBus,
}

impl RunStorage {
    pub fn new(pool: SqlitePool, bus: InvalidationBus) -> Self {
        Self { pool, bus }
    }

    // ==================== Runs ====================

    /// List all runs, newest first
    pub async fn list_runs(&self) -> StorageResult<Vec<Run>> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY r.created_at DESC, r.rowid DESC",
            RUN_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_run).collect()
    }

    pub async fn get_run(&self, run_id: &str) -> StorageResult<Run> {
        let row = sqlx::query(&format!("{} WHERE r.id = ?", RUN_SELECT))
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Run {}", run_id)))?;

        row_to_run(&row)
    }

    /// The run plus the entries currently assigned to it, oldest first
    pub async fn get_run_with_entries(&self, run_id: &str) -> StorageResult<RunWithEntries> {
        let run = self.get_run(run_id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM entries WHERE run_id = ? ORDER BY created_at ASC, rowid ASC",
            ENTRY_COLUMNS
        ))
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;
        let entries = rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()?;

        debug!("Run {} has {} entries", run_id, entries.len());
        Ok(RunWithEntries { run, entries })
    }

    /// Create a run in the `created` state
    pub async fn create_run(&self, input: RunCreateInput) -> StorageResult<Run> {
        let name = input.name.trim();
        if name.is_empty() || input.type_id.trim().is_empty() {
            return Err(StorageError::Validation(
                "name and type_id are required".to_string(),
            ));
        }

        let limit_count = input.limit_count.unwrap_or(DEFAULT_LIMIT_COUNT);
        if !(MIN_LIMIT_COUNT..=MAX_LIMIT_COUNT).contains(&limit_count) {
            return Err(StorageError::Validation(format!(
                "limit_count must be between {} and {}",
                MIN_LIMIT_COUNT, MAX_LIMIT_COUNT
            )));
        }

        let type_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM types WHERE id = ?")
            .bind(&input.type_id)
            .fetch_one(&self.pool)
            .await?;
        if type_exists == 0 {
            return Err(StorageError::Validation(format!(
                "Unknown type: {}",
                input.type_id
            )));
        }

        let run_id = generate_id("run");
        info!(
            run_id = %run_id,
            type_id = %input.type_id,
            limit_count,
            "Creating run"
        );

        sqlx::query(
            r#"
            INSERT INTO runs (id, name, type_id, limit_count, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run_id)
        .bind(name)
        .bind(&input.type_id)
        .bind(limit_count)
        .bind(RunStatus::Created)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.bus.invalidate(&[Resource::Runs]);
        self.get_run(&run_id).await
    }

    /// Partially update a run.
    ///
    /// Moving to `running` stamps `started_at` and moving to `completed` or
    /// `failed` stamps `completed_at`, unless the caller supplied them.
    pub async fn update_run(&self, run_id: &str, input: RunUpdateInput) -> StorageResult<Run> {
        if input.is_empty() {
            return Err(StorageError::Validation("no fields to update".to_string()));
        }
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(StorageError::Validation("name cannot be empty".to_string()));
            }
        }

        let current = self.get_run(run_id).await?;
        let now = Utc::now();

        let mut started_at = input.started_at;
        let mut completed_at = input.completed_at;
        if let Some(status) = input.status {
            if !current.status.is_forward_transition(status) {
                warn!(
                    run_id = %run_id,
                    from = %current.status,
                    to = %status,
                    "Run moved outside created -> running -> completed|failed"
                );
            }
            if status == RunStatus::Running && started_at.is_none() {
                started_at = Some(now);
            }
            if status.is_terminal() && completed_at.is_none() {
                completed_at = Some(now);
            }
        }

        let mut updates = Vec::new();
        if input.name.is_some() {
            updates.push("name = ?");
        }
        if input.status.is_some() {
            updates.push("status = ?");
        }
        if started_at.is_some() {
            updates.push("started_at = ?");
        }
        if completed_at.is_some() {
            updates.push("completed_at = ?");
        }

        let query_str = format!("UPDATE runs SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str);

        if let Some(name) = input.name {
            query = query.bind(name.trim().to_string());
        }
        if let Some(status) = input.status {
            query = query.bind(status);
        }
        if let Some(started) = started_at {
            query = query.bind(started);
        }
        if let Some(completed) = completed_at {
            query = query.bind(completed);
        }

        query.bind(run_id).execute(&self.pool).await?;

        info!(run_id = %run_id, status = ?input.status, "Run updated");
        self.bus.invalidate(&[Resource::Runs]);
        self.get_run(run_id).await
    }

    /// Put a run back to `created` after a failed trigger, clearing both timestamps
    pub async fn revert_to_created(&self, run_id: &str) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE runs SET status = ?, started_at = NULL, completed_at = NULL WHERE id = ?",
        )
        .bind(RunStatus::Created)
        .bind(run_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Run {}", run_id)));
        }

        info!(run_id = %run_id, "Run reverted to created");
        self.bus.invalidate(&[Resource::Runs]);
        Ok(())
    }

    /// Delete a run.
    ///
    /// Entries still `processing` in the run go back to `pending`; every
    /// entry of the run is unlinked, keeping processed/archived statuses.
    pub async fn delete_run(&self, run_id: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        let released = delete_run_in(&mut tx, run_id).await?;
        tx.commit().await?;

        info!(run_id = %run_id, released, "Run deleted");
        self.bus
            .invalidate(&[Resource::Runs, Resource::Entries, Resource::Reports]);
        Ok(())
    }

    // ==================== Entry membership ====================

    /// Claim up to `limit` pending, unassigned entries of `type_id`, oldest first.
    ///
    /// Selection and assignment happen in a single conditional `UPDATE`, so
    /// concurrent claims always receive disjoint entries.
    pub async fn claim_entries(
        &self,
        run_id: &str,
        type_id: &str,
        limit: i64,
    ) -> StorageResult<ClaimResult> {
        if type_id.trim().is_empty() || limit < 1 {
            return Err(StorageError::Validation(
                "type_id and limit are required".to_string(),
            ));
        }

        let rows = sqlx::query(&format!(
            r#"
            UPDATE entries SET status = ?, run_id = ?, modified_at = ?
            WHERE id IN (
                SELECT id FROM entries
                WHERE type_id = ? AND status = ? AND run_id IS NULL
                ORDER BY created_at ASC, rowid ASC
                LIMIT ?
            )
            AND status = ? AND run_id IS NULL
            AND EXISTS (SELECT 1 FROM runs WHERE id = ?)
            RETURNING rowid AS claim_seq, {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(EntryStatus::Processing)
        .bind(run_id)
        .bind(Utc::now())
        .bind(type_id)
        .bind(EntryStatus::Pending)
        .bind(limit)
        .bind(EntryStatus::Pending)
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            ensure_run_exists(&self.pool, run_id).await?;
            info!(run_id = %run_id, type_id = %type_id, "No pending entries found");
            return Ok(ClaimResult::from(Vec::new()));
        }

        let claimed = oldest_first(&rows)?;
        info!(
            run_id = %run_id,
            claimed_count = claimed.len(),
            "Entries claimed"
        );
        self.bus.invalidate(&[Resource::Entries, Resource::Runs]);
        Ok(ClaimResult::from(claimed))
    }

    /// Claim a hand-picked set of entries for a run.
    ///
    /// Every id must still be pending, unassigned and of the run's type,
    /// otherwise nothing is attached and `Conflict` is returned.
    pub async fn attach_entries(
        &self,
        run_id: &str,
        entry_ids: &[String],
    ) -> StorageResult<ClaimResult> {
        let mut ids: Vec<String> = Vec::with_capacity(entry_ids.len());
        for id in entry_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        if ids.is_empty() {
            return Err(StorageError::Validation("entry_ids are required".to_string()));
        }

        let query_str = format!(
            r#"
            UPDATE entries SET status = ?, run_id = ?, modified_at = ?
            WHERE id IN ({})
            AND status = ? AND run_id IS NULL
            AND type_id = (SELECT type_id FROM runs WHERE id = ?)
            RETURNING rowid AS claim_seq, {}
            "#,
            placeholders(ids.len()),
            ENTRY_COLUMNS
        );
        let mut query = sqlx::query(&query_str)
            .bind(EntryStatus::Processing)
            .bind(run_id)
            .bind(Utc::now());
        for id in &ids {
            query = query.bind(id);
        }
        query = query.bind(EntryStatus::Pending).bind(run_id);

        // The update is the first statement so the write lock is taken up front
        let mut tx = self.pool.begin().await?;
        let rows = query.fetch_all(&mut *tx).await?;

        if rows.len() != ids.len() {
            tx.rollback().await?;
            ensure_run_exists(&self.pool, run_id).await?;
            warn!(
                run_id = %run_id,
                expected = ids.len(),
                available = rows.len(),
                "Attach hit unavailable entries; rolled back"
            );
            return Err(StorageError::Conflict(format!(
                "{} of {} entries are no longer available to claim",
                ids.len() - rows.len(),
                ids.len()
            )));
        }

        tx.commit().await?;

        let claimed = oldest_first(&rows)?;
        info!(run_id = %run_id, claimed_count = claimed.len(), "Entries attached");
        self.bus.invalidate(&[Resource::Entries, Resource::Runs]);
        Ok(ClaimResult::from(claimed))
    }

    /// Release one entry from a run back to `pending`. Only while the run is `created`.
    pub async fn remove_entry(&self, run_id: &str, entry_id: &str) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE entries SET run_id = NULL, status = ?, modified_at = ?
            WHERE id = ? AND run_id = ?
            AND EXISTS (SELECT 1 FROM runs WHERE id = ? AND status = ?)
            "#,
        )
        .bind(EntryStatus::Pending)
        .bind(Utc::now())
        .bind(entry_id)
        .bind(run_id)
        .bind(run_id)
        .bind(RunStatus::Created)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let status: RunStatus = sqlx::query_scalar("SELECT status FROM runs WHERE id = ?")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StorageError::NotFound(format!("Run {}", run_id)))?;

            if status != RunStatus::Created {
                return Err(StorageError::Conflict(format!(
                    "Entries can only be removed while the run is created (run is {})",
                    status
                )));
            }
            return Err(StorageError::NotFound(format!(
                "Entry {} in run {}",
                entry_id, run_id
            )));
        }

        info!(run_id = %run_id, entry_id = %entry_id, "Entry removed from run");
        self.bus.invalidate(&[Resource::Entries, Resource::Runs]);
        Ok(())
    }
}

async fn ensure_run_exists<'e, E>(executor: E, run_id: &str) -> StorageResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs WHERE id = ?")
        .bind(run_id)
        .fetch_one(executor)
        .await?;

    if exists == 0 {
        return Err(StorageError::NotFound(format!("Run {}", run_id)));
    }
    Ok(())
}

/// Order `RETURNING` rows by creation time, insertion order breaking ties
fn oldest_first(rows: &[SqliteRow]) -> StorageResult<Vec<Entry>> {
    let mut claimed = rows
        .iter()
        .map(|row| -> StorageResult<(i64, Entry)> {
            Ok((row.try_get("claim_seq")?, row_to_entry(row)?))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    claimed.sort_by(|(a_seq, a), (b_seq, b)| {
        a.created_at.cmp(&b.created_at).then(a_seq.cmp(b_seq))
    });
    Ok(claimed.into_iter().map(|(_, entry)| entry).collect())
}

/// Unlink entries and delete the run inside the caller's transaction.
///
/// Returns how many `processing` entries were released to `pending`.
pub(crate) async fn delete_run_in(
    tx: &mut Transaction<'_, Sqlite>,
    run_id: &str,
) -> StorageResult<u64> {
    let now = Utc::now();

    let released = sqlx::query(
        "UPDATE entries SET status = ?, modified_at = ? WHERE run_id = ? AND status = ?",
    )
    .bind(EntryStatus::Pending)
    .bind(now)
    .bind(run_id)
    .bind(EntryStatus::Processing)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    sqlx::query("UPDATE entries SET run_id = NULL, modified_at = ? WHERE run_id = ?")
        .bind(now)
        .bind(run_id)
        .execute(&mut **tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM runs WHERE id = ?")
        .bind(run_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(StorageError::NotFound(format!("Run {}", run_id)));
    }

    Ok(released)
}

fn row_to_run(row: &SqliteRow) -> StorageResult<Run> {
    Ok(Run {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        type_id: row.try_get("type_id")?,
        type_name: row.try_get("type_name")?,
        limit_count: row.try_get("limit_count")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}
