// ABOUTME: Report storage layer using SQLite
// ABOUTME: Creating, finishing and deleting reports together with their entries

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, error, info};

use super::types::{Report, ReportCreateInput, ReportStatus, ReportWithEntries, Sources};
use collector_core::{extract_urls, generate_id, InvalidationBus, Resource};
use collector_entries::{row_to_entry, EntryStatus, ENTRY_COLUMNS};
use collector_runs::RunStorage;
use collector_storage::{placeholders, StorageError, StorageResult};

const REPORT_COLUMNS: &str =
    "id, summary, markdown_content, entry_ids, run_id, sources, status, created_at";

pub struct ReportStorage {
    pool: SqlitePool,
    bus: InvalidationBus,
    runs: RunStorage,
}

impl ReportStorage {
    pub fn new(pool: SqlitePool, bus: InvalidationBus) -> Self {
        let runs = RunStorage::new(pool.clone(), bus.clone());
        Self { pool, bus, runs }
    }

    /// List reports, newest first, optionally filtered by status
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> StorageResult<Vec<Report>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM reports WHERE status = ? ORDER BY created_at DESC, rowid DESC",
                    REPORT_COLUMNS
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM reports ORDER BY created_at DESC, rowid DESC",
                    REPORT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_report).collect()
    }

    pub async fn get_report(&self, report_id: &str) -> StorageResult<Report> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reports WHERE id = ?",
            REPORT_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Report {}", report_id)))?;

        row_to_report(&row)
    }

    /// The report plus whichever of its entries still exist
    pub async fn get_report_with_entries(&self, report_id: &str) -> StorageResult<ReportWithEntries> {
        let report = self.get_report(report_id).await?;

        let entries = if report.entry_ids.is_empty() {
            Vec::new()
        } else {
            let query_str = format!(
                "SELECT {} FROM entries WHERE id IN ({}) ORDER BY created_at ASC, rowid ASC",
                ENTRY_COLUMNS,
                placeholders(report.entry_ids.len())
            );
            let mut query = sqlx::query(&query_str);
            for id in &report.entry_ids {
                query = query.bind(id);
            }
            let rows = query.fetch_all(&self.pool).await?;
            rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()?
        };

        Ok(ReportWithEntries { report, entries })
    }

    /// Insert a `processed` report and mark its entries `processed`, atomically.
    ///
    /// Without explicit sources, the URLs found in the markdown are numbered
    /// from "1" in order of first appearance.
    pub async fn create_report(&self, input: ReportCreateInput) -> StorageResult<Report> {
        if input.summary.trim().is_empty() {
            return Err(StorageError::Validation("summary is required".to_string()));
        }
        if input.entry_ids.is_empty() {
            return Err(StorageError::Validation(
                "entry_ids must not be empty".to_string(),
            ));
        }

        let sources = match input.sources {
            Some(sources) => sources,
            None => sources_from_markdown(&input.markdown_content),
        };
        let sources_json = if sources.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&sources)?)
        };
        let entry_ids_json = serde_json::to_string(&input.entry_ids)?;

        let report_id = generate_id("report");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reports (id, summary, markdown_content, entry_ids, run_id, sources, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report_id)
        .bind(&input.summary)
        .bind(&input.markdown_content)
        .bind(&entry_ids_json)
        .bind(&input.run_id)
        .bind(&sources_json)
        .bind(ReportStatus::Processed)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = set_entry_status(&mut tx, &input.entry_ids, EntryStatus::Processed).await?;

        tx.commit().await?;

        info!(
            report_id = %report_id,
            entries = updated,
            "Report created"
        );
        self.bus.invalidate(&[Resource::Reports, Resource::Entries]);
        self.get_report(&report_id).await
    }

    /// Mark a report `done` and archive its entries, atomically
    pub async fn mark_done(&self, report_id: &str) -> StorageResult<()> {
        let report = self.get_report(report_id).await?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE reports SET status = ? WHERE id = ?")
            .bind(ReportStatus::Done)
            .bind(report_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Report {}", report_id)));
        }

        let archived = set_entry_status(&mut tx, &report.entry_ids, EntryStatus::Archived).await?;

        tx.commit().await?;

        info!(report_id = %report_id, archived, "Report marked done");
        self.bus.invalidate(&[Resource::Reports, Resource::Entries]);
        Ok(())
    }

    /// Delete a report together with its entries, then its run.
    ///
    /// The run cascade runs after the commit; its failure is logged only.
    pub async fn delete_report(&self, report_id: &str) -> StorageResult<()> {
        let report = self.get_report(report_id).await?;

        let mut tx = self.pool.begin().await?;

        let mut deleted_entries = 0;
        if !report.entry_ids.is_empty() {
            let query_str = format!(
                "DELETE FROM entries WHERE id IN ({})",
                placeholders(report.entry_ids.len())
            );
            let mut query = sqlx::query(&query_str);
            for id in &report.entry_ids {
                query = query.bind(id);
            }
            deleted_entries = query.execute(&mut *tx).await?.rows_affected();
        }

        sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(report_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(report_id = %report_id, deleted_entries, "Report deleted");
        self.bus.invalidate(&[Resource::Reports, Resource::Entries]);

        if let Some(run_id) = &report.run_id {
            match self.runs.delete_run(run_id).await {
                Ok(()) => debug!(report_id = %report_id, run_id = %run_id, "Linked run deleted"),
                Err(StorageError::NotFound(_)) => {
                    debug!(run_id = %run_id, "Linked run already gone")
                }
                Err(e) => error!(
                    report_id = %report_id,
                    run_id = %run_id,
                    "Failed to delete linked run: {}",
                    e
                ),
            }
        }

        Ok(())
    }
}

async fn set_entry_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    entry_ids: &[String],
    status: EntryStatus,
) -> StorageResult<u64> {
    if entry_ids.is_empty() {
        return Ok(0);
    }

    let query_str = format!(
        "UPDATE entries SET status = ?, modified_at = ? WHERE id IN ({})",
        placeholders(entry_ids.len())
    );
    let mut query = sqlx::query(&query_str).bind(status).bind(Utc::now());
    for id in entry_ids {
        query = query.bind(id);
    }

    Ok(query.execute(&mut **tx).await?.rows_affected())
}

fn sources_from_markdown(markdown: &str) -> Sources {
    extract_urls(markdown)
        .into_iter()
        .enumerate()
        .map(|(i, url)| ((i + 1).to_string(), url))
        .collect()
}

fn row_to_report(row: &SqliteRow) -> StorageResult<Report> {
    let entry_ids: String = row.try_get("entry_ids")?;
    let sources: Option<String> = row.try_get("sources")?;

    Ok(Report {
        id: row.try_get("id")?,
        summary: row.try_get("summary")?,
        markdown_content: row.try_get("markdown_content")?,
        entry_ids: serde_json::from_str(&entry_ids)?,
        run_id: row.try_get("run_id")?,
        sources: sources.map(|s| serde_json::from_str(&s)).transpose()?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use collector_entries::{Entry, EntryCreateInput, EntryStorage, TypeStorage};
    use collector_runs::{RunCreateInput, RunStatus};
    use collector_storage::{connect, DatabaseConfig};
    use pretty_assertions::assert_eq;

    struct Fixture {
        reports: ReportStorage,
        entries: EntryStorage,
        runs: RunStorage,
        type_id: String,
    }

    async fn setup() -> Fixture {
        let pool = connect(&DatabaseConfig::in_memory()).await.unwrap();
        let bus = InvalidationBus::new();
        let types = TypeStorage::new(pool.clone(), bus.clone());
        let t = types.create_type("papers").await.unwrap();

        Fixture {
            reports: ReportStorage::new(pool.clone(), bus.clone()),
            entries: EntryStorage::new(pool.clone(), bus.clone()),
            runs: RunStorage::new(pool, bus),
            type_id: t.id,
        }
    }

    async fn add_entries(f: &Fixture, n: usize) -> Vec<Entry> {
        let mut created = Vec::new();
        for i in 0..n {
            created.extend(
                f.entries
                    .create_entries(EntryCreateInput {
                        content: format!("entry {}", i),
                        type_ids: vec![f.type_id.clone()],
                    })
                    .await
                    .unwrap(),
            );
        }
        created
    }

    fn ids(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_report_marks_entries_processed() {
        let f = setup().await;
        let entries = add_entries(&f, 2).await;

        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Weekly".to_string(),
                markdown_content: "# Weekly".to_string(),
                entry_ids: ids(&entries),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Processed);
        assert_eq!(report.entry_ids, ids(&entries));
        for entry in &entries {
            let e = f.entries.get_entry(&entry.id).await.unwrap();
            assert_eq!(e.status, EntryStatus::Processed);
        }
    }

    #[tokio::test]
    async fn test_create_report_fills_sources_from_markdown() {
        let f = setup().await;
        let entries = add_entries(&f, 1).await;

        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Links".to_string(),
                markdown_content:
                    "See https://a.example.com/x and https://b.example.org then https://a.example.com/x"
                        .to_string(),
                entry_ids: ids(&entries),
                ..Default::default()
            })
            .await
            .unwrap();

        let sources = report.sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources["1"], "https://a.example.com/x");
        assert_eq!(sources["2"], "https://b.example.org");
    }

    #[tokio::test]
    async fn test_create_report_keeps_explicit_sources() {
        let f = setup().await;
        let entries = add_entries(&f, 1).await;
        let mut sources = Sources::new();
        sources.insert("1".to_string(), "https://given.example.com".to_string());

        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Given".to_string(),
                markdown_content: "https://ignored.example.com".to_string(),
                entry_ids: ids(&entries),
                sources: Some(sources.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(report.sources, Some(sources));
    }

    #[tokio::test]
    async fn test_create_report_validation() {
        let f = setup().await;
        let entries = add_entries(&f, 1).await;

        let err = f
            .reports
            .create_report(ReportCreateInput {
                summary: "  ".to_string(),
                entry_ids: ids(&entries),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let err = f
            .reports
            .create_report(ReportCreateInput {
                summary: "ok".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_report_rolls_back_on_unknown_run() {
        let f = setup().await;
        let entries = add_entries(&f, 1).await;

        let result = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Broken".to_string(),
                markdown_content: String::new(),
                entry_ids: ids(&entries),
                run_id: Some("run-missing".to_string()),
                sources: None,
            })
            .await;
        assert!(result.is_err());

        assert!(f.reports.list_reports(None).await.unwrap().is_empty());
        let e = f.entries.get_entry(&entries[0].id).await.unwrap();
        assert_eq!(e.status, EntryStatus::Pending);
    }

    #[tokio::test]
    async fn test_mark_done_archives_entries() {
        let f = setup().await;
        let entries = add_entries(&f, 2).await;
        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Done soon".to_string(),
                entry_ids: ids(&entries),
                ..Default::default()
            })
            .await
            .unwrap();

        f.reports.mark_done(&report.id).await.unwrap();

        let done = f.reports.get_report(&report.id).await.unwrap();
        assert_eq!(done.status, ReportStatus::Done);
        for entry in &entries {
            let e = f.entries.get_entry(&entry.id).await.unwrap();
            assert_eq!(e.status, EntryStatus::Archived);
        }
    }

    #[tokio::test]
    async fn test_mark_done_missing_report() {
        let f = setup().await;
        let err = f.reports.mark_done("report-missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_reports_filters_by_status() {
        let f = setup().await;
        let entries = add_entries(&f, 2).await;
        let first = f
            .reports
            .create_report(ReportCreateInput {
                summary: "first".to_string(),
                entry_ids: vec![entries[0].id.clone()],
                ..Default::default()
            })
            .await
            .unwrap();
        let second = f
            .reports
            .create_report(ReportCreateInput {
                summary: "second".to_string(),
                entry_ids: vec![entries[1].id.clone()],
                ..Default::default()
            })
            .await
            .unwrap();
        f.reports.mark_done(&first.id).await.unwrap();

        let all = f.reports.list_reports(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let done = f.reports.list_reports(Some(ReportStatus::Done)).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, first.id);
    }

    #[tokio::test]
    async fn test_delete_report_removes_entries_and_run() {
        let f = setup().await;
        add_entries(&f, 2).await;
        let run = f
            .runs
            .create_run(RunCreateInput {
                name: "batch".to_string(),
                type_id: f.type_id.clone(),
                limit_count: None,
            })
            .await
            .unwrap();
        let claimed = f.runs.claim_entries(&run.id, &f.type_id, 5).await.unwrap();
        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Run report".to_string(),
                entry_ids: ids(&claimed.entries),
                run_id: Some(run.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        f.reports.delete_report(&report.id).await.unwrap();

        let err = f.reports.get_report(&report.id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        for entry in &claimed.entries {
            assert!(f.entries.get_entry(&entry.id).await.is_err());
        }
        assert!(f.runs.get_run(&run.id).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_run_keeps_report() {
        let f = setup().await;
        add_entries(&f, 1).await;
        let run = f
            .runs
            .create_run(RunCreateInput {
                name: "batch".to_string(),
                type_id: f.type_id.clone(),
                limit_count: None,
            })
            .await
            .unwrap();
        let claimed = f.runs.claim_entries(&run.id, &f.type_id, 5).await.unwrap();
        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "Run report".to_string(),
                entry_ids: ids(&claimed.entries),
                run_id: Some(run.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            f.runs.get_run(&run.id).await.unwrap().status,
            RunStatus::Created
        );

        f.runs.delete_run(&run.id).await.unwrap();

        let kept = f.reports.get_report(&report.id).await.unwrap();
        assert!(kept.run_id.is_none());
        let e = f.entries.get_entry(&claimed.entries[0].id).await.unwrap();
        assert_eq!(e.status, EntryStatus::Processed);
    }

    #[tokio::test]
    async fn test_get_report_with_entries() {
        let f = setup().await;
        let entries = add_entries(&f, 2).await;
        let report = f
            .reports
            .create_report(ReportCreateInput {
                summary: "With entries".to_string(),
                entry_ids: ids(&entries),
                ..Default::default()
            })
            .await
            .unwrap();

        let detail = f.reports.get_report_with_entries(&report.id).await.unwrap();
        assert_eq!(ids(&detail.entries), ids(&entries));
    }
}
