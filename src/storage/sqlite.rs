//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ReportStore
//! trait. Structured pipeline output is stored as JSON columns.

use crate::crawler::PipelineResult;
use crate::insights::Insights;
use crate::scoring::Grade;
use crate::state::ReportStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ReportStore, StorageError, StorageResult};
use crate::storage::{ReportRecord, ReportSummary, StoredAnalysis};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite report storage backend
pub struct SqliteReportStore {
    conn: Connection,
}

impl SqliteReportStore {
    /// Creates a new SqliteReportStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteReportStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn current_status(&self, report_id: i64) -> StorageResult<ReportStatus> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM reports WHERE id = ?1",
                params![report_id],
                |row| row.get(0),
            )
            .optional()?;

        let raw = raw.ok_or(StorageError::ReportNotFound(report_id))?;
        parse_status(&raw)
    }

    fn check_transition(&self, report_id: i64, to: ReportStatus) -> StorageResult<()> {
        let from = self.current_status(report_id)?;
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(StorageError::InvalidTransition { from, to })
        }
    }

    fn load_analysis(&self, report_id: i64) -> StorageResult<Option<StoredAnalysis>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT page_data, audit_result, score_result FROM seo_data WHERE report_id = ?1",
                params![report_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(page_data, audit_result, score_result)| {
            Ok(StoredAnalysis {
                page_data: serde_json::from_str(&page_data)?,
                audit_result: serde_json::from_str(&audit_result)?,
                score_result: serde_json::from_str(&score_result)?,
            })
        })
        .transpose()
    }

    fn load_insights(&self, report_id: i64) -> StorageResult<Option<Insights>> {
        let row: Option<(String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT summary, recommendations, model_used FROM insights WHERE report_id = ?1",
                params![report_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(summary, recommendations, model_used)| {
            Ok(Insights {
                summary,
                recommendations: serde_json::from_str(&recommendations)?,
                model_used,
            })
        })
        .transpose()
    }
}

/// Raw `reports` row, before status and JSON decoding
struct ReportRow {
    id: i64,
    url: String,
    status: String,
    seo_score: Option<f64>,
    grade: Option<String>,
    created_at: String,
    completed_at: Option<String>,
    error_message: Option<String>,
    error_stage: Option<String>,
    degradations: Option<String>,
}

impl ReportRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            status: row.get(2)?,
            seo_score: row.get(3)?,
            grade: row.get(4)?,
            created_at: row.get(5)?,
            completed_at: row.get(6)?,
            error_message: row.get(7)?,
            error_stage: row.get(8)?,
            degradations: row.get(9)?,
        })
    }
}

fn parse_status(raw: &str) -> StorageResult<ReportStatus> {
    ReportStatus::from_db_string(raw)
        .ok_or_else(|| StorageError::Corrupt(format!("unknown report status '{}'", raw)))
}

impl ReportStore for SqliteReportStore {
    fn create_report(&mut self, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO reports (url, status, created_at) VALUES (?1, ?2, ?3)",
            params![url, ReportStatus::Pending.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn mark_processing(&mut self, report_id: i64) -> StorageResult<()> {
        self.check_transition(report_id, ReportStatus::Processing)?;
        self.conn.execute(
            "UPDATE reports SET status = ?1 WHERE id = ?2",
            params![ReportStatus::Processing.to_db_string(), report_id],
        )?;
        Ok(())
    }

    fn complete_report(&mut self, report_id: i64, result: &PipelineResult) -> StorageResult<()> {
        self.check_transition(report_id, ReportStatus::Completed)?;

        let page = &result.page_data;
        let score = &result.score_result;
        let page_json = serde_json::to_string(page)?;
        let audit_json = serde_json::to_string(&result.audit_result)?;
        let score_json = serde_json::to_string(score)?;
        let degradations_json = serde_json::to_string(&result.degradations)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO seo_data (report_id, title, total_links, broken_links_count, load_time,
             page_size, page_data, audit_result, score_result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                report_id,
                page.title,
                page.total_links() as i64,
                result.audit_result.broken_links_count() as i64,
                page.load_time_seconds,
                page.page_size_bytes as i64,
                page_json,
                audit_json,
                score_json,
            ],
        )?;

        if let Some(insights) = &result.insights {
            tx.execute(
                "INSERT INTO insights (report_id, summary, recommendations, model_used, generated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    report_id,
                    insights.summary,
                    serde_json::to_string(&insights.recommendations)?,
                    insights.model_used,
                    now,
                ],
            )?;
        }

        tx.execute(
            "UPDATE reports SET status = ?1, seo_score = ?2, grade = ?3, completed_at = ?4,
             degradations = ?5 WHERE id = ?6",
            params![
                ReportStatus::Completed.to_db_string(),
                score.overall,
                score.grade.to_string(),
                now,
                degradations_json,
                report_id,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn fail_report(
        &mut self,
        report_id: i64,
        stage: Option<&str>,
        message: &str,
    ) -> StorageResult<()> {
        self.check_transition(report_id, ReportStatus::Failed)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE reports SET status = ?1, error_message = ?2, error_stage = ?3,
             completed_at = ?4 WHERE id = ?5",
            params![
                ReportStatus::Failed.to_db_string(),
                message,
                stage,
                now,
                report_id
            ],
        )?;
        Ok(())
    }

    fn get_report(&self, report_id: i64) -> StorageResult<ReportRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT id, url, status, seo_score, grade, created_at, completed_at,
                 error_message, error_stage, degradations
                 FROM reports WHERE id = ?1",
                params![report_id],
                ReportRow::from_row,
            )
            .optional()?
            .ok_or(StorageError::ReportNotFound(report_id))?;

        let degradations = match row.degradations.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => Vec::new(),
        };

        Ok(ReportRecord {
            id: row.id,
            url: row.url,
            status: parse_status(&row.status)?,
            seo_score: row.seo_score,
            grade: row.grade.as_deref().and_then(Grade::from_letter),
            created_at: row.created_at,
            completed_at: row.completed_at,
            error_message: row.error_message,
            error_stage: row.error_stage,
            degradations,
            analysis: self.load_analysis(report_id)?,
            insights: self.load_insights(report_id)?,
        })
    }

    fn list_reports(&self, offset: usize, limit: usize) -> StorageResult<Vec<ReportSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, status, seo_score, created_at FROM reports
             ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut reports = Vec::new();
        for row in rows {
            let (id, url, status, seo_score, created_at) = row?;
            reports.push(ReportSummary {
                id,
                url,
                status: parse_status(&status)?,
                seo_score,
                created_at,
            });
        }

        Ok(reports)
    }

    fn count_reports(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn delete_report(&mut self, report_id: i64) -> StorageResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?1", params![report_id])?;

        if deleted == 0 {
            return Err(StorageError::ReportNotFound(report_id));
        }
        Ok(())
    }
}
