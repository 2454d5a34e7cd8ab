//! Parked finish payloads.
//!
//! When the backend rejects a finished session, the payload lands here so
//! `notula pending flush` can retry later. This is a recovery path only:
//! while a session is live, the in-memory record stays authoritative.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// A finish payload awaiting upload.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub id: i64,
    pub meeting_id: i64,
    pub session_id: String,
    /// The serialized finish request, exactly as it would have been sent.
    pub payload: String,
    pub created_at: String,
}

/// Repository for parked payloads.
pub struct PendingUploadRepository;

impl PendingUploadRepository {
    /// Park a payload. Returns the new row id.
    pub fn insert(
        conn: &Connection,
        meeting_id: i64,
        session_id: &str,
        payload: &str,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO pending_uploads (meeting_id, session_id, payload) VALUES (?1, ?2, ?3)",
            params![meeting_id, session_id, payload],
        )
        .context("Failed to insert pending upload")?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a parked payload by id.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<PendingUpload>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, meeting_id, session_id, payload, created_at \
                 FROM pending_uploads WHERE id = ?1",
            )
            .context("Failed to prepare pending upload query")?;

        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(PendingUpload {
                    id: row.get(0)?,
                    meeting_id: row.get(1)?,
                    session_id: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .context("Failed to query pending upload")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// List parked payloads, oldest first so retries preserve upload order.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<PendingUpload>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, meeting_id, session_id, payload, created_at \
                 FROM pending_uploads ORDER BY created_at ASC, id ASC LIMIT ?1",
            )
            .context("Failed to prepare pending uploads list query")?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(PendingUpload {
                    id: row.get(0)?,
                    meeting_id: row.get(1)?,
                    session_id: row.get(2)?,
                    payload: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .context("Failed to list pending uploads")?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    /// Remove a payload after a successful upload.
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM pending_uploads WHERE id = ?1", params![id])
            .context("Failed to delete pending upload")?;
        Ok(())
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM pending_uploads", [], |row| row.get(0))
            .context("Failed to count pending uploads")
    }
}
