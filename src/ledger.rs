use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

use crate::decision::Label;

/// One finished scan, ready for persistence. Immutable once built; owned by
/// the ledger after `append`.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub url: String,
    pub label: Label,
    pub confidence: f64,
    pub risk_score: u8,
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// A persisted verdict plus the identifier the ledger assigned at insert.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub url: String,
    pub prediction: String,
    pub confidence: f64,
    pub risk_score: i64,
    pub reasons: String,
    pub timestamp: String,
}

/// Append-only audit store of scan verdicts. There is deliberately no
/// update or delete operation; scans are a trail, not mutable state.
pub struct ScanLedger {
    conn: Mutex<Connection>,
}

impl ScanLedger {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating ledger directory {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening scan ledger at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                prediction TEXT NOT NULL,
                confidence REAL NOT NULL,
                risk_score INTEGER NOT NULL,
                reasons TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist a verdict and return its assigned identifier. The row is
    /// durable before this returns; failures are reported to the caller.
    pub fn append(&self, verdict: &Verdict) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("scan ledger lock poisoned"))?;

        conn.execute(
            "INSERT INTO scans (url, prediction, confidence, risk_score, reasons, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                verdict.url,
                verdict.label.as_str(),
                verdict.confidence,
                verdict.risk_score as i64,
                verdict.reasons.join("; "),
                verdict.timestamp.to_rfc3339(),
            ],
        )
        .context("appending scan verdict")?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: u32) -> Result<Vec<LedgerEntry>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("scan ledger lock poisoned"))?;

        let mut stmt = conn.prepare(
            "SELECT id, url, prediction, confidence, risk_score, reasons, timestamp
             FROM scans ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                url: row.get(1)?,
                prediction: row.get(2)?,
                confidence: row.get(3)?,
                risk_score: row.get(4)?,
                reasons: row.get(5)?,
                timestamp: row.get(6)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
