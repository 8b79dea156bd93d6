// 🗄️ Dedup Ledger - SQLite history of every exported transaction
// Transaction entries are append-only; a run row only gains its file path

use crate::error::ExportError;
use crate::export::ExportFormat;
use crate::transaction::{date_span, Transaction};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};
use std::path::{Path, PathBuf};

/// One `record` call: a batch that was (or was about to be) written to a file
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRun {
    pub run_id: String,
    pub recorded_at: DateTime<Utc>,
    pub format: ExportFormat,
    /// Entries actually stored under this run
    pub transaction_count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// None until the export file was written successfully
    pub file_path: Option<PathBuf>,
}

/// Outcome of `Ledger::record`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordReceipt {
    /// Export run the entries were filed under (None for an empty batch)
    pub run_id: Option<String>,
    pub inserted: usize,
    /// Entries whose identity key was already present
    pub ignored: usize,
}

pub struct Ledger {
    conn: Connection,
    path: PathBuf,
}

impl Ledger {
    /// Open (creating if needed) the ledger database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();

        let conn = Connection::open(&path)
            .and_then(|conn| {
                setup_ledger(&conn)?;
                Ok(conn)
            })
            .map_err(|source| ExportError::StoreUnavailable {
                path: path.clone(),
                source,
            })?;

        debug!("Opened ledger at {}", path.display());
        Ok(Ledger { conn, path })
    }

    /// Throwaway ledger, nothing survives the process
    pub fn open_in_memory() -> Result<Self, ExportError> {
        let path = PathBuf::from(":memory:");

        let conn = Connection::open_in_memory()
            .and_then(|conn| {
                setup_ledger(&conn)?;
                Ok(conn)
            })
            .map_err(|source| ExportError::StoreUnavailable {
                path: path.clone(),
                source,
            })?;

        Ok(Ledger { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The transactions of `batch` whose identity key is not in the ledger,
    /// in their original order. Read only.
    pub fn filter_new(&self, batch: &[Transaction]) -> Result<Vec<Transaction>, ExportError> {
        let mut stmt = self.conn.prepare(
            "SELECT EXISTS(SELECT 1 FROM exported_transactions WHERE idempotency_hash = ?1)",
        )?;

        let mut fresh = Vec::new();
        for tx in batch {
            let seen: bool = stmt.query_row(params![tx.compute_idempotency_hash()], |row| row.get(0))?;

            if seen {
                debug!(
                    "Already exported: {} {} {}",
                    tx.date(),
                    tx.amount(),
                    tx.description()
                );
            } else {
                fresh.push(tx.clone());
            }
        }

        Ok(fresh)
    }

    /// Append `batch` to the ledger as one export run.
    ///
    /// All-or-nothing: the run row and every entry are written inside a single
    /// SQLite transaction, so a crash part way leaves none of them visible.
    pub fn record(
        &mut self,
        batch: &[Transaction],
        format: ExportFormat,
    ) -> Result<RecordReceipt, ExportError> {
        let (start, end) = match date_span(batch) {
            Some(span) => span,
            None => return Ok(RecordReceipt::default()),
        };

        let run_id = uuid::Uuid::new_v4().to_string();
        let mut inserted = 0;

        let db_tx = self.conn.transaction()?;

        {
            let mut stmt = db_tx.prepare(
                "INSERT OR IGNORE INTO exported_transactions (
                    idempotency_hash, date, payer, amount, payee, memo, run_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for tx in batch {
                inserted += stmt.execute(params![
                    tx.compute_idempotency_hash(),
                    tx.date(),
                    tx.payer(),
                    tx.amount(),
                    tx.payee(),
                    tx.memo(),
                    run_id,
                ])?;
            }
        }

        // Written after the entries so the count matches what was stored
        db_tx.execute(
            "INSERT INTO export_runs (
                run_id, recorded_at, format, transaction_count, start_date, end_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, Utc::now(), format, inserted as i64, start, end],
        )?;

        db_tx.commit()?;

        let ignored = batch.len() - inserted;
        if ignored > 0 {
            warn!(
                "{} transaction(s) in run {} repeat an identity already in the ledger",
                ignored, run_id
            );
        }

        Ok(RecordReceipt {
            run_id: Some(run_id),
            inserted,
            ignored,
        })
    }

    /// Attach the file an export run ended up in
    pub fn mark_written(&self, run_id: &str, file_path: &Path) -> Result<(), ExportError> {
        self.conn.execute(
            "UPDATE export_runs SET file_path = ?1 WHERE run_id = ?2",
            params![file_path.to_string_lossy().into_owned(), run_id],
        )?;
        Ok(())
    }

    /// Number of transactions ever recorded
    pub fn count(&self) -> Result<usize, ExportError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exported_transactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Every export run, oldest first
    pub fn runs(&self) -> Result<Vec<ExportRun>, ExportError> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, recorded_at, format, transaction_count, start_date, end_date, file_path
             FROM export_runs
             ORDER BY id",
        )?;

        let runs = stmt
            .query_map([], |row| {
                let count: i64 = row.get(3)?;
                let file_path: Option<String> = row.get(6)?;

                Ok(ExportRun {
                    run_id: row.get(0)?,
                    recorded_at: row.get(1)?,
                    format: row.get(2)?,
                    transaction_count: count as usize,
                    start_date: row.get(4)?,
                    end_date: row.get(5)?,
                    file_path: file_path.map(PathBuf::from),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    /// Transactions filed under one export run, in insertion order
    pub fn transactions_for_run(&self, run_id: &str) -> Result<Vec<Transaction>, ExportError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, payer, amount, payee, memo
             FROM exported_transactions
             WHERE run_id = ?1
             ORDER BY id",
        )?;

        let transactions = stmt
            .query_map(params![run_id], |row| {
                Ok(Transaction::from_parts(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Release the database handle, surfacing any error from closing it.
    /// Dropping the ledger releases it as well.
    pub fn close(self) -> Result<(), ExportError> {
        self.conn.close().map_err(|(_, err)| ExportError::Store(err))
    }
}

// Stored by file extension: `qif` / `csv`
impl ToSql for ExportFormat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.extension()))
    }
}

impl FromSql for ExportFormat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "qif" => Ok(ExportFormat::Qif),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(FromSqlError::Other(
                format!("unknown export format {:?}", other).into(),
            )),
        }
    }
}

fn setup_ledger(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS export_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            recorded_at TEXT NOT NULL,
            format TEXT NOT NULL,
            transaction_count INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            file_path TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exported_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            payer TEXT NOT NULL,
            amount TEXT NOT NULL,
            payee TEXT NOT NULL,
            memo TEXT NOT NULL,
            run_id TEXT NOT NULL REFERENCES export_runs(run_id),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exported_run ON exported_transactions(run_id)",
        [],
    )?;

    Ok(())
}
