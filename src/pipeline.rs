// 🔄 Export pipeline
// raw records → normalize → ledger filter → ledger record → name → write
//
// Ordering policy: the ledger records a batch *before* the file is written.
// If the write then fails the batch stays recorded (its export run keeps no
// file path) and a retry will not export it again. Re-exporting duplicates
// into finance software is the worse failure, so the record is not rolled back.

use crate::config::Config;
use crate::dates::format_for_record;
use crate::error::ExportError;
use crate::ledger::Ledger;
use crate::naming::next_available_name;
use crate::normalizer::{normalize, RawTransaction};
use crate::transaction::{date_span, Transaction};
use log::info;
use std::path::PathBuf;

/// What one pipeline run did
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// Records handed in by the source
    pub fetched: usize,
    /// Transactions not seen in any earlier run, in feed order
    pub new_transactions: Vec<Transaction>,
    /// Export file, None when there was nothing new
    pub file: Option<PathBuf>,
    /// Ledger export run the batch was recorded under
    pub run_id: Option<String>,
}

impl ExportOutcome {
    pub fn is_empty(&self) -> bool {
        self.new_transactions.is_empty()
    }
}

/// Normalize every record or none: the first malformed record aborts
pub fn normalize_batch(raws: &[RawTransaction]) -> Result<Vec<Transaction>, ExportError> {
    raws.iter()
        .enumerate()
        .map(|(index, raw)| {
            normalize(raw).map_err(|source| ExportError::MalformedTransaction { index, source })
        })
        .collect()
}

/// Full run: opens the ledger at `config.ledger_path`, exports, and releases
/// the ledger again on every path out.
pub fn run_export(config: &Config, raws: &[RawTransaction]) -> Result<ExportOutcome, ExportError> {
    // Nothing touches the ledger until the whole batch normalized cleanly
    let candidates = normalize_batch(raws)?;

    let mut ledger = Ledger::open(&config.ledger_path)?;
    let outcome = export_transactions(&mut ledger, candidates, config);
    let closed = ledger.close();

    let outcome = outcome?;
    closed?;
    Ok(outcome)
}

/// Normalize `raws` and export them against an already open ledger
pub fn export_batch(
    ledger: &mut Ledger,
    raws: &[RawTransaction],
    config: &Config,
) -> Result<ExportOutcome, ExportError> {
    let candidates = normalize_batch(raws)?;
    export_transactions(ledger, candidates, config)
}

/// Dedup, record and write an already normalized batch
pub fn export_transactions(
    ledger: &mut Ledger,
    candidates: Vec<Transaction>,
    config: &Config,
) -> Result<ExportOutcome, ExportError> {
    let fetched = candidates.len();
    match (candidates.first(), candidates.last()) {
        (Some(first), Some(last)) => info!(
            "Got {} transactions, from {} to {}",
            fetched,
            format_for_record(first.date()),
            format_for_record(last.date())
        ),
        _ => info!("Got 0 transactions"),
    }

    let fresh = ledger.filter_new(&candidates)?;
    info!("Total of {} new transactions obtained", fresh.len());

    let (start, end) = match date_span(&fresh) {
        Some(span) => span,
        None => {
            return Ok(ExportOutcome {
                fetched,
                new_transactions: fresh,
                file: None,
                run_id: None,
            })
        }
    };

    info!("Saving transactions...");
    let receipt = ledger.record(&fresh, config.format)?;

    let path = next_available_name(
        &config.export_dir,
        start,
        end,
        config.format.extension(),
    );
    config.format.write(&fresh, &path, config.date_style)?;

    if let Some(run_id) = &receipt.run_id {
        ledger.mark_written(run_id, &path)?;
    }

    Ok(ExportOutcome {
        fetched,
        new_transactions: fresh,
        file: Some(path),
        run_id: receipt.run_id,
    })
}
