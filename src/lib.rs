// Card Export - Core Library
// Normalizes captured credit-card transactions, skips anything already
// exported, and writes the rest as QIF or CSV

pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod ledger;
pub mod naming;
pub mod normalizer;
pub mod pipeline;
pub mod source;
pub mod transaction;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use dates::RecordDateStyle;
pub use error::{DateParseError, ExportError, NormalizeError};
pub use export::{render_csv, render_qif, write_csv, write_qif, ExportFormat};
pub use ledger::{ExportRun, Ledger, RecordReceipt};
pub use naming::next_available_name;
pub use normalizer::{normalize, RawAmount, RawMerchant, RawTransaction};
pub use pipeline::{export_batch, export_transactions, normalize_batch, run_export, ExportOutcome};
pub use source::{CapturedResponseSource, TransactionSource};
pub use transaction::{date_span, IdentityKey, Transaction, PAYEE_WIDTH};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
