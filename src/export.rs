// 📤 Exporters - QIF and CSV renderings of an export batch
// See http://en.wikipedia.org/wiki/Quicken_Interchange_Format for the QIF layout

use crate::dates::RecordDateStyle;
use crate::error::ExportError;
use crate::transaction::Transaction;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "Date,Amount,Payer,Payee";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Qif,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Qif => "qif",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Qif => "QIF",
            ExportFormat::Csv => "CSV",
        }
    }

    /// Render `batch` in this format into any writer
    pub fn render<W: Write>(
        &self,
        batch: &[Transaction],
        style: RecordDateStyle,
        out: &mut W,
    ) -> io::Result<()> {
        match self {
            ExportFormat::Qif => render_qif(batch, style, out),
            ExportFormat::Csv => render_csv(batch, style, out),
        }
    }

    /// Create `path` and write `batch` into it.
    ///
    /// The file is opened with `create_new`: an existing file is never
    /// truncated, the call fails instead.
    pub fn write(
        &self,
        batch: &[Transaction],
        path: &Path,
        style: RecordDateStyle,
    ) -> Result<(), ExportError> {
        info!("Writing {} file {}...", self.name(), path.display());

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| ExportError::write(path, e))?;

        let mut out = BufWriter::new(file);
        self.render(batch, style, &mut out)
            .and_then(|_| out.flush())
            .map_err(|e| ExportError::write(path, e))?;

        info!("Wrote {} transaction(s) to {}", batch.len(), path.display());
        Ok(())
    }
}

/// QIF credit-card file with `MM/DD/YYYY` dates
pub fn write_qif(batch: &[Transaction], path: &Path) -> Result<(), ExportError> {
    ExportFormat::Qif.write(batch, path, RecordDateStyle::default())
}

/// CSV file with `MM/DD/YYYY` dates
pub fn write_csv(batch: &[Transaction], path: &Path) -> Result<(), ExportError> {
    ExportFormat::Csv.write(batch, path, RecordDateStyle::default())
}

/// Account header, then one `C D T M P ^` block per transaction.
/// Field order is fixed; finance software rejects anything else.
pub fn render_qif<W: Write>(
    batch: &[Transaction],
    style: RecordDateStyle,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "!Account")?;
    writeln!(out, "NQIF Account")?;
    writeln!(out, "TCCard")?;
    writeln!(out, "^")?;
    writeln!(out, "!Type:CCard")?;

    for tx in batch {
        writeln!(out, "C")?; // status - uncleared
        writeln!(out, "D{}", style.format(tx.date()))?;
        writeln!(out, "T{}", tx.amount())?;
        writeln!(out, "M{}", tx.payer())?;
        writeln!(out, "P{}{}", tx.payee(), tx.memo())?;
        writeln!(out, "^")?; // end of record
    }

    Ok(())
}

/// Plain header row, then every field double quoted. Memo is not exported.
pub fn render_csv<W: Write>(
    batch: &[Transaction],
    style: RecordDateStyle,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);

    for tx in batch {
        let date = style.format(tx.date());
        writer.write_record([date.as_str(), tx.amount(), tx.payer(), tx.payee()])?;
    }

    writer.flush()?;
    Ok(())
}
