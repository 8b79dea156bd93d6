// Run configuration - export dir, ledger location, output format
// Loaded from an optional TOML file, CLI flags override it

use crate::dates::RecordDateStyle;
use crate::export::ExportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the export pipeline needs to know about its surroundings.
/// Passed explicitly into `pipeline::run_export`, never read from globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the QIF/CSV files are written into
    pub export_dir: PathBuf,
    /// SQLite file holding the dedup ledger
    pub ledger_path: PathBuf,
    pub format: ExportFormat,
    pub date_style: RecordDateStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./export"),
            ledger_path: PathBuf::from("./export/transactions.db"),
            format: ExportFormat::Qif,
            date_style: RecordDateStyle::MonthFirst,
        }
    }
}

/// Read a TOML config file. A missing file means defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
