use anyhow::{Context, Result};
use card_export::{
    load_config, run_export, save_config, CapturedResponseSource, Config, ExportFormat, Ledger,
    TransactionSource,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "card-export",
    version,
    about = "Turn captured credit-card transactions into QIF or CSV, skipping anything already exported"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export new transactions from captured `transactions` response bodies
    Export {
        /// Captured response JSON files, in page order
        #[arg(long = "input", short, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Write CSV instead of QIF
        #[arg(long)]
        csv: bool,

        /// Directory for export files (overrides config)
        #[arg(long)]
        export_dir: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show what the ledger has recorded so far
    History {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write a config file with the default settings
    InitConfig {
        /// Where to write it
        #[arg(long, default_value = "card-export.toml")]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// TOML config file
    #[arg(long, default_value = "card-export.toml")]
    config: PathBuf,

    /// Ledger database (overrides config)
    #[arg(long)]
    ledger: Option<PathBuf>,
}

impl CommonArgs {
    fn load(&self) -> Result<Config> {
        let mut config = load_config(&self.config)?;
        if let Some(ledger) = &self.ledger {
            config.ledger_path = ledger.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Export {
            inputs,
            csv,
            export_dir,
            common,
        } => {
            let mut config = common.load()?;
            if let Some(dir) = export_dir {
                config.export_dir = dir;
            }
            if csv {
                config.format = ExportFormat::Csv;
            }
            run_export_command(&config, inputs)?;
        }

        Command::History { common } => {
            show_history(&common.load()?)?;
        }

        Command::InitConfig { config } => {
            if config.exists() {
                println!("Config already exists: {}", config.display());
            } else {
                save_config(&Config::default(), &config)?;
                println!("✓ Wrote {}", config.display());
            }
        }
    }

    Ok(())
}

fn run_export_command(config: &Config, inputs: Vec<PathBuf>) -> Result<()> {
    if !config.export_dir.exists() {
        fs::create_dir_all(&config.export_dir)
            .with_context(|| format!("create {}", config.export_dir.display()))?;
    }
    if let Some(parent) = config.ledger_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }

    let source = CapturedResponseSource::new(inputs);
    let raws = source
        .fetch()
        .with_context(|| format!("fetch from {}", source.name()))?;
    info!("Loaded {} raw record(s) from {}", raws.len(), source.name());

    let outcome = run_export(config, &raws)?;

    match &outcome.file {
        Some(path) => println!(
            "✓ Exported {} new of {} transactions to {}",
            outcome.new_transactions.len(),
            outcome.fetched,
            path.display()
        ),
        None => println!(
            "✓ No new transactions ({} already exported)",
            outcome.fetched
        ),
    }

    Ok(())
}

fn show_history(config: &Config) -> Result<()> {
    if !config.ledger_path.exists() {
        println!("No ledger at {} yet", config.ledger_path.display());
        return Ok(());
    }

    let ledger = Ledger::open(&config.ledger_path)?;
    let runs = ledger.runs()?;

    println!(
        "{}: {} transaction(s) in {} export run(s)",
        ledger.path().display(),
        ledger.count()?,
        runs.len()
    );
    for run in &runs {
        let file = run
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not written".to_string());

        println!(
            "  {} | {} | {} | {:>4} | {} – {} | {}",
            run.recorded_at.format("%Y-%m-%d %H:%M"),
            run.run_id,
            run.format.name(),
            run.transaction_count,
            run.start_date,
            run.end_date,
            file
        );
    }

    ledger.close()?;
    Ok(())
}
