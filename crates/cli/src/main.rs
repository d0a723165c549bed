use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradingagents_core::domain::display::{format_target_price, listing_label};
use tradingagents_core::storage::reports::FsReportStore;
use tradingagents_core::storage::ReportRepository;

#[derive(Debug, Parser)]
#[command(name = "tradingagents_cli")]
struct Args {
    /// Reports root directory. Defaults to REPORTS_DIR.
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stocks that have stored reports, most reports first.
    Stocks,

    /// List the reports of one stock, newest first.
    Reports { symbol: String },

    /// Print a stored report.
    Show {
        path: PathBuf,

        /// Print the human-readable text report instead of JSON.
        #[arg(long)]
        text: bool,
    },

    /// Delete a report and its text companion.
    Delete { path: PathBuf },

    /// Store an analysis result read from a JSON file ("-" for stdin).
    Save {
        symbol: String,

        #[arg(long)]
        analysis_date: String,

        #[arg(long)]
        results: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradingagents_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let reports_dir = args.reports_dir.unwrap_or(settings.reports_dir);
    let store = FsReportStore::new(&reports_dir)
        .with_context(|| format!("invalid reports dir {}", reports_dir.display()))?;

    if let Err(err) = run(&store, args.command) {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

fn run(store: &dyn ReportRepository, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Stocks => {
            let stocks = store.list_stocks()?;
            if stocks.is_empty() {
                println!("No analysis history yet.");
            }
            for stock in stocks {
                println!("{} ({} reports)", stock.symbol, stock.report_count);
            }
        }
        Command::Reports { symbol } => {
            let reports = store.list_reports(&symbol)?;
            tracing::debug!(%symbol, reports = reports.len(), "listing reports");
            if reports.is_empty() {
                println!("No reports for {}.", symbol.trim().to_uppercase());
            }
            for report in reports {
                println!(
                    "{} | Target: {}",
                    listing_label(&report),
                    format_target_price(&report.metadata.stock_symbol, &report.summary.target_price)
                );
                println!("    {}", report.filepath.display());
            }
        }
        Command::Show { path, text } => {
            if text {
                print!("{}", store.load_text(&path)?);
            } else {
                let report = store.load(&path)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Delete { path } => {
            store.delete(&path)?;
            tracing::info!(path = %path.display(), "report deleted from cli");
            println!("Deleted {}", path.display());
        }
        Command::Save {
            symbol,
            analysis_date,
            results: results_path,
        } => {
            let raw = read_input(&results_path)?;
            let results: serde_json::Value = serde_json::from_str(&raw).with_context(|| {
                format!("results are not valid JSON: {}", results_path.display())
            })?;
            let path = store.save(&symbol, &analysis_date, &results)?;
            tracing::info!(%symbol, %analysis_date, path = %path.display(), "report saved from cli");
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read results from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_sentry(settings: &tradingagents_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
