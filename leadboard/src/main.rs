use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use leadcraft_core::calendar::Month;
use leadcraft_core::report::ViewMode;
use leadcraft_core::{Dashboard, DashboardConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod formatter;
mod interactive;

use interactive::Selection;

#[derive(Parser)]
#[command(name = "leadboard")]
#[command(about = "Monthly sales performance dashboard for lead tracking workbooks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the tracking workbook (xlsx, xlsm, xls or ods)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Month to report, by its Spanish name (defaults to the current month)
    #[arg(short, long, value_parser = parse_month)]
    month: Option<Month>,

    /// Restrict the summary to one agent
    #[arg(short, long, value_name = "AGENT")]
    agent: Option<String>,

    /// Which agents the detail table lists
    #[arg(long, value_enum, default_value = "full")]
    view: View,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Keep reading filter commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Log filter, e.g. `debug` or `leadcraft_core=info` (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for further processing
    Json,
    /// Standalone HTML page
    Html,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    /// Every agent
    Full,
    /// Five best attainments
    Top5,
    /// Five worst attainments
    Bottom5,
}

impl From<View> for ViewMode {
    fn from(view: View) -> Self {
        match view {
            View::Full => ViewMode::Full,
            View::Top5 => ViewMode::Top5,
            View::Bottom5 => ViewMode::Bottom5,
        }
    }
}

fn parse_month(name: &str) -> Result<Month, String> {
    Month::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Month::ALL.iter().map(|m| m.name()).collect();
        format!("unknown month '{}' (expected one of {})", name, known.join(", "))
    })
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let config = if let Some(config_path) = path {
        DashboardConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("leadboard.toml");
        if default_config_path.exists() {
            DashboardConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            DashboardConfig::default()
        }
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build and print the report for the current selection
pub(crate) fn render(
    dashboard: &Dashboard,
    file: &Path,
    format: OutputFormat,
    selection: &Selection,
) -> Result<()> {
    let report = dashboard.report(
        file,
        selection.month,
        selection.agent.as_deref(),
        selection.view,
    );
    if report.is_empty() {
        info!("no sheet of {} could be used", file.display());
    }

    let sheets = &dashboard.config().sheets;
    match format {
        OutputFormat::Human => formatter::print_human(file, &report, sheets),
        OutputFormat::Json => formatter::print_json(file, &report)?,
        OutputFormat::Html => formatter::print_html(file, &report, sheets),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = load_config(cli.config.as_deref())?;
    let dashboard = Dashboard::with_config(config);

    let month = cli
        .month
        .or_else(|| Month::from_number(chrono::Local::now().month()))
        .unwrap_or(Month::Enero);
    let selection = Selection {
        month,
        agent: cli.agent,
        view: cli.view.into(),
    };

    if cli.interactive {
        interactive::run(&dashboard, &cli.file, cli.format, selection)
    } else {
        render(&dashboard, &cli.file, cli.format, &selection)
    }
}
