use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use leadcraft_core::calendar::Month;
use leadcraft_core::model::quotas_from_table;
use leadcraft_core::reader::try_load_sheet;
use leadcraft_core::writer::{self, QuotaPatch};
use leadcraft_core::DashboardConfig;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leadcli")]
#[command(about = "Maintenance tools for lead tracking workbooks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the tracking workbook
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Overwrite quota cells for some agents in one month
    SetQuota {
        /// Month whose quota rows are edited
        #[arg(short, long, value_parser = parse_month)]
        month: Month,

        /// Agents to edit; spelling variants and configured aliases of each also match
        #[arg(short, long, num_args = 1.., required = true, value_name = "AGENT")]
        agent: Vec<String>,

        /// New quota value
        #[arg(long, value_name = "VALUE")]
        to: i64,

        /// Only touch rows currently holding this value
        #[arg(long, value_name = "VALUE")]
        from: Option<i64>,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },
    /// Put a backup back in place of the workbook
    Restore {
        /// Backup to restore (defaults to the newest one)
        #[arg(long, value_name = "BACKUP")]
        backup: Option<PathBuf>,
    },
    /// List the quota sheet
    Quotas {
        /// Only list one month
        #[arg(short, long, value_parser = parse_month)]
        month: Option<Month>,
    },
}

fn parse_month(name: &str) -> Result<Month, String> {
    Month::from_name(name).ok_or_else(|| format!("unknown month '{}'", name))
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
    let config = match path {
        Some(path) => {
            debug!("loading config from {}", path.display());
            DashboardConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let default_config_path = PathBuf::from("leadboard.toml");
            if default_config_path.exists() {
                debug!("loading config from {}", default_config_path.display());
                DashboardConfig::from_file(&default_config_path).with_context(|| {
                    format!("Failed to load config from {}", default_config_path.display())
                })?
            } else {
                debug!("no config file, using defaults");
                DashboardConfig::default()
            }
        }
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::SetQuota {
            month,
            agent,
            to,
            from,
            dry_run,
        } => {
            let patch = QuotaPatch {
                month,
                agents: agent,
                from,
                to,
            };
            if dry_run {
                writer::ensure_writable(&cli.file)?;
                let cells = writer::plan_quota_patch(&cli.file, &patch, &config)?;
                println!("[DRY RUN] Quota changes on '{}':", cli.file.display());
                for cell in &cells {
                    println!(
                        "  {} {} {}: {} -> {}",
                        cell.reference, cell.agent, cell.month, cell.previous, cell.value
                    );
                }
            } else {
                println!("Modifying '{}'...", cli.file.display());
                let outcome = writer::apply_quota_patch(&cli.file, &patch, &config)
                    .with_context(|| "Failed to update quotas")?;
                for cell in &outcome.cells {
                    println!(
                        "  {} {} {}: {} -> {}",
                        cell.reference, cell.agent, cell.month, cell.previous, cell.value
                    );
                }
                println!("✓ Updated {} quota cell(s)", outcome.cells.len());
                println!("Backup: {}", outcome.backup.display());
            }
        }
        Command::Restore { backup } => {
            let restored = writer::restore_backup(&cli.file, backup.as_deref())?;
            println!("✓ Restored '{}' from {}", cli.file.display(), restored.display());
        }
        Command::Quotas { month } => {
            let table = try_load_sheet(&cli.file, &config.sheets.quotas)
                .with_context(|| format!("Failed to read {}", cli.file.display()))?;
            let records = quotas_from_table(&table, &config.columns.quotas)?;
            for record in records
                .iter()
                .filter(|r| month.is_none() || r.month == month)
            {
                let month = record.month.map(|m| m.name()).unwrap_or("-");
                println!("{:<12} {:<24} {:>6}", month, record.agent, record.quota);
            }
        }
    }

    Ok(())
}
