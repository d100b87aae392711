//! Configuration system for the dashboard

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::agents::AGENT_SUFFIX;
use crate::calendar::{Month, MonthExceptions};

/// Main dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub sheets: SheetNames,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    #[serde(default)]
    pub months: MonthConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject month names and thresholds that cannot be honored
    pub fn validate(&self) -> Result<()> {
        for (month, includes) in &self.months.exceptions {
            if Month::from_name(month).is_none() {
                anyhow::bail!("Configuration error: unknown month '{}' in months.exceptions", month);
            }
            for included in includes {
                if Month::from_name(included).is_none() {
                    anyhow::bail!(
                        "Configuration error: unknown month '{}' in months.exceptions.{}",
                        included,
                        month
                    );
                }
            }
        }

        for month in &self.report.months {
            if Month::from_name(month).is_none() {
                anyhow::bail!("Configuration error: unknown month '{}' in report.months", month);
            }
        }

        if self.report.good_threshold > self.report.excellent_threshold {
            anyhow::bail!(
                "Configuration error: report.good_threshold ({}) is above report.excellent_threshold ({})",
                self.report.good_threshold,
                self.report.excellent_threshold
            );
        }

        if self.agents.suffix.is_empty() {
            anyhow::bail!("Configuration error: agents.suffix must not be empty");
        }

        Ok(())
    }

    /// Exception table built from `[months.exceptions]`; unknown names are skipped
    pub fn month_exceptions(&self) -> MonthExceptions {
        self.months
            .exceptions
            .iter()
            .filter_map(|(month, includes)| {
                let month = Month::from_name(month)?;
                let includes: Vec<Month> =
                    includes.iter().filter_map(|m| Month::from_name(m)).collect();
                Some((month, includes))
            })
            .fold(MonthExceptions::empty(), |acc, (month, includes)| {
                acc.with_span(month, includes)
            })
    }

    /// Months listed in the month-over-month summary
    pub fn report_months(&self) -> Vec<Month> {
        self.report
            .months
            .iter()
            .filter_map(|m| Month::from_name(m))
            .collect()
    }
}

/// Names of the three source sheets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetNames {
    #[serde(default = "default_leads_sheet")]
    pub leads: String,
    #[serde(default = "default_drive_sheet")]
    pub drive: String,
    #[serde(default = "default_quotas_sheet")]
    pub quotas: String,
}

fn default_leads_sheet() -> String {
    "MANTRA".to_string()
}

fn default_drive_sheet() -> String {
    "DRIVE".to_string()
}

fn default_quotas_sheet() -> String {
    "LISTA".to_string()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            leads: default_leads_sheet(),
            drive: default_drive_sheet(),
            quotas: default_quotas_sheet(),
        }
    }
}

/// Header names per sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub leads: LeadColumns,
    #[serde(default)]
    pub drive: DriveColumns,
    #[serde(default)]
    pub quotas: QuotaColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadColumns {
    pub month: String,
    pub agent: String,
    pub tier1: String,
    pub tier2: String,
    pub tier3: String,
}

impl Default for LeadColumns {
    fn default() -> Self {
        Self {
            month: "Mes".into(),
            agent: "Agente".into(),
            tier1: "NIVEL 1".into(),
            tier2: "NIVEL 2".into(),
            tier3: "NIVEL 3".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveColumns {
    pub date: String,
    pub month: String,
    pub agent: String,
    pub status: String,
    pub cancel_reason: String,
}

impl Default for DriveColumns {
    fn default() -> Self {
        Self {
            date: "FECHA".into(),
            month: "MES".into(),
            agent: "ASESOR".into(),
            status: "ESTADO".into(),
            cancel_reason: "MOTIVO".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaColumns {
    pub agent: String,
    pub month: String,
    pub quota: String,
}

impl Default for QuotaColumns {
    fn default() -> Self {
        Self {
            agent: "Asesor".into(),
            month: "Mes".into(),
            quota: "Meta".into(),
        }
    }
}

/// Read-through cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Per-sheet overrides; 0 bypasses the cache for that sheet
    #[serde(default = "default_sheet_ttl_secs")]
    pub sheet_ttl_secs: HashMap<String, u64>,
}

fn default_ttl_secs() -> u64 {
    3600
}

/// The install log is edited while the dashboard is open, so it is never cached
fn default_sheet_ttl_secs() -> HashMap<String, u64> {
    HashMap::from([(default_drive_sheet(), 0)])
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sheet_ttls(&self) -> HashMap<String, Duration> {
        self.sheet_ttl_secs
            .iter()
            .map(|(sheet, secs)| (sheet.clone(), Duration::from_secs(*secs)))
            .collect()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sheet_ttl_secs: default_sheet_ttl_secs(),
        }
    }
}

/// Agent identifier conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Explicit `alias = "canonical"` pairs
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_suffix() -> String {
    AGENT_SUFFIX.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthConfig {
    /// Month label -> calendar months it aggregates (date-derived rows only)
    #[serde(default = "default_exceptions")]
    pub exceptions: BTreeMap<String, Vec<String>>,
}

fn default_exceptions() -> BTreeMap<String, Vec<String>> {
    let mut exceptions = BTreeMap::new();
    exceptions.insert(
        "Noviembre".to_string(),
        vec!["Octubre".to_string(), "Noviembre".to_string()],
    );
    exceptions
}

impl Default for MonthConfig {
    fn default() -> Self {
        Self {
            exceptions: default_exceptions(),
        }
    }
}

/// Presentation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Agents with a quota at or above this value form the first cohort
    pub cohort_quota_threshold: i64,
    /// Attainment at or above this value is "excellent"
    pub excellent_threshold: u32,
    /// Attainment at or above this value is "good"
    pub good_threshold: u32,
    /// Months shown in the month-over-month summary, in order
    pub months: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cohort_quota_threshold: 50,
            excellent_threshold: 70,
            good_threshold: 40,
            months: vec![
                "Noviembre".to_string(),
                "Diciembre".to_string(),
                "Enero".to_string(),
            ],
        }
    }
}
