//! leadcraft-core: KPI aggregation over sales lead tracking workbooks
//!
//! A workbook carries three sheets: leads with their funnel stages, the
//! install/order log, and the per-agent monthly quotas. This crate loads
//! them (through a time-bounded cache), normalizes the categorical columns
//! and computes the monthly counts and ratios the dashboard shows.

pub mod agents;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod reader;
pub mod report;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

pub use agents::{AliasTable, agent_name_variants};
pub use cache::SheetCache;
pub use calendar::{Month, MonthExceptions, month_to_number};
pub use config::DashboardConfig;
pub use dataset::{Dataset, SourceStatus};
pub use metrics::Metrics;
pub use reader::{Table, load_sheet};
pub use report::{DashboardReport, ViewMode};

/// Main dashboard interface
pub struct Dashboard {
    config: DashboardConfig,
    cache: SheetCache,
}

impl Dashboard {
    /// Create a dashboard with default configuration
    pub fn new() -> Self {
        Self::with_config(DashboardConfig::default())
    }

    /// Create a dashboard with custom configuration
    pub fn with_config(config: DashboardConfig) -> Self {
        let cache = SheetCache::from_config(&config.cache);
        Self::with_cache(config, cache)
    }

    /// Create a dashboard around an existing cache
    pub fn with_cache(config: DashboardConfig, cache: SheetCache) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &SheetCache {
        &self.cache
    }

    /// Load the three sheets of `path`; unreadable sheets leave their records empty
    pub fn dataset<P: AsRef<Path>>(&self, path: P) -> Dataset {
        let path = path.as_ref();
        let sheets = &self.config.sheets;
        let leads = self.sheet(path, &sheets.leads);
        let drive = self.sheet(path, &sheets.drive);
        let quotas = self.sheet(path, &sheets.quotas);

        Dataset::from_tables(
            leads.as_deref(),
            drive.as_deref(),
            quotas.as_deref(),
            &self.config,
        )
    }

    /// Build the full report for one month, optionally for one agent
    pub fn report<P: AsRef<Path>>(
        &self,
        path: P,
        month: Month,
        agent: Option<&str>,
        view: ViewMode,
    ) -> DashboardReport {
        let dataset = self.dataset(path);
        report::build_report(
            &dataset,
            month,
            agent,
            view,
            &self.config.report_months(),
            &self.config.report,
        )
    }

    /// Forget every cached sheet
    pub fn reload(&self) {
        self.cache.clear();
    }

    fn sheet(&self, path: &Path, sheet: &str) -> Option<Arc<Table>> {
        self.cache.get_or_load(path, sheet, |p, s| load_sheet(p, s))
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
