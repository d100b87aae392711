//! Typed view of one workbook, ready for aggregation

use serde::Serialize;
use tracing::warn;

use crate::agents::AliasTable;
use crate::calendar::MonthExceptions;
use crate::config::DashboardConfig;
use crate::error::SchemaError;
use crate::model::{
    drive_from_table, leads_from_table, quotas_from_table, DriveRecord, LeadRecord, QuotaRecord,
};
use crate::reader::Table;

/// Whether a sheet contributed rows to the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "column", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded,
    /// File or sheet could not be read
    Unavailable,
    /// The sheet is present but a required header is not
    MissingColumn(String),
}

impl SourceStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceStatus::Loaded)
    }
}

/// Per-sheet load state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStatus {
    pub leads: SourceStatus,
    pub drive: SourceStatus,
    pub quotas: SourceStatus,
}

impl DatasetStatus {
    pub fn all_loaded(&self) -> bool {
        self.leads.is_loaded() && self.drive.is_loaded() && self.quotas.is_loaded()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub leads: Vec<LeadRecord>,
    pub drive: Vec<DriveRecord>,
    pub quotas: Vec<QuotaRecord>,
    pub aliases: AliasTable,
    pub exceptions: MonthExceptions,
    pub status: DatasetStatus,
}

impl Dataset {
    /// Build a dataset from loaded sheets; missing sheets or columns yield empty record sets
    pub fn from_tables(
        leads: Option<&Table>,
        drive: Option<&Table>,
        quotas: Option<&Table>,
        config: &DashboardConfig,
    ) -> Self {
        let columns = &config.columns;
        let (leads, leads_status) = extract(leads, |t| leads_from_table(t, &columns.leads));
        let (drive, drive_status) = extract(drive, |t| drive_from_table(t, &columns.drive));
        let (quotas, quotas_status) = extract(quotas, |t| quotas_from_table(t, &columns.quotas));

        let aliases = AliasTable::new(&config.agents.suffix).with_aliases(&config.agents.aliases);

        let mut dataset = Self {
            leads,
            drive,
            quotas,
            aliases,
            exceptions: config.month_exceptions(),
            status: DatasetStatus {
                leads: leads_status,
                drive: drive_status,
                quotas: quotas_status,
            },
        };
        dataset.index_agents();
        dataset
    }

    /// Build a dataset from records already in memory, with default rules
    pub fn from_records(
        leads: Vec<LeadRecord>,
        drive: Vec<DriveRecord>,
        quotas: Vec<QuotaRecord>,
    ) -> Self {
        let mut dataset = Self {
            leads,
            drive,
            quotas,
            aliases: AliasTable::default(),
            exceptions: MonthExceptions::default(),
            status: DatasetStatus {
                leads: SourceStatus::Loaded,
                drive: SourceStatus::Loaded,
                quotas: SourceStatus::Loaded,
            },
        };
        dataset.index_agents();
        dataset
    }

    pub fn with_exceptions(mut self, exceptions: MonthExceptions) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Canonical agent names seen in any sheet
    pub fn agents(&self) -> Vec<String> {
        self.aliases.canonical_names()
    }

    fn index_agents(&mut self) {
        let Self {
            leads,
            drive,
            quotas,
            aliases,
            ..
        } = self;
        aliases.extend(leads.iter().map(|r| r.agent.as_str()));
        aliases.extend(drive.iter().map(|r| r.agent.as_str()));
        aliases.extend(quotas.iter().map(|r| r.agent.as_str()));
    }
}

fn extract<T, F>(table: Option<&Table>, records: F) -> (Vec<T>, SourceStatus)
where
    F: FnOnce(&Table) -> Result<Vec<T>, SchemaError>,
{
    let Some(table) = table else {
        return (Vec::new(), SourceStatus::Unavailable);
    };
    match records(table) {
        Ok(records) => (records, SourceStatus::Loaded),
        Err(err) => {
            warn!("{err}");
            let SchemaError::MissingColumn { column, .. } = err;
            (Vec::new(), SourceStatus::MissingColumn(column))
        }
    }
}
