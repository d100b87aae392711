//! Typed records extracted from the normalized sheets

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::Month;
use crate::config::{DriveColumns, LeadColumns, QuotaColumns};
use crate::error::SchemaError;
use crate::normalize::normalize;
use crate::reader::Table;

/// Installation outcome of a DRIVE transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum InstallStatus {
    Installed,
    Pending,
    Cancelled,
    Unrecognized(String),
}

impl InstallStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "INSTALADO" => InstallStatus::Installed,
            "PENDIENTE" => InstallStatus::Pending,
            "CANCELADO" => InstallStatus::Cancelled,
            other => InstallStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            InstallStatus::Installed => "INSTALADO",
            InstallStatus::Pending => "PENDIENTE",
            InstallStatus::Cancelled => "CANCELADO",
            InstallStatus::Unrecognized(raw) => raw,
        }
    }
}

/// Funnel stage labels found in the NIVEL columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FunnelLabel {
    NoResponse,
    WithCoverage,
    WithoutCoverage,
    Unspecified,
    ContractOk,
    Other(String),
}

impl FunnelLabel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "No Responde" => FunnelLabel::NoResponse,
            "Con Cobertura" => FunnelLabel::WithCoverage,
            "Sin Cobertura" => FunnelLabel::WithoutCoverage,
            "No Especifica" => FunnelLabel::Unspecified,
            "Contrato OK" => FunnelLabel::ContractOk,
            other => FunnelLabel::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FunnelLabel::NoResponse => "No Responde",
            FunnelLabel::WithCoverage => "Con Cobertura",
            FunnelLabel::WithoutCoverage => "Sin Cobertura",
            FunnelLabel::Unspecified => "No Especifica",
            FunnelLabel::ContractOk => "Contrato OK",
            FunnelLabel::Other(raw) => raw,
        }
    }
}

/// Cancellation reason that counts as a non-payment
pub const NO_PAY_REASON: &str = "NO PAGO";

/// One lead event from the MANTRA sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRecord {
    pub month: Option<Month>,
    pub agent: String,
    pub tier1: FunnelLabel,
    pub tier2: FunnelLabel,
    pub tier3: FunnelLabel,
}

impl LeadRecord {
    pub fn has_coverage(&self) -> bool {
        self.tier2 == FunnelLabel::WithCoverage
    }

    pub fn has_contract(&self) -> bool {
        self.has_coverage() && self.tier3 == FunnelLabel::ContractOk
    }
}

/// One installation/order transaction from the DRIVE sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveRecord {
    pub date: Option<NaiveDate>,
    /// Explicit month label; `None` when the sheet has no month column or the cell is blank
    pub month: Option<Month>,
    pub agent: String,
    pub status: InstallStatus,
    pub cancel_reason: String,
}

impl DriveRecord {
    pub fn is_no_pay(&self) -> bool {
        self.cancel_reason == NO_PAY_REASON
    }

    /// Calendar month of the transaction date
    pub fn calendar_month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }
}

/// Install target for one agent in one month (LISTA sheet)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaRecord {
    pub agent: String,
    pub month: Option<Month>,
    pub quota: i64,
    /// Absolute sheet position of the quota cell (row, col)
    #[serde(skip)]
    pub cell: (u32, u32),
}

fn require(table: &Table, column: &str) -> Result<usize, SchemaError> {
    table
        .column_index(column)
        .ok_or_else(|| SchemaError::MissingColumn {
            sheet: table.name.clone(),
            column: column.to_string(),
        })
}

/// Extract lead records; every categorical column is normalized first
pub fn leads_from_table(table: &Table, cols: &LeadColumns) -> Result<Vec<LeadRecord>, SchemaError> {
    let month = require(table, &cols.month)?;
    let agent = require(table, &cols.agent)?;
    let tier2 = require(table, &cols.tier2)?;
    // NIVEL 1 and NIVEL 3 only feed secondary metrics
    let tier1 = table.column_index(&cols.tier1);
    let tier3 = table.column_index(&cols.tier3);

    let table = normalize(
        table,
        &[
            cols.month.as_str(),
            cols.agent.as_str(),
            cols.tier1.as_str(),
            cols.tier2.as_str(),
            cols.tier3.as_str(),
        ],
    );
    let text = |row: usize, col: Option<usize>| -> String {
        col.map(|c| table.value(row, c).to_text()).unwrap_or_default()
    };

    Ok((0..table.len())
        .map(|row| LeadRecord {
            month: Month::from_name(&text(row, Some(month))),
            agent: text(row, Some(agent)),
            tier1: FunnelLabel::parse(&text(row, tier1)),
            tier2: FunnelLabel::parse(&text(row, Some(tier2))),
            tier3: FunnelLabel::parse(&text(row, tier3)),
        })
        .collect())
}

/// Extract DRIVE records; the month column is optional, the date is not
/// required either but rows without both never match a month
pub fn drive_from_table(table: &Table, cols: &DriveColumns) -> Result<Vec<DriveRecord>, SchemaError> {
    let agent = require(table, &cols.agent)?;
    let status = require(table, &cols.status)?;
    let month = table.column_index(&cols.month);
    let date = table.column_index(&cols.date);
    let reason = table.column_index(&cols.cancel_reason);

    let table = normalize(
        table,
        &[
            cols.month.as_str(),
            cols.agent.as_str(),
            cols.status.as_str(),
            cols.cancel_reason.as_str(),
        ],
    );

    Ok((0..table.len())
        .map(|row| DriveRecord {
            date: date.and_then(|c| table.value(row, c).as_date()),
            month: month.and_then(|c| Month::from_name(&table.value(row, c).to_text())),
            agent: table.value(row, agent).to_text(),
            status: InstallStatus::parse(&table.value(row, status).to_text()),
            cancel_reason: reason
                .map(|c| table.value(row, c).to_text())
                .unwrap_or_default(),
        })
        .collect())
}

/// Extract quota records; rows with a non-numeric quota are skipped
pub fn quotas_from_table(table: &Table, cols: &QuotaColumns) -> Result<Vec<QuotaRecord>, SchemaError> {
    let agent = require(table, &cols.agent)?;
    let month = require(table, &cols.month)?;
    let quota = require(table, &cols.quota)?;

    let normalized = normalize(table, &[cols.agent.as_str(), cols.month.as_str()]);

    Ok(normalized
        .rows
        .iter()
        .filter_map(|row| {
            let value = row.get(quota).as_i64()?;
            Some(QuotaRecord {
                agent: row.get(agent).to_text(),
                month: Month::from_name(&row.get(month).to_text()),
                quota: value,
                cell: (row.index, table.first_col + quota as u32),
            })
        })
        .collect())
}
