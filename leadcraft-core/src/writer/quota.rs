//! Operator-driven quota edits on the LISTA sheet

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

use super::backup::create_backup;
use super::xlsx_cells::{cell_reference, write_numeric_cells};
use crate::agents::AliasTable;
use crate::calendar::Month;
use crate::config::DashboardConfig;
use crate::error::WriteError;
use crate::model::quotas_from_table;
use crate::reader::{CellValue, Table, try_load_sheet};

/// Set the quota of some agents for one month
#[derive(Debug, Clone)]
pub struct QuotaPatch {
    pub month: Month,
    pub agents: Vec<String>,
    /// Only rows currently holding this value are touched
    pub from: Option<i64>,
    pub to: i64,
}

/// One quota cell selected by a patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedCell {
    pub agent: String,
    pub month: Month,
    pub reference: String,
    pub previous: i64,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaPatchOutcome {
    pub backup: PathBuf,
    pub cells: Vec<PatchedCell>,
}

/// Reject workbook formats the cell writer cannot rewrite
pub fn ensure_writable(path: &Path) -> Result<(), WriteError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(()),
        _ => Err(WriteError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Cells a patch would change, without touching the file
pub fn plan_quota_patch(path: &Path, patch: &QuotaPatch, config: &DashboardConfig) -> Result<Vec<PatchedCell>> {
    let sheet = &config.sheets.quotas;
    let table = try_load_sheet(path, sheet)
        .with_context(|| format!("Failed to read quotas from {}", path.display()))?;
    let cells = select_cells(&table, patch, config)?;
    if cells.is_empty() {
        return Err(WriteError::NoMatchingRows {
            sheet: sheet.clone(),
            month: patch.month.to_string(),
        }
        .into());
    }
    Ok(cells)
}

/// Back up the workbook, rewrite the matching quota cells and read them back
pub fn apply_quota_patch(path: &Path, patch: &QuotaPatch, config: &DashboardConfig) -> Result<QuotaPatchOutcome> {
    ensure_writable(path)?;
    let cells = plan_quota_patch(path, patch, config)?;

    let backup = create_backup(path)?;

    let values: BTreeMap<String, i64> = cells
        .iter()
        .map(|c| (c.reference.clone(), c.value))
        .collect();
    write_numeric_cells(path, &config.sheets.quotas, &values).with_context(|| {
        format!(
            "Failed to write quotas; the original is kept at {}",
            backup.display()
        )
    })?;

    verify(path, &values, config).with_context(|| {
        format!(
            "Quota check failed after writing; restore from {}",
            backup.display()
        )
    })?;

    info!(
        cells = cells.len(),
        month = %patch.month,
        value = patch.to,
        "quotas updated in {}",
        path.display()
    );
    Ok(QuotaPatchOutcome { backup, cells })
}

fn select_cells(table: &Table, patch: &QuotaPatch, config: &DashboardConfig) -> Result<Vec<PatchedCell>> {
    let aliases = AliasTable::new(&config.agents.suffix).with_aliases(&config.agents.aliases);
    let wanted: BTreeSet<String> = patch
        .agents
        .iter()
        .flat_map(|a| aliases.variants(a))
        .collect();

    Ok(quotas_from_table(table, &config.columns.quotas)?
        .into_iter()
        .filter(|q| q.month == Some(patch.month))
        .filter(|q| wanted.contains(&q.agent))
        .filter(|q| patch.from.is_none_or(|from| q.quota == from))
        .map(|q| PatchedCell {
            reference: cell_reference(q.cell.0, q.cell.1),
            agent: q.agent,
            month: patch.month,
            previous: q.quota,
            value: patch.to,
        })
        .collect())
}

/// Every written cell must read back as the exact integer
fn verify(path: &Path, values: &BTreeMap<String, i64>, config: &DashboardConfig) -> Result<()> {
    let table = try_load_sheet(path, &config.sheets.quotas)?;
    let quota_col = table
        .column_index(&config.columns.quotas.quota)
        .ok_or_else(|| anyhow::anyhow!("quota column disappeared after writing"))?;
    let absolute_col = table.first_col + quota_col as u32;

    for (reference, expected) in values {
        let found = table
            .rows
            .iter()
            .find(|row| cell_reference(row.index, absolute_col) == *reference)
            .and_then(|row| exact_integer(row.get(quota_col)));
        if found != Some(*expected) {
            return Err(WriteError::VerificationFailed {
                cell: reference.clone(),
                expected: *expected,
                found,
            }
            .into());
        }
    }
    Ok(())
}

fn exact_integer(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        _ => None,
    }
}
