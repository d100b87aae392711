//! Excel/ODS sheet loader using calamine

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;
use tracing::{info, warn};

pub mod table;

pub use table::{CellValue, Row, Table, excel_serial_to_datetime};

use crate::error::LoadError;

/// Load one sheet, degrading every failure to `None`
///
/// Callers treat `None` as "no data" and render zero-valued aggregates.
pub fn load_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Option<Table> {
    match try_load_sheet(path.as_ref(), sheet_name) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!(error = %e, "sheet unavailable, continuing without it");
            None
        }
    }
}

/// Load one sheet into a [`Table`]
pub fn try_load_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Table, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }

    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(LoadError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let table = table_from_range(sheet_name, &range)?;
    info!(
        sheet = sheet_name,
        rows = table.len(),
        "loaded sheet from {}",
        path.display()
    );
    Ok(table)
}

/// Convert a calamine range: the first non-empty row becomes the header
fn table_from_range(sheet_name: &str, range: &Range<Data>) -> Result<Table, LoadError> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows = range
        .rows()
        .enumerate()
        .map(|(offset, cells)| (start_row + offset as u32, cells))
        .filter(|(_, cells)| cells.iter().any(|c| !matches!(c, Data::Empty)));

    let Some((header_row, header_cells)) = rows.next() else {
        return Err(LoadError::NoHeader(sheet_name.to_string()));
    };

    let mut table = Table::new(
        sheet_name,
        header_cells
            .iter()
            .map(|c| convert_cell(c).to_text().trim().to_string())
            .collect(),
    );
    table.header_row = header_row;
    table.first_col = start_col;

    for (index, cells) in rows {
        table.rows.push(Row {
            index,
            cells: cells.iter().map(convert_cell).collect(),
        });
    }

    Ok(table)
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_degrades_to_none() {
        assert!(load_sheet("does/not/exist.xlsx", "MANTRA").is_none());
        assert!(matches!(
            try_load_sheet("does/not/exist.xlsx", "MANTRA"),
            Err(LoadError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_header_is_first_non_empty_row() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((1, 0), Data::String("Mes".into()));
        range.set_value((1, 1), Data::String(" Agente ".into()));
        range.set_value((2, 0), Data::String("Enero".into()));
        range.set_value((2, 1), Data::String("ZIM_A_VTP".into()));
        range.set_value((3, 0), Data::Float(45.0));

        let table = table_from_range("MANTRA", &range).unwrap();
        assert_eq!(table.headers, vec!["Mes", "Agente"]);
        assert_eq!(table.header_row, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].index, 2);
        assert_eq!(table.rows[1].get(0), &CellValue::Number(45.0));
    }

    #[test]
    fn test_empty_range_has_no_header() {
        let range: Range<Data> = Range::new((0, 0), (1, 1));
        assert!(matches!(
            table_from_range("DRIVE", &range),
            Err(LoadError::NoHeader(_))
        ));
    }
}
