//! Whitespace normalization of categorical columns

use crate::reader::{CellValue, Table};

/// Convert every value of the named columns to trimmed text
///
/// Columns that do not exist in the table are skipped. Empty cells become
/// empty text so that a normalized column only holds `Text` values.
pub fn normalize(table: &Table, columns: &[&str]) -> Table {
    let mut normalized = table.clone();
    normalize_in_place(&mut normalized, columns);
    normalized
}

pub fn normalize_in_place(table: &mut Table, columns: &[&str]) {
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    for row in &mut table.rows {
        for &col in &indices {
            if col >= row.cells.len() {
                row.cells.resize(col + 1, CellValue::Empty);
            }
            let text = row.cells[col].to_text().trim().to_string();
            row.cells[col] = CellValue::Text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Row;

    fn padded_table() -> Table {
        let mut table = Table::from_text_rows(
            "MANTRA",
            &["Mes", "Agente", "NIVEL 2"],
            &[
                &["Enero", "  ZIM_ANA_VTP ", " Con Cobertura  "],
                &["Enero", "ZIM_LUIS_VTP", ""],
            ],
        );
        table.rows.push(Row {
            index: 3,
            cells: vec![CellValue::Text("Enero".into()), CellValue::Number(7.0)],
        });
        table
    }

    #[test]
    fn test_trims_named_columns_only() {
        let table = padded_table();
        let out = normalize(&table, &["Agente", "NIVEL 2", "Missing"]);

        assert_eq!(out.value(0, 1), &CellValue::Text("ZIM_ANA_VTP".into()));
        assert_eq!(out.value(0, 2), &CellValue::Text("Con Cobertura".into()));
        assert_eq!(out.value(1, 2), &CellValue::Text(String::new()));
        // Numbers become their text form, short rows are padded
        assert_eq!(out.value(2, 1), &CellValue::Text("7".into()));
        assert_eq!(out.value(2, 2), &CellValue::Text(String::new()));
        // Input is untouched
        assert_eq!(table.value(0, 1), &CellValue::Text("  ZIM_ANA_VTP ".into()));
    }

    #[test]
    fn test_idempotent() {
        let table = padded_table();
        let columns = ["Agente", "NIVEL 2"];
        let once = normalize(&table, &columns);
        let twice = normalize(&once, &columns);
        assert_eq!(once, twice);
    }
}
