//! In-memory sheet structures

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Represents a loaded worksheet: one header row followed by data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Absolute 0-based column of the first header cell
    pub first_col: u32,
    /// Absolute 0-based row of the header
    pub header_row: u32,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            ..Default::default()
        }
    }

    /// Build a table from literal text cells, mainly for tests and fixtures
    pub fn from_text_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Table::new(name, headers.iter().map(|h| h.to_string()).collect());
        for (i, row) in rows.iter().enumerate() {
            table.rows.push(Row {
                index: i as u32 + 1,
                cells: row
                    .iter()
                    .map(|v| {
                        if v.is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(v.to_string())
                        }
                    })
                    .collect(),
            });
        }
        table
    }

    /// Index of a column by header name. Header padding is ignored.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers.iter().position(|h| h.trim() == wanted)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value at a data row and column, `Empty` when the row is short
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(col))
            .unwrap_or(&CellValue::Empty)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A data row with its absolute position in the sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Absolute 0-based sheet row
    pub index: u32,
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn get(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&CellValue::Empty)
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Borrow the text if this is a text cell
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form of the value, as it would be compared against a label
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::DateTime(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Error(e) => e.clone(),
        }
    }

    /// Integer view of a numeric or numeric-looking text cell
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            CellValue::Number(n) => Some(n.round() as i64),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
            }
            _ => None,
        }
    }

    /// Calendar date of a date cell, a serial number or a date-like text
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
            CellValue::Text(s) => parse_date_text(s.trim()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Convert an Excel serial day number (1900 date system) to a timestamp
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let days = serial.trunc() as i64;
    let secs = (serial.fract() * 86_400.0).round() as i64;
    epoch
        .checked_add_signed(chrono::Duration::days(days))?
        .checked_add_signed(chrono::Duration::seconds(secs))
}

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    // Drop a trailing time part ("2025-11-03 00:00:00", "2025-11-03T08:30:00")
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_dates() {
        let dt = excel_serial_to_datetime(45139.0).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());

        let dt = excel_serial_to_datetime(45139.5).unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "12:00");

        assert!(excel_serial_to_datetime(-1.0).is_none());
    }

    #[test]
    fn test_text_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 3);
        assert_eq!(CellValue::Text("03/11/2025".into()).as_date(), expected);
        assert_eq!(CellValue::Text("2025-11-03".into()).as_date(), expected);
        assert_eq!(
            CellValue::Text("2025-11-03 00:00:00".into()).as_date(),
            expected
        );
        assert_eq!(CellValue::Text("not a date".into()).as_date(), None);
    }

    #[test]
    fn test_text_form() {
        assert_eq!(CellValue::Number(45.0).to_text(), "45");
        assert_eq!(CellValue::Number(4.5).to_text(), "4.5");
        assert_eq!(CellValue::Empty.to_text(), "");
        assert_eq!(CellValue::Number(55.0).as_i64(), Some(55));
        assert_eq!(CellValue::Text(" 30 ".into()).as_i64(), Some(30));
    }

    #[test]
    fn test_column_lookup_ignores_header_padding() {
        let table = Table::from_text_rows("MANTRA", &["Mes", " NIVEL 2 "], &[&["Enero", "x"]]);
        assert_eq!(table.column_index("NIVEL 2"), Some(1));
        assert_eq!(table.value(0, 1), &CellValue::Text("x".into()));
        assert_eq!(table.value(5, 1), &CellValue::Empty);
    }
}
