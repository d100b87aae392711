//! Month labels and irregular month aggregation rules

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical month labels used by the tracking workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Enero,
    Febrero,
    Marzo,
    Abril,
    Mayo,
    Junio,
    Julio,
    Agosto,
    Septiembre,
    Octubre,
    Noviembre,
    Diciembre,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Enero,
        Month::Febrero,
        Month::Marzo,
        Month::Abril,
        Month::Mayo,
        Month::Junio,
        Month::Julio,
        Month::Agosto,
        Month::Septiembre,
        Month::Octubre,
        Month::Noviembre,
        Month::Diciembre,
    ];

    /// Resolve a month label. Matching is exact after trimming.
    pub fn from_name(name: &str) -> Option<Month> {
        let name = name.trim();
        Month::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Month for a calendar number in 1..=12
    pub fn from_number(number: u32) -> Option<Month> {
        Month::ALL.get(number.checked_sub(1)? as usize).copied()
    }

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::Enero => "Enero",
            Month::Febrero => "Febrero",
            Month::Marzo => "Marzo",
            Month::Abril => "Abril",
            Month::Mayo => "Mayo",
            Month::Junio => "Junio",
            Month::Julio => "Julio",
            Month::Agosto => "Agosto",
            Month::Septiembre => "Septiembre",
            Month::Octubre => "Octubre",
            Month::Noviembre => "Noviembre",
            Month::Diciembre => "Diciembre",
        }
    }

    pub fn previous(self) -> Month {
        Month::ALL[(self as usize + 11) % 12]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static CALENDAR: [Month; 12] = Month::ALL;

/// Map a month label to 1..=12; unknown labels give `None`
pub fn month_to_number(name: &str) -> Option<u32> {
    Month::from_name(name).map(Month::number)
}

/// Months whose date-derived aggregate spans more than one calendar month
///
/// Only consulted for rows that carry a date but no explicit month label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthExceptions {
    spans: BTreeMap<Month, Vec<Month>>,
}

impl MonthExceptions {
    pub fn empty() -> Self {
        Self {
            spans: BTreeMap::new(),
        }
    }

    pub fn with_span(mut self, month: Month, includes: Vec<Month>) -> Self {
        self.spans.insert(month, includes);
        self
    }

    /// Calendar months aggregated under a month label
    pub fn calendar_months(&self, month: Month) -> &[Month] {
        match self.spans.get(&month) {
            Some(months) => months,
            None => std::slice::from_ref(&CALENDAR[month as usize]),
        }
    }

    /// Whether a calendar month number falls under a month label
    pub fn includes(&self, month: Month, calendar_month: u32) -> bool {
        self.calendar_months(month)
            .iter()
            .any(|m| m.number() == calendar_month)
    }
}

impl Default for MonthExceptions {
    /// November reports fold October installs into the same period
    fn default() -> Self {
        Self::empty().with_span(Month::Noviembre, vec![Month::Octubre, Month::Noviembre])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_numbers() {
        assert_eq!(month_to_number("Enero"), Some(1));
        assert_eq!(month_to_number(" Septiembre "), Some(9));
        assert_eq!(month_to_number("Diciembre"), Some(12));
        assert_eq!(month_to_number("December"), None);
        assert_eq!(month_to_number("enero"), None);
        for month in Month::ALL {
            assert_eq!(Month::from_number(month.number()), Some(month));
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
        assert_eq!(Month::Enero.previous(), Month::Diciembre);
    }

    #[test]
    fn test_november_spans_october() {
        let exceptions = MonthExceptions::default();
        assert!(exceptions.includes(Month::Noviembre, 10));
        assert!(exceptions.includes(Month::Noviembre, 11));
        assert!(!exceptions.includes(Month::Noviembre, 12));
        // Other months only include themselves
        assert!(exceptions.includes(Month::Octubre, 10));
        assert!(!exceptions.includes(Month::Octubre, 11));
        assert_eq!(exceptions.calendar_months(Month::Marzo), &[Month::Marzo]);
    }
}
