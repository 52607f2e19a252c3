//! Calendar-month periods used for chronological grouping.
//!
//! A [`Period`] carries a display label such as `Jan'23` and a separate
//! sortable key. Labels do not sort chronologically (`Apr'23` < `Jan'23` and
//! `Jan'24` < `Mar'23` as text), so ordering always goes through the key.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label used for rows whose invoice date could not be parsed.
pub const UNPARSED_LABEL: &str = "Unknown";

/// A calendar month, or the sentinel for an unparseable date.
///
/// Ordering is chronological by [`Period::sort_key`], and
/// [`Period::Unparsed`] sorts after every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Month { year: i32, month: u32 },
    Unparsed,
}

impl Period {
    /// Derive the period for an invoice date; `None` propagates the sentinel.
    pub fn from_date(date: Option<NaiveDate>) -> Self {
        match date {
            Some(d) => Period::Month {
                year: d.year(),
                month: d.month(),
            },
            None => Period::Unparsed,
        }
    }

    /// `year * 12 + (month - 1)`, or `None` for the sentinel.
    pub fn sort_key(&self) -> Option<i64> {
        match self {
            Period::Month { year, month } => Some(i64::from(*year) * 12 + i64::from(*month) - 1),
            Period::Unparsed => None,
        }
    }

    /// Display label in `%b'%y` form, e.g. `Jan'23`.
    pub fn label(&self) -> String {
        match self {
            Period::Month { year, month } => {
                let abbr = MONTH_ABBR
                    .get((*month as usize).wrapping_sub(1))
                    .copied()
                    .unwrap_or("???");
                format!("{}'{:02}", abbr, year.rem_euclid(100))
            }
            Period::Unparsed => UNPARSED_LABEL.to_string(),
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Period::Unparsed)
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sort_key(), other.sort_key()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
