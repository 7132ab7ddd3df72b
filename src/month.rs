//! Month-label parsing.
//!
//! Steamcharts history tables label rows either with a month and year
//! ("July 2025") or with the rolling "Last 30 Days" marker. The cleaner and the
//! plotter need a strict calendar parse so the rolling row sorts as unknown;
//! the SQLite loader instead maps the rolling row onto the current month.

use chrono::{Datelike, Utc};

const MONTH_NAMES: [(&str, u32); 12] = [
    ("January", 1),
    ("February", 2),
    ("March", 3),
    ("April", 4),
    ("May", 5),
    ("June", 6),
    ("July", 7),
    ("August", 8),
    ("September", 9),
    ("October", 10),
    ("November", 11),
    ("December", 12),
];

/// Strict parse of a `"<MonthName> <Year>"` label into `(year, month_number)`.
///
/// Returns `None` for the rolling "Last 30 Days" marker and anything else that
/// is not a recognized month name followed by a year.
pub fn parse_month_year(label: &str) -> Option<(i32, u32)> {
    let mut parts = label.split_whitespace();
    let month_name = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let month_num = MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == month_name)
        .map(|(_, num)| *num)?;

    Some((year, month_num))
}

/// Loader variant: a label containing "Last 30 Days" derives to the current
/// `(year, month)`; everything else falls back to the strict parse.
pub fn derive_year_month(label: &str) -> Option<(i32, u32)> {
    if label.contains("Last 30 Days") {
        let today = Utc::now().date_naive();
        return Some((today.year(), today.month()));
    }
    parse_month_year(label)
}
