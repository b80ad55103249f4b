//! Month-scoped views over dated records.
//!
//! Records carry plain `YYYY-MM-DD` calendar dates, so month membership is a
//! plain calendar comparison with no timezone conversion involved. Records
//! whose date does not parse are excluded from filtered views instead of
//! faulting the whole computation.

use chrono::NaiveDate;

use crate::domain::models::expense::Expense;
use crate::domain::models::income::Income;

/// Sentinel accepted by the `month` query parameter to disable filtering.
pub const ALL_MONTHS: &str = "all";

/// A parsed month selector: everything, or one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthKey {
    All,
    Month { year: i32, month: u32 },
}

impl MonthKey {
    /// Parse `"all"` or `"YYYY-MM"`. Anything else is `None`.
    pub fn parse(value: &str) -> Option<MonthKey> {
        if value == ALL_MONTHS {
            return Some(MonthKey::All);
        }
        let (year, month) = value.split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(MonthKey::Month { year, month })
    }
}

/// Parse an optional `month` query parameter; absence means everything.
pub fn parse_month_param(value: Option<&str>) -> anyhow::Result<MonthKey> {
    match value {
        None => Ok(MonthKey::All),
        Some(v) => MonthKey::parse(v).ok_or_else(|| {
            crate::domain::error::validation(format!(
                "Mes inválido: \"{v}\" (use AAAA-MM o \"all\")"
            ))
        }),
    }
}

/// Anything with a user-entered calendar date string.
pub trait DatedRecord {
    fn record_date(&self) -> &str;
}

impl DatedRecord for Expense {
    fn record_date(&self) -> &str {
        &self.date
    }
}

impl DatedRecord for Income {
    fn record_date(&self) -> &str {
        &self.date
    }
}

/// Parse the calendar-date prefix of a record date. Accepts both plain
/// `YYYY-MM-DD` and longer RFC 3339 strings from older records.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Narrow `records` to the selected month. `MonthKey::All` is the identity.
pub fn filter_by_month<T: DatedRecord + Clone>(records: &[T], key: MonthKey) -> Vec<T> {
    match key {
        MonthKey::All => records.to_vec(),
        MonthKey::Month { year, month } => records
            .iter()
            .filter(|record| {
                parse_record_date(record.record_date())
                    .map(|date| {
                        use chrono::Datelike;
                        date.year() == year && date.month() == month
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect(),
    }
}
