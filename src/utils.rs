use crate::error::{CostEngineError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};

pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CostEngineError::DateError(format!("Invalid calendar month {:04}-{:02}", year, month))
    })
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    first_day_of_month(next_year, next_month)?
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
            CostEngineError::DateError(format!(
                "No last day for calendar month {:04}-{:02}",
                year, month
            ))
        })
}

/// Adds calendar months, clamping to the end of shorter months (Jan 31 + 1 month = Feb 28).
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        CostEngineError::DateError(format!("Adding {} months to {} overflows", months, date))
    })
}

pub fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(days)).ok_or_else(|| {
        CostEngineError::DateError(format!("Subtracting {} days from {} overflows", days, date))
    })
}

/// Signed number of days from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (first day of the start month, last day of the end month)
pub fn parse_period_string(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let start = parse_month(parts[0])?;
            let end = last_day_of_month(start.year(), start.month())?;
            Ok((start, end))
        }
        2 => {
            let start = parse_month(parts[0])?;
            let end_ref = parse_month(parts[1])?;
            let end = last_day_of_month(end_ref.year(), end_ref.month())?;
            Ok((start, end))
        }
        _ => Err(CostEngineError::DateError(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    let padded = format!("{}-01", raw.trim());
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").map_err(|_| {
        CostEngineError::DateError(format!(
            "Invalid date format in period: {}. Expected YYYY-MM",
            raw
        ))
    })
}
