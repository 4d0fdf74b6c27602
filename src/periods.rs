use crate::schema::ChargeFrequency;
use crate::utils::{days_between, months_between};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DAYS_PER_MONTH: i64 = 30;

/// Converts an inclusive date span into a count of billing months.
///
/// Implementations return 0 when `end < start` and at least 1 otherwise.
pub trait PeriodCounter {
    fn elapsed_months(&self, start: NaiveDate, end: NaiveDate) -> u32;

    /// Number of `frequency` periods touched by the span, rounded up.
    fn elapsed_periods(&self, start: NaiveDate, end: NaiveDate, frequency: ChargeFrequency) -> u32 {
        self.elapsed_months(start, end).div_ceil(frequency.months_per_period())
    }
}

/// `floor(days / 30) + 1`. Deterministic and free of calendar edge cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThirtyDayMonths;

impl PeriodCounter for ThirtyDayMonths {
    fn elapsed_months(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let days = days_between(start, end);
        if days < 0 {
            return 0;
        }
        u32::try_from(days / DAYS_PER_MONTH + 1).unwrap_or(u32::MAX)
    }
}

/// Number of calendar months the span touches (Jan 31 to Feb 1 counts as 2).
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarMonths;

impl PeriodCounter for CalendarMonths {
    fn elapsed_months(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }
        u32::try_from(months_between(start, end) + 1).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonthCounting {
    #[default]
    ThirtyDay,
    Calendar,
}

impl PeriodCounter for MonthCounting {
    fn elapsed_months(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        match self {
            MonthCounting::ThirtyDay => ThirtyDayMonths.elapsed_months(start, end),
            MonthCounting::Calendar => CalendarMonths.elapsed_months(start, end),
        }
    }
}
