use crate::periods::{MonthCounting, PeriodCounter};
use crate::schema::{DateWindow, FixedCharge};

/// Attributes recurring charges to a query window.
///
/// A charge that started before the window is counted over the window's own length,
/// not aligned to its billing dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedChargeProrator<C: PeriodCounter = MonthCounting> {
    counter: C,
}

impl<C: PeriodCounter> FixedChargeProrator<C> {
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    pub fn prorated_amount_in_window(&self, charge: &FixedCharge, window: &DateWindow) -> f64 {
        if !charge.is_active() || charge.start_date > window.end {
            return 0.0;
        }

        let effective_start = charge.start_date.max(window.start);
        let periods = self
            .counter
            .elapsed_periods(effective_start, window.end, charge.frequency)
            .max(1);

        charge.amount * periods as f64
    }

    pub fn total_in_window(&self, charges: &[FixedCharge], window: &DateWindow) -> f64 {
        charges
            .iter()
            .map(|c| self.prorated_amount_in_window(c, window))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::ThirtyDayMonths;
    use crate::schema::{ChargeFrequency, ChargeStatus};
    use chrono::{Days, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn charge(amount: f64, frequency: ChargeFrequency, start: NaiveDate) -> FixedCharge {
        FixedCharge {
            id: "rent".to_string(),
            project_id: "farm".to_string(),
            amount,
            frequency,
            start_date: start,
            status: ChargeStatus::Active,
        }
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).unwrap()
    }

    #[test]
    fn test_monthly_charge_over_two_months() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let day0 = date(2024, 1, 1);
        let rent = charge(50_000.0, ChargeFrequency::Monthly, day0);
        let w = window(day0 + Days::new(30), day0 + Days::new(60));
        assert_eq!(prorator.prorated_amount_in_window(&rent, &w), 100_000.0);
    }

    #[test]
    fn test_quarterly_and_annual_round_up() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let start = date(2024, 1, 1);
        // 100 days -> 4 months
        let w = window(start, date(2024, 4, 10));

        let quarterly = charge(30_000.0, ChargeFrequency::Quarterly, start);
        assert_eq!(prorator.prorated_amount_in_window(&quarterly, &w), 60_000.0);

        let annual = charge(120_000.0, ChargeFrequency::Annual, start);
        assert_eq!(prorator.prorated_amount_in_window(&annual, &w), 120_000.0);
    }

    #[test]
    fn test_inactive_or_future_charges_contribute_nothing() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let w = window(date(2024, 1, 1), date(2024, 1, 31));

        let mut suspended = charge(10_000.0, ChargeFrequency::Monthly, date(2023, 1, 1));
        suspended.status = ChargeStatus::Suspended;
        assert_eq!(prorator.prorated_amount_in_window(&suspended, &w), 0.0);

        let mut ended = suspended.clone();
        ended.status = ChargeStatus::Ended;
        assert_eq!(prorator.prorated_amount_in_window(&ended, &w), 0.0);

        let future = charge(10_000.0, ChargeFrequency::Monthly, date(2024, 2, 1));
        assert_eq!(prorator.prorated_amount_in_window(&future, &w), 0.0);
    }

    #[test]
    fn test_charge_starting_mid_window_counts_from_start() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let w = window(date(2024, 1, 1), date(2024, 3, 31));
        let late = charge(1_000.0, ChargeFrequency::Monthly, date(2024, 3, 20));
        assert_eq!(prorator.prorated_amount_in_window(&late, &w), 1_000.0);
    }

    #[test]
    fn test_monotonic_in_window_end() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let start = date(2024, 1, 1);
        let rent = charge(7_500.0, ChargeFrequency::Quarterly, date(2023, 11, 5));

        let mut previous = 0.0;
        for offset in 0..400u64 {
            let w = window(start, start + Days::new(offset));
            let amount = prorator.prorated_amount_in_window(&rent, &w);
            assert!(amount >= previous, "decreased at offset {}", offset);
            previous = amount;
        }
    }

    #[test]
    fn test_total_in_window() {
        let prorator = FixedChargeProrator::new(ThirtyDayMonths);
        let start = date(2024, 1, 1);
        let w = window(start, date(2024, 1, 20));
        let charges = vec![
            charge(1_000.0, ChargeFrequency::Monthly, start),
            charge(3_000.0, ChargeFrequency::Quarterly, start),
        ];
        assert_eq!(prorator.total_in_window(&charges, &w), 4_000.0);
    }
}
