use crate::classification::ClassificationTable;
use crate::periods::{MonthCounting, PeriodCounter};
use crate::schema::{
    CostClass, DateWindow, EntityId, Expense, ExpenseCategory, MAX_AMORTIZATION_MONTHS,
};
use crate::utils::add_months;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spreads CAPEX expenses evenly over their amortization length.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationScheduler<C: PeriodCounter = MonthCounting> {
    counter: C,
    cap_at_length: bool,
}

impl<C: PeriodCounter> AmortizationScheduler<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            cap_at_length: false,
        }
    }

    /// Limits the months counted in one window to the amortization length.
    pub fn with_length_cap(mut self, cap_at_length: bool) -> Self {
        self.cap_at_length = cap_at_length;
        self
    }

    /// The expense's own length when it is within 1..=360, else `default_months`.
    pub fn amortization_length(expense: &Expense, default_months: u32) -> u32 {
        expense
            .amortization_months
            .filter(|m| (1..=MAX_AMORTIZATION_MONTHS).contains(m))
            .unwrap_or(default_months)
            .max(1)
    }

    pub fn monthly_slice(expense: &Expense, default_months: u32) -> f64 {
        expense.amount / Self::amortization_length(expense, default_months) as f64
    }

    /// First day after the amortization period, `purchase + length` calendar months.
    pub fn amortization_end(expense: &Expense, default_months: u32) -> NaiveDate {
        let length = Self::amortization_length(expense, default_months);
        add_months(expense.date, length).unwrap_or(NaiveDate::MAX)
    }

    /// Portion of the expense amortized inside `window`.
    ///
    /// The overlap `[max(purchase, start), min(amortization_end, end)]` is converted to
    /// months by the configured counter, never less than 1. The count can exceed the
    /// amortization length unless the length cap is enabled.
    pub fn amortized_amount_in_window(
        &self,
        expense: &Expense,
        window: &DateWindow,
        default_months: u32,
    ) -> f64 {
        let length = Self::amortization_length(expense, default_months);
        let end_exclusive = Self::amortization_end(expense, default_months);
        let last_day = end_exclusive.pred_opt().unwrap_or(expense.date);

        if expense.date > window.end || last_day < window.start {
            return 0.0;
        }

        let overlap_start = expense.date.max(window.start);
        let overlap_end = end_exclusive.min(window.end);
        let mut months = self.counter.elapsed_months(overlap_start, overlap_end).max(1);
        if self.cap_at_length {
            months = months.min(length);
        }

        Self::monthly_slice(expense, default_months) * months as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmortizedExpense {
    pub id: EntityId,
    pub amount: f64,
    pub date: NaiveDate,
    pub amortization_months: u32,
    pub monthly_amortization: f64,
    pub amortization_end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAmortization {
    pub category: ExpenseCategory,
    pub total_invested: f64,
    pub monthly_amortization_total: f64,
    pub expense_count: usize,
    pub expenses: Vec<AmortizedExpense>,
}

/// Groups CAPEX expenses by category, largest investment first.
pub fn schedule_by_category(
    expenses: &[Expense],
    default_months: u32,
    table: &ClassificationTable,
) -> Vec<CategoryAmortization> {
    let mut by_category: BTreeMap<ExpenseCategory, Vec<AmortizedExpense>> = BTreeMap::new();

    for expense in expenses
        .iter()
        .filter(|e| table.classify(e) == CostClass::Capex)
    {
        let months = AmortizationScheduler::<MonthCounting>::amortization_length(
            expense,
            default_months,
        );
        by_category
            .entry(expense.category)
            .or_default()
            .push(AmortizedExpense {
                id: expense.id.clone(),
                amount: expense.amount,
                date: expense.date,
                amortization_months: months,
                monthly_amortization: expense.amount / months as f64,
                amortization_end: AmortizationScheduler::<MonthCounting>::amortization_end(
                    expense,
                    default_months,
                ),
            });
    }

    let mut schedule: Vec<CategoryAmortization> = by_category
        .into_iter()
        .map(|(category, expenses)| CategoryAmortization {
            category,
            total_invested: expenses.iter().map(|e| e.amount).sum(),
            monthly_amortization_total: expenses.iter().map(|e| e.monthly_amortization).sum(),
            expense_count: expenses.len(),
            expenses,
        })
        .collect();

    schedule.sort_by(|a, b| b.total_invested.total_cmp(&a.total_invested));
    schedule
}
