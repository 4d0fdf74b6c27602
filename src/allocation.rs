use crate::amortization::AmortizationScheduler;
use crate::config::EngineConfig;
use crate::fixed_charges::FixedChargeProrator;
use crate::schema::{
    CostClass, DateWindow, Expense, FixedCharge, Project, Sale, MAX_AMORTIZATION_MONTHS,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Cost totals attributed to one date window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct WindowCosts {
    /// One-off OPEX expenses dated inside the window.
    pub one_off_opex: f64,
    /// Prorated active fixed charges.
    pub fixed_charges: f64,
    /// `one_off_opex + fixed_charges`.
    pub opex_total: f64,
    pub capex_amortized_total: f64,
    pub total_kg_sold: f64,
}

/// Amortization length applied to CAPEX expenses of `project` that carry none.
pub fn default_amortization_months(project: &Project, config: &EngineConfig) -> u32 {
    project
        .default_amortization_months
        .filter(|m| (1..=MAX_AMORTIZATION_MONTHS).contains(m))
        .unwrap_or(config.default_amortization_months)
}

/// Kilograms of livestock sold inside the window. Sales without a weight count as zero.
pub fn total_kg_sold(sales: &[Sale], window: &DateWindow) -> f64 {
    sales
        .iter()
        .filter(|s| s.is_livestock_sale() && window.contains(s.date))
        .filter_map(|s| s.positive_weight())
        .sum()
}

pub struct CostAllocator<'a> {
    config: &'a EngineConfig,
}

impl<'a> CostAllocator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Aggregates OPEX and amortized CAPEX for the window.
    ///
    /// One-off OPEX is filtered by expense date. Fixed charges and CAPEX are not
    /// pre-filtered: the prorator and the scheduler decide their overlap.
    pub fn window_costs(
        &self,
        expenses: &[Expense],
        charges: &[FixedCharge],
        sales: &[Sale],
        window: &DateWindow,
        default_months: u32,
    ) -> WindowCosts {
        let table = &self.config.classification;
        let scheduler = AmortizationScheduler::new(self.config.month_counting)
            .with_length_cap(self.config.cap_amortization_at_length);
        let prorator = FixedChargeProrator::new(self.config.month_counting);

        let mut one_off_opex = 0.0;
        let mut capex_amortized_total = 0.0;

        for expense in expenses {
            match table.classify(expense) {
                CostClass::Opex => {
                    if window.contains(expense.date) {
                        one_off_opex += expense.amount;
                    }
                }
                CostClass::Capex => {
                    capex_amortized_total +=
                        scheduler.amortized_amount_in_window(expense, window, default_months);
                }
            }
        }

        let fixed_charges = prorator.total_in_window(charges, window);
        let total_kg_sold = total_kg_sold(sales, window);

        let costs = WindowCosts {
            one_off_opex,
            fixed_charges,
            opex_total: one_off_opex + fixed_charges,
            capex_amortized_total,
            total_kg_sold,
        };

        debug!(
            "Window {} to {}: opex {:.2} (one-off {:.2}, fixed {:.2}), amortized capex {:.2}, {:.2} kg sold",
            window.start,
            window.end,
            costs.opex_total,
            costs.one_off_opex,
            costs.fixed_charges,
            costs.capex_amortized_total,
            costs.total_kg_sold
        );

        costs
    }
}
