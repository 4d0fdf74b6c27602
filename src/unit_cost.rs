use crate::allocation::WindowCosts;
use crate::schema::DateWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PerKgCosts {
    pub cost_per_kg_opex: f64,
    /// OPEX plus amortized CAPEX.
    pub cost_per_kg_full: f64,
}

impl PerKgCosts {
    pub fn new(cost_per_kg_opex: f64, cost_per_kg_full: f64) -> Self {
        Self {
            cost_per_kg_opex,
            cost_per_kg_full,
        }
    }

    /// Divides the window totals by kilograms sold; zero when nothing was sold.
    pub fn from_window_costs(costs: &WindowCosts) -> Self {
        if costs.total_kg_sold > 0.0 {
            Self {
                cost_per_kg_opex: costs.opex_total / costs.total_kg_sold,
                cost_per_kg_full: (costs.opex_total + costs.capex_amortized_total)
                    / costs.total_kg_sold,
            }
        } else {
            Self::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        self.cost_per_kg_opex == 0.0 && self.cost_per_kg_full == 0.0
    }
}

/// Production costs for a date window, as reported to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub total_opex: f64,
    pub total_amortized_capex: f64,
    pub total_kg_sold: f64,
    pub cost_per_kg_opex: f64,
    pub cost_per_kg_full: f64,
}

impl CostBreakdown {
    pub fn new(window: &DateWindow, costs: &WindowCosts) -> Self {
        let per_kg = PerKgCosts::from_window_costs(costs);
        Self {
            date_start: window.start,
            date_end: window.end,
            total_opex: costs.opex_total,
            total_amortized_capex: costs.capex_amortized_total,
            total_kg_sold: costs.total_kg_sold,
            cost_per_kg_opex: per_kg.cost_per_kg_opex,
            cost_per_kg_full: per_kg.cost_per_kg_full,
        }
    }

    pub fn per_kg(&self) -> PerKgCosts {
        PerKgCosts::new(self.cost_per_kg_opex, self.cost_per_kg_full)
    }
}
