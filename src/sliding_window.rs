use crate::allocation::{default_amortization_months, CostAllocator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::schema::{DateWindow, Expense, FixedCharge, Project, Sale};
use crate::unit_cost::PerKgCosts;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    /// Computed over the look-back window ending at the sale date.
    SlidingWindow,
    /// The project's manually maintained averages.
    ProjectAverage,
    /// Shared cost basis of a recalculated period.
    Period,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SaleCosts {
    pub costs: PerKgCosts,
    pub source: CostSource,
}

pub struct SlidingWindowCoster<'a> {
    config: &'a EngineConfig,
}

impl<'a> SlidingWindowCoster<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// `[sale_date - sliding_window_days, sale_date]`.
    pub fn window_for(&self, sale_date: NaiveDate) -> Result<DateWindow> {
        DateWindow::trailing(sale_date, self.config.sliding_window_days)
    }

    /// Per-kg costs for a sale on `sale_date`.
    ///
    /// `sales` must cover at least the look-back window. When the window has no
    /// kilograms sold, or yields zero on both bases, the project's averages are used
    /// if both are set; otherwise the computed values are returned unchanged.
    pub fn costs_for_sale(
        &self,
        project: &Project,
        expenses: &[Expense],
        charges: &[FixedCharge],
        sales: &[Sale],
        sale_date: NaiveDate,
    ) -> Result<SaleCosts> {
        let window = self.window_for(sale_date)?;
        let default_months = default_amortization_months(project, self.config);
        let totals = CostAllocator::new(self.config).window_costs(
            expenses,
            charges,
            sales,
            &window,
            default_months,
        );
        let computed = PerKgCosts::from_window_costs(&totals);

        if totals.total_kg_sold == 0.0 || computed.is_zero() {
            if let (Some(opex), Some(full)) =
                (project.avg_cost_per_kg_opex, project.avg_cost_per_kg_full)
            {
                warn!(
                    "No usable costs in look-back window ending {} for project {}; using project averages",
                    sale_date, project.id
                );
                return Ok(SaleCosts {
                    costs: PerKgCosts::new(opex, full),
                    source: CostSource::ProjectAverage,
                });
            }
        }

        Ok(SaleCosts {
            costs: computed,
            source: CostSource::SlidingWindow,
        })
    }
}
