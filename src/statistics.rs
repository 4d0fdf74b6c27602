use crate::schema::Sale;
use crate::unit_cost::CostBreakdown;
use serde::{Deserialize, Serialize};

/// Sales activity of a period next to its production costs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodStatistics {
    pub costs: CostBreakdown,
    pub sale_count: usize,
    pub revenue: f64,
    pub total_margin_opex: f64,
    pub total_margin_full: f64,
    /// Mean OPEX margin percent over the sales that carry margins; 0 when none do.
    pub average_margin_opex_percent: f64,
}

impl PeriodStatistics {
    pub fn from_sales(costs: CostBreakdown, sales: &[Sale]) -> Self {
        let with_margins: Vec<_> = sales.iter().filter_map(|s| s.margins).collect();

        let average_margin_opex_percent = if with_margins.is_empty() {
            0.0
        } else {
            with_margins
                .iter()
                .map(|m| m.margin_opex_percent)
                .sum::<f64>()
                / with_margins.len() as f64
        };

        Self {
            costs,
            sale_count: sales.len(),
            revenue: sales.iter().map(|s| s.amount).sum(),
            total_margin_opex: with_margins.iter().map(|m| m.margin_opex).sum(),
            total_margin_full: with_margins.iter().map(|m| m.margin_full).sum(),
            average_margin_opex_percent,
        }
    }
}
