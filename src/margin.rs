use crate::schema::SaleMargins;
use crate::unit_cost::PerKgCosts;

/// Real cost and margin of one sale on both cost bases.
pub type MarginResult = SaleMargins;

impl SaleMargins {
    /// Negative margins are kept as-is: selling at a loss is a valid outcome.
    pub fn compute(sale_amount: f64, weight_kg: f64, costs: PerKgCosts) -> Self {
        let real_cost_opex = costs.cost_per_kg_opex * weight_kg;
        let real_cost_full = costs.cost_per_kg_full * weight_kg;
        let margin_opex = sale_amount - real_cost_opex;
        let margin_full = sale_amount - real_cost_full;

        Self {
            cost_per_kg_opex: costs.cost_per_kg_opex,
            cost_per_kg_full: costs.cost_per_kg_full,
            real_cost_opex,
            real_cost_full,
            margin_opex,
            margin_full,
            margin_opex_percent: percent_of(margin_opex, sale_amount),
            margin_full_percent: percent_of(margin_full, sale_amount),
        }
    }
}

fn percent_of(margin: f64, sale_amount: f64) -> f64 {
    if sale_amount > 0.0 {
        margin / sale_amount * 100.0
    } else {
        0.0
    }
}
