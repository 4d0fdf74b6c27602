use crate::unit_cost::CostBreakdown;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    Profitable,
    /// Full cost within the fragile threshold of the market price.
    Fragile,
    Loss,
}

/// Full production cost per kg compared with a market price per kg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceDiagnostic {
    pub costs: CostBreakdown,
    pub market_price_per_kg: f64,
    /// `market_price_per_kg - cost_per_kg_full`; negative when selling below cost.
    pub gap_per_kg: f64,
    pub gap_percent: f64,
    pub status: PerformanceStatus,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl PerformanceDiagnostic {
    /// `None` when no kilograms were sold, since there is no unit cost to judge.
    pub fn assess(
        costs: CostBreakdown,
        market_price_per_kg: f64,
        fragile_threshold_percent: f64,
    ) -> Option<Self> {
        if costs.total_kg_sold <= 0.0 {
            return None;
        }

        let cost = costs.cost_per_kg_full;
        let gap_per_kg = market_price_per_kg - cost;
        let gap_percent = if market_price_per_kg > 0.0 {
            gap_per_kg / market_price_per_kg * 100.0
        } else {
            0.0
        };

        let status = if cost > market_price_per_kg {
            PerformanceStatus::Loss
        } else if gap_percent.abs() <= fragile_threshold_percent {
            PerformanceStatus::Fragile
        } else {
            PerformanceStatus::Profitable
        };

        let message = match status {
            PerformanceStatus::Profitable => format!(
                "Production cost ({:.0}/kg) is below the market price ({:.0}/kg). Margin: {:.0}/kg ({:.1}%).",
                cost, market_price_per_kg, gap_per_kg, gap_percent
            ),
            PerformanceStatus::Fragile => format!(
                "Production cost ({:.0}/kg) is very close to the market price ({:.0}/kg). Margin: {:.0}/kg ({:.1}%). The margin is thin.",
                cost, market_price_per_kg, gap_per_kg, gap_percent
            ),
            PerformanceStatus::Loss => format!(
                "Production cost ({:.0}/kg) is above the market price ({:.0}/kg). Loss: {:.0}/kg.",
                cost,
                market_price_per_kg,
                gap_per_kg.abs()
            ),
        };

        Some(Self {
            costs,
            market_price_per_kg,
            gap_per_kg,
            gap_percent,
            status,
            message,
            suggestions: suggestions_for(status),
        })
    }
}

fn suggestions_for(status: PerformanceStatus) -> Vec<String> {
    let lines: &[&str] = match status {
        PerformanceStatus::Loss => &[
            "Reduce feed cost by optimizing ration formulation",
            "Improve daily weight gain to sell heavier animals",
            "Investigate mortality to reduce losses",
            "Review the selling price if the local market allows it",
        ],
        PerformanceStatus::Fragile => &[
            "Watch the evolution of feed cost",
            "Limit non-essential operating expenses",
            "Optimize performance per batch",
        ],
        PerformanceStatus::Profitable => &[
            "Performance is good; increasing volume can be considered",
            "Keep tracking costs to maintain profitability",
        ],
    };
    lines.iter().map(|s| s.to_string()).collect()
}
