//! # Farm Cost Engine
//!
//! Production costs, cost per kilogram and sale margins for a livestock farm,
//! computed from the farm's expense ledger, its recurring charges and its sales.
//!
//! ## Core Concepts
//!
//! - **OPEX**: one-off operating expenses counted in the window they are dated in,
//!   plus recurring fixed charges prorated over the window
//! - **CAPEX**: investments spread evenly over an amortization length (36 months by default)
//! - **Cost per kg**: window costs divided by the kilograms of livestock sold in that window
//! - **Sliding window**: a sale is costed over the 30 days that end on its date, falling
//!   back to the project's averages when that window has nothing to divide by
//! - **Margins**: sale amount minus weight times cost per kg, on both bases
//!
//! ## Example
//!
//! ```rust,ignore
//! use farm_cost_engine::*;
//! use chrono::NaiveDate;
//!
//! let ledger = InMemoryLedger::from_file("ledger.json")?;
//! let service = ProductionCostService::new(ledger, EngineConfig::default())?;
//!
//! let costs = service.compute_production_costs(
//!     "farm-1",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//! )?;
//! println!("{:.0} per kg (full cost)", costs.cost_per_kg_full);
//!
//! let sale = service.compute_margin_for_sale("sale-42", 118.5)?;
//! println!("{:?}", sale.margins);
//! ```

pub mod allocation;
pub mod amortization;
pub mod classification;
pub mod config;
pub mod error;
pub mod fixed_charges;
pub mod margin;
pub mod performance;
pub mod periods;
pub mod recalc;
pub mod schema;
pub mod service;
pub mod sliding_window;
pub mod statistics;
pub mod store;
pub mod unit_cost;
pub mod utils;

pub use allocation::{default_amortization_months, total_kg_sold, CostAllocator, WindowCosts};
pub use amortization::{
    schedule_by_category, AmortizationScheduler, AmortizedExpense, CategoryAmortization,
};
pub use classification::ClassificationTable;
pub use config::EngineConfig;
pub use error::{CostEngineError, Result};
pub use fixed_charges::FixedChargeProrator;
pub use margin::MarginResult;
pub use performance::{PerformanceDiagnostic, PerformanceStatus};
pub use periods::{CalendarMonths, MonthCounting, PeriodCounter, ThirtyDayMonths};
pub use recalc::{PeriodRecalculator, RecalcReport, SaleFailure};
pub use schema::*;
pub use service::ProductionCostService;
pub use sliding_window::{CostSource, SaleCosts, SlidingWindowCoster};
pub use statistics::PeriodStatistics;
pub use store::{InMemoryLedger, LedgerStore, MarginUpdate};
pub use unit_cost::{CostBreakdown, PerKgCosts};
pub use utils::*;

use chrono::NaiveDate;

/// Production costs of `[start, end]` with the default configuration.
pub fn compute_production_costs<S: LedgerStore>(
    store: S,
    project_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CostBreakdown> {
    ProductionCostService::with_default_config(store).compute_production_costs(
        project_id, start, end,
    )
}

/// Loads a ledger and an engine configuration from JSON files and builds a service over them.
pub fn service_from_files(
    ledger_path: impl AsRef<std::path::Path>,
    config_path: impl AsRef<std::path::Path>,
) -> Result<ProductionCostService<InMemoryLedger>> {
    let ledger = InMemoryLedger::from_file(ledger_path)?;
    let config = EngineConfig::from_file(config_path)?;
    ProductionCostService::new(ledger, config)
}
