use crate::allocation::{default_amortization_months, CostAllocator};
use crate::amortization::{schedule_by_category, CategoryAmortization};
use crate::config::EngineConfig;
use crate::error::{CostEngineError, Result};
use crate::performance::PerformanceDiagnostic;
use crate::recalc::{PeriodRecalculator, RecalcReport};
use crate::schema::{DateWindow, Sale, SaleCategory, SaleMargins};
use crate::sliding_window::{SaleCosts, SlidingWindowCoster};
use crate::statistics::PeriodStatistics;
use crate::store::{LedgerStore, MarginUpdate};
use crate::unit_cost::CostBreakdown;
use chrono::NaiveDate;
use log::{debug, info};

/// Entry point of the engine: production costs, unit costs and sale margins for a
/// project, read from and written back to a [`LedgerStore`].
///
/// The service keeps no state between calls; callers that want caching can key it
/// by `(project_id, window)` and drop entries on ledger writes.
pub struct ProductionCostService<S: LedgerStore> {
    store: S,
    config: EngineConfig,
}

impl<S: LedgerStore> ProductionCostService<S> {
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn with_default_config(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Production costs of the livestock sold in `[start, end]`.
    pub fn compute_production_costs(
        &self,
        project_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CostBreakdown> {
        let window = DateWindow::new(start, end)?;
        self.costs_for_window(project_id, &window)
    }

    /// Production costs of the calendar month containing `date`.
    pub fn compute_month_costs(&self, project_id: &str, date: NaiveDate) -> Result<CostBreakdown> {
        let window = DateWindow::month_of(date)?;
        self.costs_for_window(project_id, &window)
    }

    /// Per-kg costs applicable to a sale on `sale_date`, from the look-back window
    /// or, when that window is empty, the project's averages.
    pub fn compute_costs_for_sale(
        &self,
        project_id: &str,
        sale_date: NaiveDate,
    ) -> Result<SaleCosts> {
        let project = self.store.get_project(project_id)?;
        let coster = SlidingWindowCoster::new(&self.config);
        let lookback = coster.window_for(sale_date)?;

        let expenses = self.store.get_expenses(project_id)?;
        let charges = self.store.get_fixed_charges(project_id)?;
        let sales =
            self.store
                .get_sales_in_window(project_id, &lookback, SaleCategory::LivestockSale)?;

        coster.costs_for_sale(&project, &expenses, &charges, &sales, sale_date)
    }

    /// Computes and persists the margins of one sale sold at `weight_kg`.
    ///
    /// The sale counts in its own look-back window at the given weight.
    pub fn compute_margin_for_sale(&self, sale_id: &str, weight_kg: f64) -> Result<Sale> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Err(CostEngineError::InvalidWeight(weight_kg));
        }

        let sale = self.store.get_sale(sale_id)?;
        let project = self.store.get_project(&sale.project_id)?;
        let coster = SlidingWindowCoster::new(&self.config);
        let lookback = coster.window_for(sale.date)?;

        let expenses = self.store.get_expenses(&project.id)?;
        let charges = self.store.get_fixed_charges(&project.id)?;
        let mut sales =
            self.store
                .get_sales_in_window(&project.id, &lookback, SaleCategory::LivestockSale)?;
        for s in sales.iter_mut().filter(|s| s.id == sale.id) {
            s.weight_kg = Some(weight_kg);
        }

        let sale_costs = coster.costs_for_sale(&project, &expenses, &charges, &sales, sale.date)?;
        let margins = SaleMargins::compute(sale.amount, weight_kg, sale_costs.costs);

        self.store
            .persist_sale_margin(&sale.id, &MarginUpdate { weight_kg, margins })?;

        info!(
            "Sale {} of project {}: {:.2} kg, margin {:.2} ({:.1}%) opex / {:.2} ({:.1}%) full ({:?} costs)",
            sale.id,
            project.id,
            weight_kg,
            margins.margin_opex,
            margins.margin_opex_percent,
            margins.margin_full,
            margins.margin_full_percent,
            sale_costs.source
        );

        Ok(Sale {
            weight_kg: Some(weight_kg),
            margins: Some(margins),
            ..sale
        })
    }

    pub fn recalc_margins_for_period(
        &self,
        project_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecalcReport> {
        let window = DateWindow::new(start, end)?;
        PeriodRecalculator::new(&self.store, &self.config).recalc_period(project_id, &window)
    }

    pub fn recalc_margins_for_year(&self, project_id: &str, year: i32) -> Result<RecalcReport> {
        let window = DateWindow::calendar_year(year)?;
        PeriodRecalculator::new(&self.store, &self.config).recalc_period(project_id, &window)
    }

    pub fn period_statistics(
        &self,
        project_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PeriodStatistics> {
        let window = DateWindow::new(start, end)?;
        let costs = self.costs_for_window(project_id, &window)?;
        let sales =
            self.store
                .get_sales_in_window(project_id, &window, SaleCategory::LivestockSale)?;
        Ok(PeriodStatistics::from_sales(costs, &sales))
    }

    /// Compares the full cost per kg since the first livestock sale with a market price.
    ///
    /// Returns `None` when nothing was sold up to `as_of`.
    pub fn performance_diagnostic(
        &self,
        project_id: &str,
        market_price_per_kg: f64,
        as_of: NaiveDate,
    ) -> Result<Option<PerformanceDiagnostic>> {
        if !market_price_per_kg.is_finite() || market_price_per_kg <= 0.0 {
            return Err(CostEngineError::InvalidAmount {
                field: "market_price_per_kg".to_string(),
                value: market_price_per_kg,
            });
        }

        let history = DateWindow::new(NaiveDate::MIN, as_of)?;
        let sales =
            self.store
                .get_sales_in_window(project_id, &history, SaleCategory::LivestockSale)?;
        let Some(first_sale) = sales.iter().map(|s| s.date).min() else {
            // still surface a missing project
            self.store.get_project(project_id)?;
            debug!("No livestock sales for project {} up to {}", project_id, as_of);
            return Ok(None);
        };

        let window = DateWindow::new(first_sale, as_of)?;
        let costs = self.costs_for_window(project_id, &window)?;
        Ok(PerformanceDiagnostic::assess(
            costs,
            market_price_per_kg,
            self.config.fragile_margin_threshold_percent,
        ))
    }

    /// CAPEX investments grouped by category with their monthly amortization.
    pub fn capex_schedule(&self, project_id: &str) -> Result<Vec<CategoryAmortization>> {
        let project = self.store.get_project(project_id)?;
        let expenses = self.store.get_expenses(project_id)?;
        Ok(schedule_by_category(
            &expenses,
            default_amortization_months(&project, &self.config),
            &self.config.classification,
        ))
    }

    fn costs_for_window(&self, project_id: &str, window: &DateWindow) -> Result<CostBreakdown> {
        let project = self.store.get_project(project_id)?;
        let expenses = self.store.get_expenses(project_id)?;
        let charges = self.store.get_fixed_charges(project_id)?;
        let sales =
            self.store
                .get_sales_in_window(project_id, window, SaleCategory::LivestockSale)?;

        let totals = CostAllocator::new(&self.config).window_costs(
            &expenses,
            &charges,
            &sales,
            window,
            default_amortization_months(&project, &self.config),
        );
        let breakdown = CostBreakdown::new(window, &totals);

        info!(
            "Production costs for project {} between {} and {}: opex {:.2}, amortized capex {:.2}, {:.2} kg sold",
            project_id,
            window.start,
            window.end,
            breakdown.total_opex,
            breakdown.total_amortized_capex,
            breakdown.total_kg_sold
        );

        Ok(breakdown)
    }
}
