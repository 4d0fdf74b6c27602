use crate::allocation::{default_amortization_months, CostAllocator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::schema::{
    DateWindow, EntityId, Expense, FixedCharge, Project, Sale, SaleCategory, SaleMargins,
};
use crate::sliding_window::{CostSource, SlidingWindowCoster};
use crate::store::{LedgerStore, MarginUpdate};
use crate::unit_cost::{CostBreakdown, PerKgCosts};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleFailure {
    pub sale_id: EntityId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecalcReport {
    /// Sales whose margins were computed and persisted.
    pub recalculated_count: usize,
    pub period_costs: CostBreakdown,
    pub updated_sales: Vec<Sale>,
    pub failures: Vec<SaleFailure>,
}

/// Recomputes margins for every weighed livestock sale of a period.
///
/// All sales share the period's cost basis. A sale whose write (or fallback lookup)
/// fails is reported in `failures` and the batch carries on.
pub struct PeriodRecalculator<'a, S: LedgerStore> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: LedgerStore> PeriodRecalculator<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn recalc_period(&self, project_id: &str, window: &DateWindow) -> Result<RecalcReport> {
        let project = self.store.get_project(project_id)?;
        let expenses = self.store.get_expenses(project_id)?;
        let charges = self.store.get_fixed_charges(project_id)?;
        let sales =
            self.store
                .get_sales_in_window(project_id, window, SaleCategory::LivestockSale)?;

        let default_months = default_amortization_months(&project, self.config);
        let totals = CostAllocator::new(self.config).window_costs(
            &expenses,
            &charges,
            &sales,
            window,
            default_months,
        );
        let period_costs = CostBreakdown::new(window, &totals);
        let period_per_kg = period_costs.per_kg();

        let mut updated_sales = Vec::new();
        let mut failures = Vec::new();

        for sale in sales.iter().filter(|s| s.qualifies_for_margin()) {
            match self.recalc_sale(&project, &expenses, &charges, sale, period_per_kg) {
                Ok(updated) => updated_sales.push(updated),
                Err(e) => {
                    warn!(
                        "Margin recalculation failed for sale {} of project {}: {}",
                        sale.id, project_id, e
                    );
                    failures.push(SaleFailure {
                        sale_id: sale.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Recalculated margins for {} sale(s) of project {} between {} and {} ({} failed)",
            updated_sales.len(),
            project_id,
            window.start,
            window.end,
            failures.len()
        );

        Ok(RecalcReport {
            recalculated_count: updated_sales.len(),
            period_costs,
            updated_sales,
            failures,
        })
    }

    fn recalc_sale(
        &self,
        project: &Project,
        expenses: &[Expense],
        charges: &[FixedCharge],
        sale: &Sale,
        period_per_kg: PerKgCosts,
    ) -> Result<Sale> {
        let weight_kg = sale.positive_weight().unwrap_or_default();

        let (costs, source) = if period_per_kg.is_zero() {
            let coster = SlidingWindowCoster::new(self.config);
            let lookback = coster.window_for(sale.date)?;
            let lookback_sales = self.store.get_sales_in_window(
                &project.id,
                &lookback,
                SaleCategory::LivestockSale,
            )?;
            let sale_costs =
                coster.costs_for_sale(project, expenses, charges, &lookback_sales, sale.date)?;
            (sale_costs.costs, sale_costs.source)
        } else {
            (period_per_kg, CostSource::Period)
        };

        let margins = SaleMargins::compute(sale.amount, weight_kg, costs);
        self.store
            .persist_sale_margin(&sale.id, &MarginUpdate { weight_kg, margins })?;

        debug!(
            "Sale {}: {:.2} kg at {:.2}/{:.2} per kg ({:?}), margin {:.2} / {:.2}",
            sale.id,
            weight_kg,
            costs.cost_per_kg_opex,
            costs.cost_per_kg_full,
            source,
            margins.margin_opex,
            margins.margin_full
        );

        Ok(Sale {
            weight_kg: Some(weight_kg),
            margins: Some(margins),
            ..sale.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CostEngineError;
    use crate::schema::{ChargeFrequency, ChargeStatus};
    use crate::store::InMemoryLedger;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(id: &str, on: NaiveDate, amount: f64, weight: Option<f64>) -> Sale {
        Sale {
            id: id.to_string(),
            project_id: "farm".to_string(),
            date: on,
            amount,
            category: SaleCategory::LivestockSale,
            weight_kg: weight,
            margins: None,
        }
    }

    fn ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::default();
        ledger.insert_project(Project::new("farm")).unwrap();
        ledger
            .insert_fixed_charge(FixedCharge {
                id: "rent".to_string(),
                project_id: "farm".to_string(),
                amount: 60_000.0,
                frequency: ChargeFrequency::Monthly,
                start_date: date(2024, 1, 1),
                status: ChargeStatus::Active,
            })
            .unwrap();
        ledger
            .insert_sale(sale("s1", date(2024, 3, 5), 300_000.0, Some(100.0)))
            .unwrap();
        ledger
            .insert_sale(sale("s2", date(2024, 3, 25), 250_000.0, Some(50.0)))
            .unwrap();
        ledger
            .insert_sale(sale("unweighed", date(2024, 3, 12), 90_000.0, None))
            .unwrap();
        ledger
    }

    #[test]
    fn test_period_basis_shared_by_all_sales() {
        let ledger = ledger();
        let config = EngineConfig::default();
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 29)).unwrap();

        let report = PeriodRecalculator::new(&ledger, &config)
            .recalc_period("farm", &window)
            .unwrap();

        // 28 elapsed days -> 1 month of rent over 150 kg
        assert_eq!(report.recalculated_count, 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.period_costs.total_opex, 60_000.0);
        assert_eq!(report.period_costs.total_kg_sold, 150.0);
        assert_eq!(report.period_costs.cost_per_kg_opex, 400.0);

        for updated in &report.updated_sales {
            let margins = updated.margins.unwrap();
            assert_eq!(margins.cost_per_kg_opex, 400.0);
            let stored = ledger.get_sale(&updated.id).unwrap();
            assert_eq!(stored.margins, updated.margins);
        }
        assert!(ledger.get_sale("unweighed").unwrap().margins.is_none());
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let ledger = ledger();
        let config = EngineConfig::default();
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();

        let result = PeriodRecalculator::new(&ledger, &config).recalc_period("ghost", &window);
        assert!(matches!(result, Err(CostEngineError::NotFound { .. })));
    }

    #[test]
    fn test_empty_period_reports_zero() {
        let ledger = ledger();
        let config = EngineConfig::default();
        let window = DateWindow::new(date(2023, 1, 1), date(2023, 1, 31)).unwrap();

        let report = PeriodRecalculator::new(&ledger, &config)
            .recalc_period("farm", &window)
            .unwrap();
        assert_eq!(report.recalculated_count, 0);
        assert!(report.updated_sales.is_empty());
        assert_eq!(report.period_costs.cost_per_kg_full, 0.0);
    }

    fn ledger_without_costs() -> InMemoryLedger {
        let ledger = InMemoryLedger::default();
        ledger
            .insert_project(Project {
                avg_cost_per_kg_opex: Some(1_200.0),
                avg_cost_per_kg_full: Some(1_500.0),
                ..Project::new("farm")
            })
            .unwrap();
        ledger
            .insert_sale(sale("s1", date(2024, 3, 5), 300_000.0, Some(100.0)))
            .unwrap();
        ledger
            .insert_sale(sale("s2", date(2024, 3, 25), 250_000.0, Some(50.0)))
            .unwrap();
        ledger
    }

    #[test]
    fn test_zero_period_basis_uses_project_averages() {
        let ledger = ledger_without_costs();
        let config = EngineConfig::default();
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();

        let report = PeriodRecalculator::new(&ledger, &config)
            .recalc_period("farm", &window)
            .unwrap();

        assert_eq!(report.recalculated_count, 2);
        assert!(report.period_costs.per_kg().is_zero());
        for updated in &report.updated_sales {
            let margins = updated.margins.unwrap();
            assert_eq!(margins.cost_per_kg_opex, 1_200.0);
            assert_eq!(margins.cost_per_kg_full, 1_500.0);
        }
    }

    /// Serves the period query but fails every other sales lookup.
    struct LookbackUnavailable {
        inner: InMemoryLedger,
        period: DateWindow,
    }

    impl LedgerStore for LookbackUnavailable {
        fn get_project(&self, project_id: &str) -> Result<Project> {
            self.inner.get_project(project_id)
        }

        fn get_expenses(&self, project_id: &str) -> Result<Vec<Expense>> {
            self.inner.get_expenses(project_id)
        }

        fn get_fixed_charges(&self, project_id: &str) -> Result<Vec<FixedCharge>> {
            self.inner.get_fixed_charges(project_id)
        }

        fn get_sales_in_window(
            &self,
            project_id: &str,
            window: &DateWindow,
            category: SaleCategory,
        ) -> Result<Vec<Sale>> {
            if *window != self.period {
                return Err(CostEngineError::Storage("lookback unavailable".to_string()));
            }
            self.inner.get_sales_in_window(project_id, window, category)
        }

        fn get_sale(&self, sale_id: &str) -> Result<Sale> {
            self.inner.get_sale(sale_id)
        }

        fn persist_sale_margin(&self, sale_id: &str, update: &MarginUpdate) -> Result<()> {
            self.inner.persist_sale_margin(sale_id, update)
        }
    }

    #[test]
    fn test_failed_fallback_lookup_is_reported_per_sale() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let store = LookbackUnavailable {
            inner: ledger_without_costs(),
            period: window,
        };
        let config = EngineConfig::default();

        let report = PeriodRecalculator::new(&store, &config)
            .recalc_period("farm", &window)
            .unwrap();

        assert_eq!(report.recalculated_count, 0);
        let failed: Vec<&str> = report.failures.iter().map(|f| f.sale_id.as_str()).collect();
        assert_eq!(failed, vec!["s1", "s2"]);
        assert!(report.failures[0].reason.contains("lookback unavailable"));
        assert!(store.inner.get_sale("s1").unwrap().margins.is_none());
    }
}
