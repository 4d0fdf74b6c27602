use crate::error::{CostEngineError, Result};
use crate::schema::{
    DateWindow, Expense, FixedCharge, LedgerSnapshot, Project, Sale, SaleCategory, SaleMargins,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Derived fields written back onto a sale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MarginUpdate {
    pub weight_kg: f64,
    pub margins: SaleMargins,
}

/// Read/write access to a farm ledger.
///
/// The engine only ever writes sale margins; everything else is read-only to it.
/// Implementations are expected to make `persist_sale_margin` atomic per sale.
pub trait LedgerStore {
    fn get_project(&self, project_id: &str) -> Result<Project>;

    fn get_expenses(&self, project_id: &str) -> Result<Vec<Expense>>;

    fn get_fixed_charges(&self, project_id: &str) -> Result<Vec<FixedCharge>>;

    /// Sales of `category` dated inside `window`, oldest first.
    fn get_sales_in_window(
        &self,
        project_id: &str,
        window: &DateWindow,
        category: SaleCategory,
    ) -> Result<Vec<Sale>>;

    fn get_sale(&self, sale_id: &str) -> Result<Sale>;

    fn persist_sale_margin(&self, sale_id: &str, update: &MarginUpdate) -> Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn get_project(&self, project_id: &str) -> Result<Project> {
        (**self).get_project(project_id)
    }

    fn get_expenses(&self, project_id: &str) -> Result<Vec<Expense>> {
        (**self).get_expenses(project_id)
    }

    fn get_fixed_charges(&self, project_id: &str) -> Result<Vec<FixedCharge>> {
        (**self).get_fixed_charges(project_id)
    }

    fn get_sales_in_window(
        &self,
        project_id: &str,
        window: &DateWindow,
        category: SaleCategory,
    ) -> Result<Vec<Sale>> {
        (**self).get_sales_in_window(project_id, window, category)
    }

    fn get_sale(&self, sale_id: &str) -> Result<Sale> {
        (**self).get_sale(sale_id)
    }

    fn persist_sale_margin(&self, sale_id: &str, update: &MarginUpdate) -> Result<()> {
        (**self).persist_sale_margin(sale_id, update)
    }
}

/// A `LedgerStore` held entirely in memory, loadable from a JSON snapshot.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    data: RwLock<LedgerSnapshot>,
}

impl InMemoryLedger {
    pub fn new(snapshot: LedgerSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            data: RwLock::new(snapshot),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: LedgerSnapshot = serde_json::from_str(json)?;
        Self::new(snapshot)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.read()?)?)
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(self.read()?.clone())
    }

    pub fn insert_project(&self, project: Project) -> Result<()> {
        project.validate()?;
        let mut data = self.write()?;
        data.projects.retain(|p| p.id != project.id);
        data.projects.push(project);
        Ok(())
    }

    pub fn insert_expense(&self, expense: Expense) -> Result<()> {
        expense.validate()?;
        let mut data = self.write()?;
        data.expenses.retain(|e| e.id != expense.id);
        data.expenses.push(expense);
        Ok(())
    }

    pub fn insert_fixed_charge(&self, charge: FixedCharge) -> Result<()> {
        charge.validate()?;
        let mut data = self.write()?;
        data.fixed_charges.retain(|c| c.id != charge.id);
        data.fixed_charges.push(charge);
        Ok(())
    }

    pub fn insert_sale(&self, sale: Sale) -> Result<()> {
        sale.validate()?;
        let mut data = self.write()?;
        data.sales.retain(|s| s.id != sale.id);
        data.sales.push(sale);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerSnapshot>> {
        self.data
            .read()
            .map_err(|_| CostEngineError::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerSnapshot>> {
        self.data
            .write()
            .map_err(|_| CostEngineError::Storage("ledger lock poisoned".to_string()))
    }
}

impl LedgerStore for InMemoryLedger {
    fn get_project(&self, project_id: &str) -> Result<Project> {
        self.read()?
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| CostEngineError::project_not_found(project_id))
    }

    fn get_expenses(&self, project_id: &str) -> Result<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .read()?
            .expenses
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| e.date);
        Ok(expenses)
    }

    fn get_fixed_charges(&self, project_id: &str) -> Result<Vec<FixedCharge>> {
        Ok(self
            .read()?
            .fixed_charges
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }

    fn get_sales_in_window(
        &self,
        project_id: &str,
        window: &DateWindow,
        category: SaleCategory,
    ) -> Result<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .read()?
            .sales
            .iter()
            .filter(|s| {
                s.project_id == project_id && s.category == category && window.contains(s.date)
            })
            .cloned()
            .collect();
        sales.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(sales)
    }

    fn get_sale(&self, sale_id: &str) -> Result<Sale> {
        self.read()?
            .sales
            .iter()
            .find(|s| s.id == sale_id)
            .cloned()
            .ok_or_else(|| CostEngineError::sale_not_found(sale_id))
    }

    fn persist_sale_margin(&self, sale_id: &str, update: &MarginUpdate) -> Result<()> {
        let mut data = self.write()?;
        let sale = data
            .sales
            .iter_mut()
            .find(|s| s.id == sale_id)
            .ok_or_else(|| CostEngineError::sale_not_found(sale_id))?;
        sale.weight_kg = Some(update.weight_kg);
        sale.margins = Some(update.margins);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(id: &str, project: &str, on: NaiveDate, category: SaleCategory) -> Sale {
        Sale {
            id: id.to_string(),
            project_id: project.to_string(),
            date: on,
            amount: 1_000.0,
            category,
            weight_kg: Some(10.0),
            margins: None,
        }
    }

    #[test]
    fn test_missing_entities_are_not_found() {
        let ledger = InMemoryLedger::default();
        assert!(matches!(
            ledger.get_project("nope"),
            Err(CostEngineError::NotFound { entity: "Project", .. })
        ));
        assert!(matches!(
            ledger.get_sale("nope"),
            Err(CostEngineError::NotFound { entity: "Sale", .. })
        ));
    }

    #[test]
    fn test_sales_filtered_by_project_category_and_window() {
        let ledger = InMemoryLedger::default();
        ledger
            .insert_sale(sale("b", "farm", date(2024, 3, 20), SaleCategory::LivestockSale))
            .unwrap();
        ledger
            .insert_sale(sale("a", "farm", date(2024, 3, 5), SaleCategory::LivestockSale))
            .unwrap();
        ledger
            .insert_sale(sale("c", "farm", date(2024, 3, 6), SaleCategory::Subsidy))
            .unwrap();
        ledger
            .insert_sale(sale("d", "other", date(2024, 3, 6), SaleCategory::LivestockSale))
            .unwrap();
        ledger
            .insert_sale(sale("e", "farm", date(2024, 4, 1), SaleCategory::LivestockSale))
            .unwrap();

        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let ids: Vec<String> = ledger
            .get_sales_in_window("farm", &window, SaleCategory::LivestockSale)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_persist_writes_weight_and_margins() {
        let ledger = InMemoryLedger::default();
        ledger
            .insert_sale(sale("a", "farm", date(2024, 3, 5), SaleCategory::LivestockSale))
            .unwrap();

        let update = MarginUpdate {
            weight_kg: 12.5,
            margins: SaleMargins {
                margin_opex: 42.0,
                ..SaleMargins::default()
            },
        };
        ledger.persist_sale_margin("a", &update).unwrap();

        let stored = ledger.get_sale("a").unwrap();
        assert_eq!(stored.weight_kg, Some(12.5));
        assert_eq!(stored.margins.unwrap().margin_opex, 42.0);
        assert!(ledger.persist_sale_margin("zz", &update).is_err());
    }

    #[test]
    fn test_json_round_trip_and_validation() {
        let json = r#"{
            "projects": [{ "id": "farm", "default_amortization_months": 24 }],
            "expenses": [{
                "id": "e1", "project_id": "farm", "amount": 5000.0,
                "date": "2024-01-10", "category": "feed"
            }]
        }"#;
        let ledger = InMemoryLedger::from_json_str(json).unwrap();
        assert_eq!(
            ledger.get_project("farm").unwrap().default_amortization_months,
            Some(24)
        );
        assert_eq!(ledger.get_expenses("farm").unwrap().len(), 1);
        assert!(ledger.to_json().unwrap().contains("\"feed\""));

        let bad = r#"{ "expenses": [{
            "id": "e1", "project_id": "farm", "amount": -1.0,
            "date": "2024-01-10", "category": "feed"
        }] }"#;
        assert!(matches!(
            InMemoryLedger::from_json_str(bad),
            Err(CostEngineError::InvalidAmount { .. })
        ));
    }
}
