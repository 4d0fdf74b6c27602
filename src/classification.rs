use crate::schema::{CostClass, Expense, ExpenseCategory};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 10] = [
        ExpenseCategory::Feed,
        ExpenseCategory::Vaccines,
        ExpenseCategory::Medication,
        ExpenseCategory::Veterinary,
        ExpenseCategory::Maintenance,
        ExpenseCategory::SmallEquipment,
        ExpenseCategory::BuildingWorks,
        ExpenseCategory::HeavyEquipment,
        ExpenseCategory::BreedingStock,
        ExpenseCategory::Other,
    ];

    /// Built-in classification: buildings, heavy machinery and breeding stock are capital.
    pub fn default_class(self) -> CostClass {
        match self {
            ExpenseCategory::BuildingWorks
            | ExpenseCategory::HeavyEquipment
            | ExpenseCategory::BreedingStock => CostClass::Capex,
            ExpenseCategory::Feed
            | ExpenseCategory::Vaccines
            | ExpenseCategory::Medication
            | ExpenseCategory::Veterinary
            | ExpenseCategory::Maintenance
            | ExpenseCategory::SmallEquipment
            | ExpenseCategory::Other => CostClass::Opex,
        }
    }
}

/// Category to OPEX/CAPEX lookup, the built-in table plus per-deployment overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct ClassificationTable {
    #[serde(default)]
    pub overrides: BTreeMap<ExpenseCategory, CostClass>,
}

impl ClassificationTable {
    pub fn with_override(mut self, category: ExpenseCategory, class: CostClass) -> Self {
        self.overrides.insert(category, class);
        self
    }

    pub fn classify_category(&self, category: ExpenseCategory) -> CostClass {
        self.overrides
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_class())
    }

    /// An explicit classification on the expense wins over the table.
    pub fn classify(&self, expense: &Expense) -> CostClass {
        expense
            .classification
            .unwrap_or_else(|| self.classify_category(expense.category))
    }
}
