use crate::error::{CostEngineError, Result};
use crate::utils::{first_day_of_month, last_day_of_month, parse_period_string, sub_days};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub type EntityId = String;

pub const MAX_AMORTIZATION_MONTHS: u32 = 360;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CostClass {
    #[schemars(description = "Operating expenditure, consumed within the period it is dated in")]
    Opex,

    #[schemars(description = "Capital expenditure, spread evenly over its amortization length")]
    Capex,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Feed,
    Vaccines,
    Medication,
    Veterinary,
    Maintenance,
    SmallEquipment,
    #[schemars(description = "Construction or refitting of farm buildings")]
    BuildingWorks,
    #[schemars(description = "Machinery and other heavy equipment")]
    HeavyEquipment,
    #[schemars(description = "Purchase of breeding animals or piglets")]
    BreedingStock,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChargeFrequency {
    Monthly,
    Quarterly,
    Annual,
}

impl ChargeFrequency {
    pub fn months_per_period(self) -> u32 {
        match self {
            ChargeFrequency::Monthly => 1,
            ChargeFrequency::Quarterly => 3,
            ChargeFrequency::Annual => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Active,
    Suspended,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaleCategory {
    #[schemars(description = "Sale of live animals; the only category whose weight counts as kilograms sold")]
    LivestockSale,
    OtherSale,
    Subsidy,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Expense {
    pub id: EntityId,
    pub project_id: EntityId,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: ExpenseCategory,

    #[serde(default)]
    #[schemars(
        description = "Explicit OPEX/CAPEX classification. When absent the category lookup table decides."
    )]
    pub classification: Option<CostClass>,

    #[serde(default)]
    #[schemars(
        description = "Amortization length in months (1-360). Only meaningful for CAPEX; falls back to the project default."
    )]
    pub amortization_months: Option<u32>,
}

impl Expense {
    pub fn validate(&self) -> Result<()> {
        ensure_amount("expense.amount", self.amount)?;
        if let Some(months) = self.amortization_months {
            if !(1..=MAX_AMORTIZATION_MONTHS).contains(&months) {
                return Err(CostEngineError::InvalidAmortizationMonths(months));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FixedCharge {
    pub id: EntityId,
    pub project_id: EntityId,
    pub amount: f64,
    pub frequency: ChargeFrequency,
    pub start_date: NaiveDate,
    pub status: ChargeStatus,
}

impl FixedCharge {
    pub fn is_active(&self) -> bool {
        self.status == ChargeStatus::Active
    }

    pub fn validate(&self) -> Result<()> {
        ensure_amount("fixed_charge.amount", self.amount)
    }
}

/// Derived cost and margin figures cached on a sale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
pub struct SaleMargins {
    pub cost_per_kg_opex: f64,
    pub cost_per_kg_full: f64,
    pub real_cost_opex: f64,
    pub real_cost_full: f64,
    pub margin_opex: f64,
    pub margin_full: f64,
    pub margin_opex_percent: f64,
    pub margin_full_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Sale {
    pub id: EntityId,
    pub project_id: EntityId,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: SaleCategory,

    #[serde(default)]
    #[schemars(description = "Live weight sold in kilograms. Must be positive when present.")]
    pub weight_kg: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Cached output of the margin calculation. Never an input.")]
    pub margins: Option<SaleMargins>,
}

impl Sale {
    pub fn is_livestock_sale(&self) -> bool {
        self.category == SaleCategory::LivestockSale
    }

    /// Weight in kilograms, or `None` when missing or not positive.
    pub fn positive_weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| *w > 0.0)
    }

    /// A sale takes part in margin recalculation when it is a livestock sale with a weight.
    pub fn qualifies_for_margin(&self) -> bool {
        self.is_livestock_sale() && self.positive_weight().is_some()
    }

    pub fn validate(&self) -> Result<()> {
        ensure_amount("sale.amount", self.amount)?;
        match self.weight_kg {
            Some(w) if !(w.is_finite() && w > 0.0) => Err(CostEngineError::InvalidWeight(w)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Project {
    pub id: EntityId,

    #[serde(default)]
    #[schemars(description = "Amortization length used for CAPEX expenses that do not carry their own.")]
    pub default_amortization_months: Option<u32>,

    #[serde(default)]
    #[schemars(description = "Manually maintained OPEX cost per kg, used when a sale's look-back window has no data.")]
    pub avg_cost_per_kg_opex: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Manually maintained full (OPEX + CAPEX) cost per kg.")]
    pub avg_cost_per_kg_full: Option<f64>,
}

impl Project {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            default_amortization_months: None,
            avg_cost_per_kg_opex: None,
            avg_cost_per_kg_full: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(months) = self.default_amortization_months {
            if !(1..=MAX_AMORTIZATION_MONTHS).contains(&months) {
                return Err(CostEngineError::InvalidAmortizationMonths(months));
            }
        }
        if let Some(v) = self.avg_cost_per_kg_opex {
            ensure_amount("project.avg_cost_per_kg_opex", v)?;
        }
        if let Some(v) = self.avg_cost_per_kg_full {
            ensure_amount("project.avg_cost_per_kg_full", v)?;
        }
        Ok(())
    }
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(try_from = "DateWindowFields")]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize, JsonSchema)]
struct DateWindowFields {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateWindowFields> for DateWindow {
    type Error = CostEngineError;

    fn try_from(fields: DateWindowFields) -> Result<Self> {
        Self::new(fields.start, fields.end)
    }
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CostEngineError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days before `end`, plus `end` itself.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self> {
        let start = sub_days(end, u64::from(days))?;
        Ok(Self { start, end })
    }

    pub fn month_of(date: NaiveDate) -> Result<Self> {
        Ok(Self {
            start: first_day_of_month(date.year(), date.month())?,
            end: last_day_of_month(date.year(), date.month())?,
        })
    }

    pub fn calendar_year(year: i32) -> Result<Self> {
        Ok(Self {
            start: first_day_of_month(year, 1)?,
            end: last_day_of_month(year, 12)?,
        })
    }

    /// Builds a window from "YYYY-MM" or "YYYY-MM:YYYY-MM".
    pub fn from_period(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub fixed_charges: Vec<FixedCharge>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl LedgerSnapshot {
    pub fn validate(&self) -> Result<()> {
        for project in &self.projects {
            project.validate()?;
        }
        for expense in &self.expenses {
            expense.validate()?;
        }
        for charge in &self.fixed_charges {
            charge.validate()?;
        }
        for sale in &self.sales {
            sale.validate()?;
        }
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LedgerSnapshot)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

fn ensure_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CostEngineError::InvalidAmount {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
