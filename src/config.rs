use crate::classification::ClassificationTable;
use crate::error::{CostEngineError, Result};
use crate::periods::MonthCounting;
use crate::schema::MAX_AMORTIZATION_MONTHS;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_AMORTIZATION_MONTHS: u32 = 36;
pub const DEFAULT_SLIDING_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_FRAGILE_MARGIN_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Amortization length for CAPEX when neither the expense nor the project sets one.")]
    pub default_amortization_months: u32,

    #[schemars(description = "Length in days of the look-back window used to cost a single sale.")]
    pub sliding_window_days: u32,

    #[schemars(description = "How date spans are turned into month counts for proration.")]
    pub month_counting: MonthCounting,

    #[schemars(description = "Never count more months of a CAPEX expense in one window than its amortization length. Off by default.")]
    pub cap_amortization_at_length: bool,

    pub classification: ClassificationTable,

    #[schemars(description = "Gap to market price, in percent, below which performance is reported as fragile.")]
    pub fragile_margin_threshold_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_amortization_months: DEFAULT_AMORTIZATION_MONTHS,
            sliding_window_days: DEFAULT_SLIDING_WINDOW_DAYS,
            month_counting: MonthCounting::default(),
            cap_amortization_at_length: false,
            classification: ClassificationTable::default(),
            fragile_margin_threshold_percent: DEFAULT_FRAGILE_MARGIN_PERCENT,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_AMORTIZATION_MONTHS).contains(&self.default_amortization_months) {
            return Err(CostEngineError::InvalidAmortizationMonths(
                self.default_amortization_months,
            ));
        }
        if self.sliding_window_days == 0 {
            return Err(CostEngineError::InvalidConfig(
                "sliding_window_days must be at least 1".to_string(),
            ));
        }
        if !self.fragile_margin_threshold_percent.is_finite()
            || self.fragile_margin_threshold_percent < 0.0
        {
            return Err(CostEngineError::InvalidConfig(format!(
                "fragile_margin_threshold_percent must be a non-negative number, got {}",
                self.fragile_margin_threshold_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CostClass, ExpenseCategory};

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_amortization_months, 36);
        assert_eq!(config.sliding_window_days, 30);
        assert_eq!(config.month_counting, MonthCounting::ThirtyDay);
        assert!(!config.cap_amortization_at_length);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{
                "default_amortization_months": 60,
                "classification": { "overrides": { "small_equipment": "CAPEX" } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_amortization_months, 60);
        assert_eq!(config.sliding_window_days, 30);
        assert_eq!(
            config
                .classification
                .classify_category(ExpenseCategory::SmallEquipment),
            CostClass::Capex
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "default_amortization_months": 0 }"#),
            Err(CostEngineError::InvalidAmortizationMonths(0))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "sliding_window_days": 0 }"#),
            Err(CostEngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(CostEngineError::SerializationError(_))
        ));
    }
}
