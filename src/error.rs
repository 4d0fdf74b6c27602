use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CostEngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid weight {0}: must be a positive number of kilograms")]
    InvalidWeight(f64),

    #[error("Invalid amortization length {0}: must be between 1 and 360 months")]
    InvalidAmortizationMonths(u32),

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ledger storage error: {0}")]
    Storage(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CostEngineError {
    pub fn project_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Project",
            id: id.to_string(),
        }
    }

    pub fn sale_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Sale",
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CostEngineError>;
