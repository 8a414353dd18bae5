//! Core data types shared across the service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One price sample as reported by the evaluation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    pub last_updated_at: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(price: f64, last_updated_at: DateTime<Utc>) -> Self {
        Self {
            price,
            last_updated_at,
        }
    }
}

/// Samples for one ticker in upstream order (not re-sorted)
pub type PriceHistory = Vec<PricePoint>;

/// Pearson coefficient between two tickers; `None` when undefined
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub coefficient: Option<f64>,
    pub ticker_a: String,
    pub ticker_b: String,
    /// Number of positions compared after truncation
    pub sample_count: usize,
}

impl CorrelationResult {
    pub fn is_defined(&self) -> bool {
        self.coefficient.is_some()
    }
}

/// Response of the single-ticker average query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragePriceResponse {
    pub average_stock_price: f64,
    pub price_history: PriceHistory,
}

/// Per-ticker block inside a correlation response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub average_price: f64,
    pub price_history: PriceHistory,
    pub price_std_dev: f64,
}

/// Response of the two-ticker correlation query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResponse {
    /// Serialized as `null` when the coefficient is undefined
    pub correlation: Option<f64>,
    pub stocks: BTreeMap<String, StockSummary>,
}
