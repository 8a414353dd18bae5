//! Aggregation service
//!
//! Answers the two dashboard queries:
//! - Average price of one ticker over a look-back window
//! - Pearson correlation between two tickers over the same window

#[cfg(test)]
mod tests;

use crate::auth::CredentialCache;
use crate::client::{EvaluationClient, UpstreamApi};
use crate::config::Config;
use crate::error::{AggError, Result};
use crate::fetcher::PriceFetcher;
use crate::stats;
use crate::types::{AveragePriceResponse, CorrelationResponse, StockSummary};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tickers a correlation query compares
pub const CORRELATION_TICKERS: usize = 2;

pub struct AggregationService {
    fetcher: PriceFetcher,
    default_minutes: u32,
}

impl AggregationService {
    /// Build the service against the configured evaluation service
    pub fn from_config(config: &Config) -> Result<Self> {
        let api: Arc<dyn UpstreamApi> = Arc::new(EvaluationClient::new(&config.upstream)?);
        Ok(Self::with_api(config, api))
    }

    /// Build the service over any upstream implementation
    pub fn with_api(config: &Config, api: Arc<dyn UpstreamApi>) -> Self {
        let credentials = Arc::new(CredentialCache::new(
            Arc::clone(&api),
            config.credentials.clone(),
            config.upstream.expiry_buffer(),
        ));
        let fetcher = PriceFetcher::new(api, credentials, config.upstream.timeout());

        Self {
            fetcher,
            default_minutes: config.query.default_minutes,
        }
    }

    /// Resolve the look-back window of a request: absent means the default
    pub fn resolve_minutes(&self, minutes: Option<i64>) -> Result<u32> {
        match minutes {
            None => Ok(self.default_minutes),
            Some(m) if m > 0 => u32::try_from(m)
                .map_err(|_| AggError::Validation(format!("minutes out of range: {}", m))),
            Some(m) => Err(AggError::Validation(format!(
                "minutes must be a positive integer, got {}",
                m
            ))),
        }
    }

    /// Average price of `ticker` over the last `minutes`
    pub async fn get_average_price(&self, ticker: &str, minutes: u32) -> Result<AveragePriceResponse> {
        let ticker = normalize_ticker(ticker)?;
        let price_history = self.fetcher.fetch_history(ticker, minutes).await?;
        let average_stock_price = stats::average_price(&price_history);

        tracing::debug!(
            "{}: average {:.4} over {} samples ({}m)",
            ticker,
            average_stock_price,
            price_history.len(),
            minutes
        );

        Ok(AveragePriceResponse {
            average_stock_price,
            price_history,
        })
    }

    /// Correlation between exactly two distinct tickers over the last `minutes`
    pub async fn get_correlation(&self, tickers: &[String], minutes: u32) -> Result<CorrelationResponse> {
        let (ticker_a, ticker_b) = validate_pair(tickers)?;

        let (history_a, history_b) = tokio::try_join!(
            self.fetcher.fetch_history(ticker_a, minutes),
            self.fetcher.fetch_history(ticker_b, minutes),
        )?;

        let result = stats::correlate(ticker_a, &history_a, ticker_b, &history_b);
        match result.coefficient {
            Some(r) => tracing::debug!(
                "{}/{}: correlation {:.4} over {} samples",
                ticker_a,
                ticker_b,
                r,
                result.sample_count
            ),
            None => tracing::debug!(
                "{}/{}: correlation undefined over {} samples",
                ticker_a,
                ticker_b,
                result.sample_count
            ),
        }

        let mut stocks = BTreeMap::new();
        stocks.insert(ticker_a.to_string(), summarize(history_a));
        stocks.insert(ticker_b.to_string(), summarize(history_b));

        Ok(CorrelationResponse {
            correlation: result.coefficient,
            stocks,
        })
    }
}

fn summarize(price_history: crate::types::PriceHistory) -> StockSummary {
    StockSummary {
        average_price: stats::average_price(&price_history),
        price_std_dev: stats::price_std_dev(&price_history),
        price_history,
    }
}

fn normalize_ticker(ticker: &str) -> Result<&str> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AggError::Validation("ticker must not be empty".to_string()));
    }
    Ok(ticker)
}

fn validate_pair(tickers: &[String]) -> Result<(&str, &str)> {
    let [a, b] = tickers else {
        return Err(AggError::Validation(format!(
            "API requires {} tickers for analysis, got {}",
            CORRELATION_TICKERS,
            tickers.len()
        )));
    };

    let (a, b) = (normalize_ticker(a)?, normalize_ticker(b)?);
    if a == b {
        return Err(AggError::Validation(format!(
            "API requires {} distinct tickers, got {} twice",
            CORRELATION_TICKERS, a
        )));
    }

    Ok((a, b))
}
