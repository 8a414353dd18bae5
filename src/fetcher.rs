//! Price history fetcher
//!
//! Retrieves a ticker's price samples with a bearer token from the
//! credential cache. A 401 gets one re-authentication and one retry;
//! every other failure is returned straight away.

use crate::auth::CredentialCache;
use crate::client::UpstreamApi;
use crate::error::{AggError, Result, UpstreamError};
use crate::types::PriceHistory;
use std::sync::Arc;
use std::time::Duration;

/// Retries allowed after the upstream rejects a token
const MAX_AUTH_RETRIES: u32 = 1;

pub struct PriceFetcher {
    api: Arc<dyn UpstreamApi>,
    credentials: Arc<CredentialCache>,
    timeout: Duration,
}

impl PriceFetcher {
    pub fn new(api: Arc<dyn UpstreamApi>, credentials: Arc<CredentialCache>, timeout: Duration) -> Self {
        Self {
            api,
            credentials,
            timeout,
        }
    }

    /// Fetch `ticker`'s price history over the last `minutes` (must be positive)
    pub async fn fetch_history(&self, ticker: &str, minutes: u32) -> Result<PriceHistory> {
        if minutes == 0 {
            return Err(AggError::Validation("minutes must be positive".to_string()));
        }

        let mut retries = 0;
        loop {
            let token = self.credentials.get_token().await?;

            match self.request(ticker, minutes, &token).await {
                Ok(history) => {
                    tracing::debug!("Fetched {} price points for {}", history.len(), ticker);
                    return Ok(history);
                }
                Err(e) if e.is_unauthorized() && retries < MAX_AUTH_RETRIES => {
                    tracing::warn!("Token rejected fetching {}; re-authenticating", ticker);
                    self.credentials.invalidate(&token).await;
                    retries += 1;
                }
                Err(e) => {
                    if retries > 0 {
                        tracing::error!("Error fetching stock prices for {} after retry: {}", ticker, e);
                    } else {
                        tracing::error!("Error fetching stock prices for {}: {}", ticker, e);
                    }
                    return Err(AggError::fetch(ticker, e));
                }
            }
        }
    }

    async fn request(
        &self,
        ticker: &str,
        minutes: u32,
        token: &str,
    ) -> std::result::Result<PriceHistory, UpstreamError> {
        tokio::time::timeout(self.timeout, self.api.price_history(ticker, minutes, token))
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }
}
