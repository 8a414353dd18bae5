//! Mock evaluation service for testing
//!
//! Serves scripted price histories and issues numbered tokens while
//! recording every call, for:
//! - Unit tests of the credential cache and fetcher without network calls
//! - Integration tests with controlled upstream failures

use super::{AuthGrant, UpstreamApi};
use crate::config::Credentials;
use crate::error::UpstreamError;
use crate::types::{PriceHistory, PricePoint};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// One recorded call to the stocks endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryCall {
    pub ticker: String,
    pub minutes: u32,
    pub token: String,
}

#[derive(Debug, Default)]
struct MockState {
    auth_calls: usize,
    history_calls: Vec<HistoryCall>,
    prices: HashMap<String, PriceHistory>,
    failing_tickers: HashMap<String, u16>,
    revoked_tokens: HashSet<String>,
    reject_next: usize,
}

/// In-memory stand-in for the evaluation service
pub struct MockUpstream {
    state: Mutex<MockState>,
    token_ttl: Duration,
    auth_failure: bool,
    latency: Duration,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            token_ttl: Duration::from_secs(3600),
            auth_failure: false,
            latency: Duration::ZERO,
        }
    }

    /// Serve `prices` for `ticker`, one sample every 30 seconds
    pub fn with_prices(self, ticker: &str, prices: &[f64]) -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 5, 8, 4, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let history = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(p, start + ChronoDuration::seconds(i as i64 * 30)))
            .collect();
        self.state.lock().prices.insert(ticker.to_string(), history);
        self
    }

    /// Lifetime reported for every issued token
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Make the auth endpoint fail with a malformed response
    pub fn with_auth_failure(mut self) -> Self {
        self.auth_failure = true;
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer every history request for `ticker` with `status`
    pub fn with_failing_ticker(self, ticker: &str, status: u16) -> Self {
        self.state
            .lock()
            .failing_tickers
            .insert(ticker.to_string(), status);
        self
    }

    /// Answer the next `count` history requests with 401
    pub fn reject_next(&self, count: usize) {
        self.state.lock().reject_next = count;
    }

    /// Treat `token` as expired on the service side
    pub fn revoke(&self, token: &str) {
        self.state.lock().revoked_tokens.insert(token.to_string());
    }

    pub fn auth_calls(&self) -> usize {
        self.state.lock().auth_calls
    }

    pub fn history_calls(&self) -> Vec<HistoryCall> {
        self.state.lock().history_calls.clone()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamApi for MockUpstream {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<AuthGrant, UpstreamError> {
        let issued = {
            let mut state = self.state.lock();
            state.auth_calls += 1;
            state.auth_calls
        };
        self.simulate_latency().await;

        if self.auth_failure {
            return Err(UpstreamError::Malformed("missing access_token".to_string()));
        }

        Ok(AuthGrant {
            access_token: format!("token-{}", issued),
            expires_in: self.token_ttl,
        })
    }

    async fn price_history(
        &self,
        ticker: &str,
        minutes: u32,
        token: &str,
    ) -> Result<PriceHistory, UpstreamError> {
        self.simulate_latency().await;

        let mut state = self.state.lock();
        state.history_calls.push(HistoryCall {
            ticker: ticker.to_string(),
            minutes,
            token: token.to_string(),
        });

        if state.reject_next > 0 {
            state.reject_next -= 1;
            return Err(UpstreamError::Unauthorized);
        }
        if state.revoked_tokens.contains(token) {
            return Err(UpstreamError::Unauthorized);
        }
        if let Some(&status) = state.failing_tickers.get(ticker) {
            return Err(UpstreamError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }

        state
            .prices
            .get(ticker)
            .cloned()
            .ok_or_else(|| UpstreamError::Status {
                status: 404,
                body: format!("unknown ticker {}", ticker),
            })
    }
}
