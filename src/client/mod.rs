//! Evaluation service client
//!
//! This module provides the contract with the upstream evaluation service:
//! - Auth endpoint: exchanges client credentials for a bearer token
//! - Stocks endpoint: price history for a ticker over a look-back window
//!
//! The contract is a trait so the credential cache and fetcher can run
//! against a mock in tests.

mod evaluation;
#[cfg(test)]
pub mod mock;

pub use evaluation::{parse_auth_response, parse_price_history, EvaluationClient};
#[cfg(test)]
pub use mock::MockUpstream;

use crate::config::Credentials;
use crate::error::UpstreamError;
use crate::types::PriceHistory;
use async_trait::async_trait;
use std::time::Duration;

/// Token issued by the auth endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub access_token: String,
    /// Lifetime reported by the service
    pub expires_in: Duration,
}

/// Operations the service needs from the evaluation API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Exchange client credentials for a bearer token
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthGrant, UpstreamError>;

    /// Price samples for `ticker` over the last `minutes`
    async fn price_history(
        &self,
        ticker: &str,
        minutes: u32,
        token: &str,
    ) -> Result<PriceHistory, UpstreamError>;
}
