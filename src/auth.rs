//! Bearer token cache
//!
//! Holds the single access token issued by the evaluation service and
//! refreshes it on demand. The refresh runs under the cache lock, so
//! concurrent callers that find the token missing or stale wait for one
//! authentication call and share its result.

use crate::client::UpstreamApi;
use crate::config::Credentials;
use crate::error::{AggError, Result, UpstreamError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cached token with its usable lifetime
#[derive(Debug, Clone)]
struct Credential {
    token: String,
    /// Upstream expiry minus the safety buffer
    expires_at: Instant,
}

impl Credential {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Owner of the process-wide access token
pub struct CredentialCache {
    api: Arc<dyn UpstreamApi>,
    credentials: Credentials,
    expiry_buffer: Duration,
    current: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(api: Arc<dyn UpstreamApi>, credentials: Credentials, expiry_buffer: Duration) -> Self {
        Self {
            api,
            credentials,
            expiry_buffer,
            current: Mutex::new(None),
        }
    }

    /// Get a token that is valid right now, authenticating if needed
    pub async fn get_token(&self) -> Result<String> {
        let mut current = self.current.lock().await;

        if let Some(credential) = current.as_ref().filter(|c| c.is_valid()) {
            return Ok(credential.token.clone());
        }

        tracing::info!("Requesting new access token from evaluation service");
        let grant = self
            .api
            .authenticate(&self.credentials)
            .await
            .map_err(|e| {
                tracing::error!("Authentication failed: {}", e);
                AggError::Auth(e)
            })?;

        match grant.expires_in.checked_sub(self.expiry_buffer) {
            Some(lifetime) if !lifetime.is_zero() => {
                let Some(expires_at) = Instant::now().checked_add(lifetime) else {
                    tracing::error!("Token lifetime {}s is out of range", grant.expires_in.as_secs());
                    *current = None;
                    return Err(AggError::Auth(UpstreamError::Malformed(format!(
                        "expires_in out of range: {}",
                        grant.expires_in.as_secs()
                    ))));
                };
                tracing::info!("Access token refreshed, usable for {}s", lifetime.as_secs());
                *current = Some(Credential {
                    token: grant.access_token.clone(),
                    expires_at,
                });
            }
            _ => {
                tracing::warn!(
                    "Token lifetime {}s is within the {}s expiry buffer; not caching it",
                    grant.expires_in.as_secs(),
                    self.expiry_buffer.as_secs()
                );
                *current = None;
            }
        }

        Ok(grant.access_token)
    }

    /// Drop the cached token if it is still the one upstream rejected.
    ///
    /// A token refreshed by another request in the meantime is kept.
    pub async fn invalidate(&self, rejected: &str) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| c.token == rejected) {
            tracing::debug!("Invalidating rejected access token");
            *current = None;
        }
    }

    #[cfg(test)]
    async fn has_valid_token(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(Credential::is_valid)
    }
}
