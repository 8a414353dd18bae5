//! HTTP client for the evaluation service

use super::{AuthGrant, UpstreamApi};
use crate::config::{Credentials, UpstreamConfig};
use crate::error::{AggError, Result, UpstreamError};
use crate::types::{PriceHistory, PricePoint};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

/// reqwest-backed evaluation API client
pub struct EvaluationClient {
    http: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryBody {
    Series(Vec<PricePoint>),
    // returned when `minutes` is omitted
    Latest { stock: PricePoint },
}

impl EvaluationClient {
    /// Create a new evaluation client
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| AggError::Config(format!("invalid upstream.base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AggError::Config(format!(
                "upstream.base_url cannot be a base: {}",
                base_url
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AggError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// `{base}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl UpstreamApi for EvaluationClient {
    async fn authenticate(&self, credentials: &Credentials) -> std::result::Result<AuthGrant, UpstreamError> {
        let url = self.endpoint(&["auth"]);
        let resp = self.http.post(url).json(credentials).send().await?;
        let body = read_body(resp).await?;

        parse_auth_response(&body)
    }

    async fn price_history(
        &self,
        ticker: &str,
        minutes: u32,
        token: &str,
    ) -> std::result::Result<PriceHistory, UpstreamError> {
        let url = self.endpoint(&["stocks", ticker]);
        let resp = self
            .http
            .get(url)
            .query(&[("minutes", minutes)])
            .bearer_auth(token)
            .send()
            .await?;
        let body = read_body(resp).await?;

        parse_price_history(&body)
    }
}

async fn read_body(resp: Response) -> std::result::Result<String, UpstreamError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(UpstreamError::Unauthorized);
    }

    let body = resp.text().await?;
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }

    Ok(body)
}

/// Parse the auth endpoint's JSON body into a grant
pub fn parse_auth_response(body: &str) -> std::result::Result<AuthGrant, UpstreamError> {
    let parsed: AuthBody =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| UpstreamError::Malformed("missing access_token".to_string()))?;

    let expires_in = match parsed.expires_in {
        Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
        Some(secs) => {
            return Err(UpstreamError::Malformed(format!(
                "non-positive expires_in: {}",
                secs
            )))
        }
        None => return Err(UpstreamError::Malformed("missing expires_in".to_string())),
    };

    Ok(AuthGrant {
        access_token,
        expires_in,
    })
}

/// Parse the stocks endpoint's JSON body, accepting a series or a single latest point
pub fn parse_price_history(body: &str) -> std::result::Result<PriceHistory, UpstreamError> {
    let parsed: HistoryBody =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    Ok(match parsed {
        HistoryBody::Series(points) => points,
        HistoryBody::Latest { stock } => vec![stock],
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
