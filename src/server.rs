//! HTTP front end
//!
//! Thin axum layer over [`AggregationService`]:
//! - `GET /stocks/{ticker}?minutes=m`
//! - `GET /stockcorrelation?minutes=m&ticker=A&ticker=B`
//! - `GET /health`

use crate::config::ServerConfig;
use crate::error::AggError;
use crate::service::AggregationService;
use crate::types::{AveragePriceResponse, CorrelationResponse};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Service error tagged with the summary shown for the failed route
#[derive(Debug)]
pub struct ApiError {
    summary: &'static str,
    source: AggError,
}

impl ApiError {
    fn new(summary: &'static str, source: AggError) -> Self {
        Self { summary, source }
    }

    pub fn status(&self) -> StatusCode {
        match &self.source {
            AggError::Validation(_) => StatusCode::BAD_REQUEST,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.source {
            AggError::Validation(msg) => json!({ "error": msg }),
            other => json!({ "error": self.summary, "details": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Query parameters shared by both routes
#[derive(Debug, Default, PartialEq)]
pub struct StockQuery {
    pub tickers: Vec<String>,
    pub minutes: Option<i64>,
}

impl StockQuery {
    /// Parse a raw query string; `ticker` may repeat
    pub fn parse(raw: Option<&str>) -> Result<Self, AggError> {
        let mut query = StockQuery::default();
        let Some(raw) = raw else {
            return Ok(query);
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "ticker" => query.tickers.push(value.into_owned()),
                "minutes" if value.trim().is_empty() => {}
                "minutes" => {
                    let minutes = value.trim().parse::<i64>().map_err(|_| {
                        AggError::Validation(format!("minutes must be an integer, got {:?}", value))
                    })?;
                    query.minutes = Some(minutes);
                }
                _ => {}
            }
        }

        Ok(query)
    }
}

/// Assemble the API router
pub fn router(service: Arc<AggregationService>) -> Router {
    Router::new()
        .route("/stocks/{ticker}", get(average_price))
        .route("/stockcorrelation", get(correlation))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: &ServerConfig, service: Arc<AggregationService>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Stock price API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping");
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn average_price(
    State(service): State<Arc<AggregationService>>,
    Path(ticker): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<AveragePriceResponse>, ApiError> {
    const SUMMARY: &str = "Failed to retrieve stock prices";

    let query = StockQuery::parse(raw.as_deref()).map_err(|e| ApiError::new(SUMMARY, e))?;
    let minutes = service
        .resolve_minutes(query.minutes)
        .map_err(|e| ApiError::new(SUMMARY, e))?;

    service
        .get_average_price(&ticker, minutes)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(SUMMARY, e))
}

async fn correlation(
    State(service): State<Arc<AggregationService>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<CorrelationResponse>, ApiError> {
    const SUMMARY: &str = "Failed to calculate stock correlation";

    let query = StockQuery::parse(raw.as_deref()).map_err(|e| ApiError::new(SUMMARY, e))?;
    let minutes = service
        .resolve_minutes(query.minutes)
        .map_err(|e| ApiError::new(SUMMARY, e))?;

    service
        .get_correlation(&query.tickers, minutes)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(SUMMARY, e))
}
