//! Tests for the aggregation service

use super::*;
use crate::client::MockUpstream;
use crate::config::{Credentials, QueryConfig, ServerConfig, UpstreamConfig};
use tokio_test::{assert_err, assert_ok};

const EPS: f64 = 1e-9;

fn test_config() -> Config {
    Config {
        upstream: UpstreamConfig::default(),
        credentials: Credentials {
            email: "student@example.edu".to_string(),
            name: "A Student".to_string(),
            roll_no: "21CS001".to_string(),
            access_code: "abcd".to_string(),
            client_id: "client-123".to_string(),
            client_secret: "s3cret".to_string(),
        },
        server: ServerConfig::default(),
        query: QueryConfig::default(),
    }
}

fn service_over(mock: &Arc<MockUpstream>) -> AggregationService {
    AggregationService::with_api(&test_config(), mock.clone())
}

fn tickers(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_average_price_end_to_end() {
    let mock = Arc::new(MockUpstream::new().with_prices("X", &[100.0, 102.0, 101.0]));
    let service = service_over(&mock);

    let resp = assert_ok!(service.get_average_price("X", 50).await);
    assert!((resp.average_stock_price - 101.0).abs() < EPS);
    assert_eq!(resp.price_history.len(), 3);

    let calls = mock.history_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].minutes, 50);
}

#[tokio::test]
async fn test_average_price_empty_history() {
    let mock = Arc::new(MockUpstream::new().with_prices("X", &[]));
    let service = service_over(&mock);

    let resp = assert_ok!(service.get_average_price("X", 10).await);
    assert_eq!(resp.average_stock_price, 0.0);
    assert!(resp.price_history.is_empty());
}

#[tokio::test]
async fn test_average_price_response_shape() {
    let mock = Arc::new(MockUpstream::new().with_prices("X", &[10.0, 20.0]));
    let service = service_over(&mock);

    let resp = assert_ok!(service.get_average_price("X", 50).await);
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["averageStockPrice"], 15.0);
    assert_eq!(json["priceHistory"][0]["price"], 10.0);
    assert!(json["priceHistory"][0]["lastUpdatedAt"].is_string());
}

#[tokio::test]
async fn test_average_price_fetch_failure() {
    let mock = Arc::new(MockUpstream::new().with_failing_ticker("X", 500));
    let service = service_over(&mock);

    let err = assert_err!(service.get_average_price("X", 50).await);
    assert!(matches!(err, AggError::Fetch { ref ticker, .. } if ticker == "X"));
}

#[tokio::test]
async fn test_average_price_auth_failure() {
    let mock = Arc::new(MockUpstream::new().with_auth_failure());
    let service = service_over(&mock);

    let err = assert_err!(service.get_average_price("X", 50).await);
    assert!(matches!(err, AggError::Auth(_)));
    assert!(mock.history_calls().is_empty());
}

#[tokio::test]
async fn test_blank_ticker_rejected() {
    let mock = Arc::new(MockUpstream::new());
    let service = service_over(&mock);

    let err = assert_err!(service.get_average_price("  ", 50).await);
    assert!(matches!(err, AggError::Validation(_)));
    assert_eq!(mock.auth_calls(), 0);
}

#[tokio::test]
async fn test_correlation_requires_two_tickers() {
    let mock = Arc::new(MockUpstream::new().with_prices("A", &[1.0, 2.0]));
    let service = service_over(&mock);

    for symbols in [vec!["A"], vec!["A", "B", "C"], vec![]] {
        let err = assert_err!(service.get_correlation(&tickers(&symbols), 50).await);
        assert!(matches!(err, AggError::Validation(_)));
    }

    assert_eq!(mock.auth_calls(), 0);
    assert!(mock.history_calls().is_empty());
}

#[tokio::test]
async fn test_correlation_rejects_duplicate_ticker() {
    let mock = Arc::new(MockUpstream::new().with_prices("A", &[1.0, 2.0]));
    let service = service_over(&mock);

    let err = assert_err!(service.get_correlation(&tickers(&["A", " A"]), 50).await);
    assert!(err.to_string().contains("distinct"));
    assert_eq!(mock.auth_calls(), 0);
}

#[tokio::test]
async fn test_correlation_of_two_tickers() {
    let mock = Arc::new(
        MockUpstream::new()
            .with_prices("AMD", &[1.0, 2.0, 3.0, 4.0])
            .with_prices("NVDA", &[10.0, 20.0, 30.0]),
    );
    let service = service_over(&mock);

    let resp = assert_ok!(service.get_correlation(&tickers(&["AMD", "NVDA"]), 30).await);
    let r = resp.correlation.unwrap();
    assert!((r - 1.0).abs() < EPS);

    let amd = &resp.stocks["AMD"];
    assert!((amd.average_price - 2.5).abs() < EPS);
    assert_eq!(amd.price_history.len(), 4);
    let nvda = &resp.stocks["NVDA"];
    assert!((nvda.average_price - 20.0).abs() < EPS);

    // one token serves both fetches
    assert_eq!(mock.auth_calls(), 1);
    let calls = mock.history_calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.minutes == 30 && c.token == "token-1"));
}

#[tokio::test]
async fn test_undefined_correlation_serializes_as_null() {
    let mock = Arc::new(
        MockUpstream::new()
            .with_prices("FLAT", &[5.0, 5.0, 5.0])
            .with_prices("UP", &[1.0, 2.0, 3.0]),
    );
    let service = service_over(&mock);

    let resp = assert_ok!(service.get_correlation(&tickers(&["FLAT", "UP"]), 50).await);
    assert_eq!(resp.correlation, None);

    let json = serde_json::to_value(&resp).unwrap();
    assert!(json["correlation"].is_null());
    assert_eq!(json["stocks"]["FLAT"]["averagePrice"], 5.0);
    assert_eq!(json["stocks"]["FLAT"]["priceStdDev"], 0.0);
    assert_eq!(json["stocks"]["UP"]["priceHistory"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_correlation_fails_when_either_fetch_fails() {
    let mock = Arc::new(
        MockUpstream::new()
            .with_prices("AMD", &[1.0, 2.0])
            .with_failing_ticker("NVDA", 502),
    );
    let service = service_over(&mock);

    let err = assert_err!(service.get_correlation(&tickers(&["AMD", "NVDA"]), 50).await);
    assert!(matches!(err, AggError::Fetch { ref ticker, .. } if ticker == "NVDA"));
}

#[tokio::test]
async fn test_resolve_minutes() {
    let mock = Arc::new(MockUpstream::new());
    let service = service_over(&mock);

    assert_eq!(service.resolve_minutes(None).unwrap(), 50);
    assert_eq!(service.resolve_minutes(Some(10)).unwrap(), 10);
    assert!(matches!(service.resolve_minutes(Some(0)), Err(AggError::Validation(_))));
    assert!(matches!(service.resolve_minutes(Some(-5)), Err(AggError::Validation(_))));
    assert!(matches!(
        service.resolve_minutes(Some(i64::MAX)),
        Err(AggError::Validation(_))
    ));
}
