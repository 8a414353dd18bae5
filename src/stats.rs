//! Price statistics
//!
//! Pure functions over price histories: mean, population standard
//! deviation and the Pearson correlation between two tickers.

use crate::types::{CorrelationResult, PricePoint};

/// Arithmetic mean of all prices (0 for an empty history)
pub fn average_price(history: &[PricePoint]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let total: f64 = history.iter().map(|p| p.price).sum();
    total / history.len() as f64
}

/// Population standard deviation of prices (0 for an empty history)
pub fn price_std_dev(history: &[PricePoint]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }

    let mean = average_price(history);
    let variance = history
        .iter()
        .map(|p| (p.price - mean).powi(2))
        .sum::<f64>()
        / history.len() as f64;

    variance.sqrt()
}

/// Pearson correlation coefficient between two histories.
///
/// Both series are cut to their shared length `n` by position; samples are
/// not matched on timestamp. Covariance and variances use the sample
/// (`n - 1`) denominator.
///
/// Returns `None` when the coefficient is undefined: fewer than two paired
/// samples, or a constant series on either side.
pub fn pearson_correlation(a: &[PricePoint], b: &[PricePoint]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }

    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = average_price(a);
    let mean_b = average_price(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (pa, pb) in a.iter().zip(b) {
        let dev_a = pa.price - mean_a;
        let dev_b = pb.price - mean_b;
        cov += dev_a * dev_b;
        var_a += dev_a * dev_a;
        var_b += dev_b * dev_b;
    }

    let denom = (n - 1) as f64;
    cov /= denom;
    let std_a = (var_a / denom).sqrt();
    let std_b = (var_b / denom).sqrt();

    if std_a == 0.0 || std_b == 0.0 {
        return None;
    }

    let r = cov / (std_a * std_b);
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Correlate two tickers' histories
pub fn correlate(
    ticker_a: &str,
    a: &[PricePoint],
    ticker_b: &str,
    b: &[PricePoint],
) -> CorrelationResult {
    CorrelationResult {
        coefficient: pearson_correlation(a, b),
        ticker_a: ticker_a.to_string(),
        ticker_b: ticker_b.to_string(),
        sample_count: a.len().min(b.len()),
    }
}
