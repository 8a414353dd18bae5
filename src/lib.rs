//! Stock Price Aggregator
//!
//! Proxies the stock evaluation service and derives average prices and
//! pairwise Pearson correlations for the dashboard.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod server;
pub mod service;
pub mod stats;
pub mod types;
