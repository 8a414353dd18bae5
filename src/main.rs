//! Stock Price Aggregator
//!
//! Serves average-price and correlation queries over the evaluation service.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use stock_aggregator::{config::Config, server, service::AggregationService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stock-aggregator")]
#[command(about = "Average price and correlation service for the stock evaluation API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to ./config.toml, then ~/.config/stock-aggregator)
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the average price of a ticker
    Average {
        /// Ticker symbol
        ticker: String,
        /// Look-back window in minutes
        #[arg(short, long)]
        minutes: Option<i64>,
    },
    /// Show the correlation between two tickers
    Correlation {
        /// First ticker symbol
        ticker_a: String,
        /// Second ticker symbol
        ticker_b: String,
        /// Look-back window in minutes
        #[arg(short, long)]
        minutes: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Pick up credentials from .env when present
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = match &cli.config {
        Some(path) => Config::load(shellexpand::tilde(path).into_owned())?,
        None => Config::load_default()?,
    };
    let service = Arc::new(AggregationService::from_config(&config)?);

    match cli.command {
        Commands::Serve { port } => {
            let mut server_config = config.server.clone();
            if let Some(port) = port {
                server_config.port = port;
            }
            server::serve(&server_config, service).await
        }
        Commands::Average { ticker, minutes } => show_average(&service, &ticker, minutes).await,
        Commands::Correlation {
            ticker_a,
            ticker_b,
            minutes,
        } => show_correlation(&service, ticker_a, ticker_b, minutes).await,
    }
}

async fn show_average(
    service: &AggregationService,
    ticker: &str,
    minutes: Option<i64>,
) -> anyhow::Result<()> {
    let minutes = service.resolve_minutes(minutes)?;
    let resp = service.get_average_price(ticker, minutes).await?;

    println!("\n📈 {} over the last {} minutes\n", ticker, minutes);
    println!("{:<32} {:>12}", "Updated", "Price");
    println!("{}", "-".repeat(45));
    for point in &resp.price_history {
        println!(
            "{:<32} {:>12.4}",
            point.last_updated_at.to_rfc3339(),
            point.price
        );
    }
    println!("\nSamples: {}", resp.price_history.len());
    println!("Average: {:.4}", resp.average_stock_price);

    Ok(())
}

async fn show_correlation(
    service: &AggregationService,
    ticker_a: String,
    ticker_b: String,
    minutes: Option<i64>,
) -> anyhow::Result<()> {
    let minutes = service.resolve_minutes(minutes)?;
    let tickers = [ticker_a, ticker_b];
    let resp = service.get_correlation(&tickers, minutes).await?;

    println!("\n🔗 {} vs {} over the last {} minutes\n", tickers[0], tickers[1], minutes);
    match resp.correlation {
        Some(r) => println!("Correlation: {:.4}", r),
        None => println!("Correlation: undefined (too few samples or a flat series)"),
    }

    println!("\n{:<10} {:>8} {:>12} {:>12}", "Ticker", "Samples", "Average", "Std Dev");
    println!("{}", "-".repeat(45));
    for (ticker, stock) in &resp.stocks {
        println!(
            "{:<10} {:>8} {:>12.4} {:>12.4}",
            ticker,
            stock.price_history.len(),
            stock.average_price,
            stock.price_std_dev
        );
    }

    Ok(())
}
