use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listing_sniper::application::sniper;
use listing_sniper::config::{Args, SniperConfig};
use listing_sniper::infrastructure::binance::BinanceClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; explicit flags win over environment fallbacks.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_sniper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SniperConfig::from_args(Args::parse())?;
    info!(
        "sniping {} at {} (local time), endpoint {}",
        config.symbol, config.order_time, config.endpoint
    );
    if !config.live {
        info!("dry-run mode: orders go to the test endpoint, pass --real to trade");
    }

    let client = BinanceClient::new(&config);
    sniper::run(&config, &client).await?;
    Ok(())
}
