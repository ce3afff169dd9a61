use deribit_api::core::config::DeribitConfig;
use deribit_api::exchanges::deribit::models::{BookUpdate, TestParams};
use deribit_api::exchanges::deribit::{build_ws_client, EVENT_CONNECTED, EVENT_DISCONNECTED};
use tracing::Level;

const CHANNEL: &str = "book.BTC-PERPETUAL.100ms";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DeribitConfig::from_env_file(".env")?;
    tracing_subscriber::fmt()
        .with_max_level(if config.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    println!("📡 Deribit WebSocket order book stream");
    println!("=====================================\n");

    let client = build_ws_client(config).await?;
    println!("✅ Connected, server time {}", client.get_time().await?);
    println!("🔧 API version {}", client.test(&TestParams::default()).await?.version);

    client.on(EVENT_CONNECTED, |_| println!("🔄 Reconnected"));
    client.on(EVENT_DISCONNECTED, |_| println!("⚠️  Disconnected"));
    client.on_typed(CHANNEL, |update: BookUpdate| {
        let best_bid = update.bids.first().map(|level| level.1);
        let best_ask = update.asks.first().map(|level| level.1);
        println!(
            "📊 {} change {} bids {} asks {} (top {:?} / {:?})",
            update.instrument_name,
            update.change_id,
            update.bids.len(),
            update.asks.len(),
            best_bid,
            best_ask
        );
    });

    let confirmed = client.subscribe([CHANNEL]).await?;
    println!("📬 Subscribed to {:?}\n", confirmed);

    tokio::signal::ctrl_c().await?;
    println!("\n👋 Closing");
    client.close().await;
    Ok(())
}
