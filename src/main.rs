use deribit_api::core::config::DeribitConfig;
use deribit_api::exchanges::deribit::build_ws_client;
use deribit_api::exchanges::deribit::models::GetOrderBookParams;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials are optional; public methods work without them
    let config = DeribitConfig::from_env_file(".env")?;

    tracing_subscriber::fmt()
        .with_max_level(if config.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    println!("Connecting to {}", config.ws_url);
    let client = build_ws_client(config).await?;

    let server_time = client.get_time().await?;
    println!("Server time: {}", server_time);

    let book = client
        .get_order_book(&GetOrderBookParams::new("BTC-PERPETUAL", Some(5)))
        .await?;
    println!("{} order book (change {:?})", book.instrument_name, book.change_id);
    for level in &book.asks {
        println!("  ask {:>12} x {}", level.price, level.amount);
    }
    for level in &book.bids {
        println!("  bid {:>12} x {}", level.price, level.amount);
    }

    client.close().await;
    Ok(())
}
