use deribit_api::core::config::DeribitConfig;
use deribit_api::exchanges::deribit::build_rest_client;
use tracing::Level;

const INSTRUMENT: &str = "BTC-PERPETUAL";

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

    println!("📖 Deribit REST order book");
    println!("==========================\n");

    let rest = build_rest_client(&config)?;

    let book = rest.get_order_book(INSTRUMENT, Some(5)).await?;
    println!("{} @ {:?}", book.instrument_name, book.datetime());
    for level in book.asks.iter().rev() {
        println!("   ask {:>12} x {}", level.price, level.amount);
    }
    println!("   ------------------------");
    for level in &book.bids {
        println!("   bid {:>12} x {}", level.price, level.amount);
    }

    let last = rest.get_ticker(INSTRUMENT).await?;
    println!("\n💰 Last price: {}", last);

    let trades = rest.get_recent_trades(INSTRUMENT, 5).await?;
    for trade in &trades.trades {
        println!("   {} {} @ {}", trade.direction, trade.amount, trade.price);
    }

    if config.has_credentials() {
        match rest.authenticate().await {
            Ok(_) => println!("\n🔐 Authenticated, private REST methods available"),
            Err(e) => println!("\n❌ Authentication failed: {}", e),
        }
    } else {
        println!("\n💡 Set DERIBIT_API_KEY and DERIBIT_API_SECRET to try private methods");
    }

    Ok(())
}
