use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GetBookSummaryByCurrencyParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentNameParams {
    pub instrument_name: String,
}

impl InstrumentNameParams {
    pub fn new(instrument_name: impl Into<String>) -> Self {
        Self {
            instrument_name: instrument_name.into(),
        }
    }
}

pub type GetBookSummaryByInstrumentParams = InstrumentNameParams;
pub type GetContractSizeParams = InstrumentNameParams;
pub type TickerParams = InstrumentNameParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub instrument_name: String,
    pub base_currency: String,
    pub quote_currency: String,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub volume_usd: Option<f64>,
    #[serde(default)]
    pub open_interest: f64,
    #[serde(default)]
    pub mark_price: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub bid_price: Option<f64>,
    #[serde(default)]
    pub ask_price: Option<f64>,
    #[serde(default)]
    pub mid_price: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub funding_8h: Option<f64>,
    #[serde(default)]
    pub current_funding: Option<f64>,
    pub creation_timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContractSize {
    pub contract_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub currency: String,
    pub currency_long: String,
    #[serde(default)]
    pub fee_precision: Option<u32>,
    #[serde(default)]
    pub min_confirmations: Option<u32>,
    #[serde(default)]
    pub min_withdrawal_fee: Option<f64>,
    #[serde(default)]
    pub withdrawal_fee: Option<f64>,
    #[serde(default)]
    pub coin_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetFundingChartDataParams {
    pub instrument_name: String,
    /// `8h`, `24h` or `1m`
    pub length: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingChartPoint {
    pub timestamp: i64,
    pub index_price: f64,
    pub interest_8h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingChartData {
    pub current_interest: f64,
    pub interest_8h: f64,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub data: Vec<FundingChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetIndexPriceParams {
    /// e.g. `btc_usd`
    pub index_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexPrice {
    pub index_price: f64,
    pub estimated_delivery_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetInstrumentsParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl GetInstrumentsParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            kind: None,
            expired: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub instrument_name: String,
    pub kind: String,
    pub base_currency: String,
    pub quote_currency: String,
    #[serde(default)]
    pub settlement_currency: Option<String>,
    pub is_active: bool,
    pub tick_size: f64,
    pub min_trade_amount: f64,
    pub contract_size: f64,
    #[serde(default)]
    pub maker_commission: f64,
    #[serde(default)]
    pub taker_commission: f64,
    pub creation_timestamp: i64,
    #[serde(default)]
    pub expiration_timestamp: Option<i64>,
    #[serde(default)]
    pub settlement_period: Option<String>,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub strike: Option<f64>,
    #[serde(default)]
    pub max_leverage: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetLastTradesByInstrumentParams {
    pub instrument_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_seq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

impl GetLastTradesByInstrumentParams {
    pub fn new(instrument_name: impl Into<String>) -> Self {
        Self {
            instrument_name: instrument_name.into(),
            start_seq: None,
            end_seq: None,
            count: None,
            sorting: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetLastTradesByCurrencyParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTrade {
    pub trade_id: String,
    pub trade_seq: i64,
    pub instrument_name: String,
    pub direction: String,
    pub price: f64,
    pub amount: f64,
    pub timestamp: i64,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub mark_price: Option<f64>,
    #[serde(default)]
    pub tick_direction: Option<i32>,
    #[serde(default)]
    pub iv: Option<f64>,
    #[serde(default)]
    pub liquidation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTrades {
    pub trades: Vec<PublicTrade>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetOrderBookParams {
    pub instrument_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl GetOrderBookParams {
    pub fn new(instrument_name: impl Into<String>, depth: Option<u32>) -> Self {
        Self {
            instrument_name: instrument_name.into(),
            depth,
        }
    }
}

/// One `[price, amount]` level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Decimal, Decimal)", into = "(Decimal, Decimal)")]
pub struct PriceLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

impl From<(Decimal, Decimal)> for PriceLevel {
    fn from((price, amount): (Decimal, Decimal)) -> Self {
        Self { price, amount }
    }
}

impl From<PriceLevel> for (Decimal, Decimal) {
    fn from(level: PriceLevel) -> Self {
        (level.price, level.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub instrument_name: String,
    pub timestamp: i64,
    #[serde(default)]
    pub change_id: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub best_bid_price: Option<f64>,
    #[serde(default)]
    pub best_bid_amount: Option<f64>,
    #[serde(default)]
    pub best_ask_price: Option<f64>,
    #[serde(default)]
    pub best_ask_amount: Option<f64>,
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub mark_price: Option<f64>,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub open_interest: Option<f64>,
}

impl OrderBook {
    /// Bids best first (descending), asks best first (ascending)
    pub fn sort_levels(&mut self) {
        self.bids.sort_by(|a, b| b.price.cmp(&a.price));
        self.asks.sort_by(|a, b| a.price.cmp(&b.price));
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    pub fn datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// `["new" | "change" | "delete", price, amount]` entry of a book notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDelta(pub String, pub f64, pub f64);

/// Payload of `book.{instrument}.{interval}` notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default, rename = "type")]
    pub update_type: Option<String>,
    pub instrument_name: String,
    pub timestamp: i64,
    pub change_id: i64,
    #[serde(default)]
    pub prev_change_id: Option<i64>,
    pub bids: Vec<BookDelta>,
    pub asks: Vec<BookDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerStats {
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub volume_usd: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub price_change: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub instrument_name: String,
    pub timestamp: i64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub last_price: Option<f64>,
    pub mark_price: f64,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub best_bid_price: Option<f64>,
    #[serde(default)]
    pub best_bid_amount: Option<f64>,
    #[serde(default)]
    pub best_ask_price: Option<f64>,
    #[serde(default)]
    pub best_ask_amount: Option<f64>,
    #[serde(default)]
    pub open_interest: Option<f64>,
    #[serde(default)]
    pub current_funding: Option<f64>,
    #[serde(default)]
    pub funding_8h: Option<f64>,
    #[serde(default)]
    pub settlement_price: Option<f64>,
    #[serde(default)]
    pub stats: Option<TickerStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetMarkPriceHistoryParams {
    pub instrument_name: String,
    /// Milliseconds since the UNIX epoch
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

/// `[timestamp, mark_price]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkPricePoint(pub i64, pub f64);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_order_book_levels_decode_and_sort() {
        let mut book: OrderBook = serde_json::from_value(json!({
            "instrument_name": "BTC-PERPETUAL",
            "timestamp": 1_610_000_000_000_i64,
            "bids": [[42000.0, 10.0], [42001.5, 20.0]],
            "asks": [[42010.0, 5.0], [42005.5, 1.0]],
            "best_bid_price": 42001.5
        }))
        .unwrap();
        book.sort_levels();

        assert_eq!(book.best_bid().unwrap().price, dec("42001.5"));
        assert_eq!(book.best_ask().unwrap().price, dec("42005.5"));
        assert_eq!(book.bids[1].amount, dec("10"));
        assert_eq!(
            book.datetime().unwrap().timestamp_millis(),
            1_610_000_000_000
        );
    }

    #[test]
    fn test_book_update_notification_decodes() {
        let update: BookUpdate = serde_json::from_value(json!({
            "type": "change",
            "timestamp": 1_610_000_000_000_i64,
            "instrument_name": "BTC-PERPETUAL",
            "change_id": 2,
            "prev_change_id": 1,
            "bids": [["new", 42000.0, 10.0]],
            "asks": [["delete", 42010.0, 0.0]]
        }))
        .unwrap();
        assert_eq!(update.bids[0], BookDelta("new".to_string(), 42000.0, 10.0));
        assert_eq!(update.asks[0].0, "delete");
    }
}
