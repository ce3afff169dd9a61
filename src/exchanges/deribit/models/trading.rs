use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// Trading method that opens an order in this direction
    pub fn method(self) -> &'static str {
        match self {
            Self::Buy => "private/buy",
            Self::Sell => "private/sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
    StopLimit,
    StopMarket,
    TakeLimit,
    TakeMarket,
    MarketLimit,
    TrailingStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    GoodTilCancelled,
    GoodTilDay,
    FillOrKill,
    ImmediateOrCancel,
}

/// Params shared by `private/buy` and `private/sell`
#[derive(Debug, Clone, Serialize)]
pub struct OrderParams {
    pub instrument_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_show: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<String>,
}

impl OrderParams {
    pub fn limit(instrument_name: impl Into<String>, amount: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            order_type: Some(OrderType::Limit),
            ..Self::market(instrument_name, amount)
        }
    }

    pub fn market(instrument_name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            instrument_name: instrument_name.into(),
            amount,
            order_type: Some(OrderType::Market),
            label: None,
            price: None,
            time_in_force: None,
            max_show: None,
            post_only: None,
            reduce_only: None,
            trigger_price: None,
            trigger: None,
            advanced: None,
        }
    }

    #[must_use]
    pub fn post_only(mut self, post_only: bool) -> Self {
        self.post_only = Some(post_only);
        self
    }

    #[must_use]
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditParams {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderIdParams {
    pub order_id: String,
}

impl OrderIdParams {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }
}

pub type CancelParams = OrderIdParams;
pub type GetOrderStateParams = OrderIdParams;

#[derive(Debug, Clone, Serialize)]
pub struct CancelAllByCurrencyParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelAllByInstrumentParams {
    pub instrument_name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelByLabelParams {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosePositionParams {
    pub instrument_name: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetOpenOrdersByCurrencyParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetOpenOrdersByInstrumentParams {
    pub instrument_name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUserTradesByInstrumentParams {
    pub instrument_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_seq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_old: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

/// Limit price, or `"market_price"` for market orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderPrice {
    Limit(Decimal),
    Market(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub instrument_name: String,
    pub direction: Direction,
    pub order_type: String,
    pub order_state: String,
    #[serde(default)]
    pub price: Option<OrderPrice>,
    pub amount: f64,
    #[serde(default)]
    pub filled_amount: f64,
    #[serde(default)]
    pub average_price: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub replaced: bool,
    #[serde(default)]
    pub api: bool,
    #[serde(default)]
    pub is_liquidation: bool,
    #[serde(default)]
    pub max_show: Option<f64>,
    pub creation_timestamp: i64,
    pub last_update_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTrade {
    pub trade_id: String,
    pub trade_seq: i64,
    pub instrument_name: String,
    pub order_id: String,
    pub direction: Direction,
    pub price: f64,
    pub amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub fee_currency: String,
    pub timestamp: i64,
    #[serde(default)]
    pub liquidity: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub mark_price: Option<f64>,
}

/// Result of `buy`, `sell`, `edit` and `close_position`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
    #[serde(default)]
    pub trades: Vec<UserTrade>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTrades {
    pub trades: Vec<UserTrade>,
    #[serde(default)]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_order_params_serialize_numbers() {
        let params = OrderParams::limit(
            "BTC-PERPETUAL",
            Decimal::new(100, 0),
            Decimal::new(420_005, 1),
        )
        .post_only(true);

        let value = serde_json::to_value(params).unwrap();
        assert_eq!(value["instrument_name"], "BTC-PERPETUAL");
        assert_eq!(value["amount"], json!(100.0));
        assert_eq!(value["price"], json!(42000.5));
        assert_eq!(value["type"], "limit");
        assert_eq!(value["post_only"], true);
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_order_price_accepts_market_marker() {
        let order: Order = serde_json::from_value(json!({
            "order_id": "ETH-1",
            "instrument_name": "ETH-PERPETUAL",
            "direction": "sell",
            "order_type": "market",
            "order_state": "filled",
            "price": "market_price",
            "amount": 10.0,
            "creation_timestamp": 1,
            "last_update_timestamp": 2
        }))
        .unwrap();
        assert_eq!(order.price, Some(OrderPrice::Market("market_price".to_string())));
        assert_eq!(order.direction, Direction::Sell);
    }

    #[test]
    fn test_direction_method() {
        assert_eq!(Direction::Buy.method(), "private/buy");
        assert_eq!(Direction::Sell.method(), "private/sell");
    }
}
