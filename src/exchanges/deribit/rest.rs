use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::deribit::models::{
    AuthResponse, BookSummary, Direction, LastTrades, Order, OrderBook, OrderResponse,
};
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, instrument};

/// Order book depth requested when none is given
pub const DEFAULT_BOOK_DEPTH: u32 = 10;

/// Price increment of the BTC perpetual
pub const BTC_TICK_SIZE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Thin typed wrapper around `RestClient` for the Deribit HTTP API
pub struct DeribitRestClient<R: RestClient> {
    client: R,
    client_id: String,
    client_secret: Secret<String>,
    access_token: RwLock<Option<String>>,
}

impl<R: RestClient> DeribitRestClient<R> {
    pub fn new(client: R, client_id: String, client_secret: Secret<String>) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            access_token: RwLock::new(None),
        }
    }

    /// Unauthenticated client for public methods
    pub fn public(client: R) -> Self {
        Self::new(client, String::new(), Secret::new(String::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get a bearer token with the client credentials grant
    #[instrument(skip(self), fields(exchange = "deribit"))]
    pub async fn authenticate(&self) -> Result<String, ExchangeError> {
        if self.client_id.is_empty() || self.client_secret.expose_secret().is_empty() {
            return Err(ExchangeError::AuthError(
                "no API credentials configured".to_string(),
            ));
        }

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
        ];
        let response: AuthResponse = self.client.get_json("public/auth", &params, None).await?;

        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(response.access_token.clone());
        debug!("REST client authenticated");
        Ok(response.access_token)
    }

    /// Order book with bids descending and asks ascending
    #[instrument(skip(self), fields(exchange = "deribit"))]
    pub async fn get_order_book(
        &self,
        instrument: &str,
        depth: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let depth = depth.unwrap_or(DEFAULT_BOOK_DEPTH).to_string();
        let params = [("instrument_name", instrument), ("depth", depth.as_str())];

        let mut book: OrderBook = self
            .client
            .get_json("public/get_order_book", &params, None)
            .await?;
        book.sort_levels();
        Ok(book)
    }

    /// Last traded price
    pub async fn get_ticker(&self, instrument: &str) -> Result<Decimal, ExchangeError> {
        let ticker = self
            .client
            .get("public/ticker", &[("instrument_name", instrument)], None)
            .await?;
        let last_price = ticker.get("last_price").ok_or_else(|| {
            ExchangeError::DeserializationError("missing last_price field in response".to_string())
        })?;
        parse_decimal(last_price)
    }

    /// Post-only limit order, price rounded to the BTC tick
    #[instrument(skip(self), fields(exchange = "deribit"))]
    pub async fn place_limit_order(
        &self,
        instrument: &str,
        price: Decimal,
        amount: Decimal,
        direction: Direction,
    ) -> Result<Order, ExchangeError> {
        let token = self
            .access_token()
            .ok_or(ExchangeError::AuthenticationRequired)?;

        let price = round_to_tick(price, BTC_TICK_SIZE).to_string();
        let amount = amount.to_string();
        let params = [
            ("instrument_name", instrument),
            ("price", price.as_str()),
            ("amount", amount.as_str()),
            ("type", "limit"),
            ("post_only", "true"),
        ];

        let response: OrderResponse = self
            .client
            .get_json(direction.method(), &params, Some(&token))
            .await?;
        Ok(response.order)
    }

    pub async fn get_recent_trades(
        &self,
        instrument: &str,
        count: u32,
    ) -> Result<LastTrades, ExchangeError> {
        let count = count.to_string();
        let params = [("instrument_name", instrument), ("count", count.as_str())];
        self.client
            .get_json("public/get_last_trades_by_instrument", &params, None)
            .await
    }

    /// Accrued funding over `[start, end]`, timestamps in milliseconds
    pub async fn get_funding_rate(
        &self,
        instrument: &str,
        start_timestamp: i64,
        end_timestamp: i64,
    ) -> Result<Decimal, ExchangeError> {
        let start = start_timestamp.to_string();
        let end = end_timestamp.to_string();
        let params = [
            ("instrument_name", instrument),
            ("start_timestamp", start.as_str()),
            ("end_timestamp", end.as_str()),
        ];
        let value = self
            .client
            .get("public/get_funding_rate_value", &params, None)
            .await?;
        parse_decimal(&value)
    }

    pub async fn get_book_summary(
        &self,
        instrument: &str,
    ) -> Result<Vec<BookSummary>, ExchangeError> {
        self.client
            .get_json(
                "public/get_book_summary_by_instrument",
                &[("instrument_name", instrument)],
                None,
            )
            .await
    }
}

/// Round `price` to the nearest multiple of `tick`, halves away from zero
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick.is_zero() {
        return price;
    }
    (price / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * tick
}

/// Decimal from a JSON number or numeric string
fn parse_decimal(value: &Value) -> Result<Decimal, ExchangeError> {
    let parsed = match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string())),
        Value::String(text) => Decimal::from_str(text),
        _ => {
            return Err(ExchangeError::DeserializationError(format!(
                "expected a number or a string, got {}",
                value
            )))
        }
    };
    parsed.map_err(|e| ExchangeError::DeserializationError(format!("Invalid decimal: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        query: Vec<(String, String)>,
        bearer: Option<String>,
    }

    #[derive(Default)]
    struct FakeRest {
        results: HashMap<&'static str, Value>,
        calls: Mutex<Vec<Recorded>>,
    }

    impl FakeRest {
        fn with(mut self, method: &'static str, result: Value) -> Self {
            self.results.insert(method, result);
            self
        }

        fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RestClient for FakeRest {
        async fn get(
            &self,
            method: &str,
            query_params: &[(&str, &str)],
            bearer: Option<&str>,
        ) -> Result<Value, ExchangeError> {
            self.calls.lock().unwrap().push(Recorded {
                method: method.to_string(),
                query: query_params
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                bearer: bearer.map(str::to_string),
            });
            self.results.get(method).cloned().ok_or(ExchangeError::ApiError {
                code: 13020,
                message: "not_found".to_string(),
            })
        }

        async fn get_json<T: DeserializeOwned>(
            &self,
            method: &str,
            query_params: &[(&str, &str)],
            bearer: Option<&str>,
        ) -> Result<T, ExchangeError> {
            let value = self.get(method, query_params, bearer).await?;
            Ok(serde_json::from_value(value)?)
        }

        async fn post(
            &self,
            method: &str,
            _body: &Value,
            bearer: Option<&str>,
        ) -> Result<Value, ExchangeError> {
            self.get(method, &[], bearer).await
        }

        async fn post_json<T: DeserializeOwned>(
            &self,
            method: &str,
            body: &Value,
            bearer: Option<&str>,
        ) -> Result<T, ExchangeError> {
            let value = self.post(method, body, bearer).await?;
            Ok(serde_json::from_value(value)?)
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_to_tick() {
        assert_eq!(round_to_tick(dec("42000.2"), BTC_TICK_SIZE), dec("42000.0"));
        assert_eq!(round_to_tick(dec("42000.25"), BTC_TICK_SIZE), dec("42000.5"));
        assert_eq!(round_to_tick(dec("42000.74"), BTC_TICK_SIZE), dec("42000.5"));
        assert_eq!(round_to_tick(dec("42000.75"), BTC_TICK_SIZE), dec("42001.0"));
        assert_eq!(round_to_tick(dec("-0.25"), BTC_TICK_SIZE), dec("-0.5"));
        assert_eq!(round_to_tick(dec("7"), Decimal::ZERO), dec("7"));
    }

    #[test]
    fn test_parse_decimal_accepts_number_and_string() {
        assert_eq!(parse_decimal(&json!(42000.5)).unwrap(), dec("42000.5"));
        assert_eq!(parse_decimal(&json!("42000.5")).unwrap(), dec("42000.5"));
        assert!(parse_decimal(&json!(null)).is_err());
    }

    #[tokio::test]
    async fn test_order_book_uses_default_depth_and_sorts() {
        let fake = FakeRest::default().with(
            "public/get_order_book",
            json!({
                "instrument_name": "BTC-PERPETUAL",
                "timestamp": 1_610_000_000_000_i64,
                "change_id": 7,
                "state": "open",
                "bids": [[100.0, 1.0], [101.0, 2.0]],
                "asks": [[103.0, 1.0], [102.0, 5.0]]
            }),
        );
        let client = DeribitRestClient::public(fake);

        let book = client.get_order_book("BTC-PERPETUAL", None).await.unwrap();
        assert_eq!(book.best_bid().unwrap().price, dec("101"));
        assert_eq!(book.best_ask().unwrap().price, dec("102"));

        let calls = client.client.calls();
        assert_eq!(calls[0].query[1], ("depth".to_string(), "10".to_string()));
        assert!(calls[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_ticker_reads_last_price() {
        let fake = FakeRest::default().with("public/ticker", json!({"last_price": "42123.5"}));
        let client = DeribitRestClient::public(fake);
        assert_eq!(client.get_ticker("BTC-PERPETUAL").await.unwrap(), dec("42123.5"));
    }

    #[tokio::test]
    async fn test_limit_order_requires_token() {
        let client = DeribitRestClient::public(FakeRest::default());
        let err = client
            .place_limit_order("BTC-PERPETUAL", dec("42000"), dec("10"), Direction::Buy)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::AuthenticationRequired));
        assert!(client.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_limit_order_after_authentication() {
        let fake = FakeRest::default()
            .with(
                "public/auth",
                json!({"access_token": "tok", "expires_in": 900, "refresh_token": "ref"}),
            )
            .with(
                "private/sell",
                json!({
                    "order": {
                        "order_id": "1",
                        "instrument_name": "BTC-PERPETUAL",
                        "direction": "sell",
                        "order_type": "limit",
                        "order_state": "open",
                        "price": 42000.5,
                        "amount": 10.0,
                        "post_only": true,
                        "creation_timestamp": 1,
                        "last_update_timestamp": 1
                    },
                    "trades": []
                }),
            );
        let client = DeribitRestClient::new(fake, "id".to_string(), Secret::new("secret".to_string()));

        assert_eq!(client.authenticate().await.unwrap(), "tok");
        let order = client
            .place_limit_order("BTC-PERPETUAL", dec("42000.3"), dec("10"), Direction::Sell)
            .await
            .unwrap();
        assert!(order.post_only);

        let calls = client.client.calls();
        let sell = &calls[1];
        assert_eq!(sell.method, "private/sell");
        assert_eq!(sell.bearer.as_deref(), Some("tok"));
        assert!(sell
            .query
            .contains(&("price".to_string(), "42000.5".to_string())));
        assert!(sell
            .query
            .contains(&("post_only".to_string(), "true".to_string())));

        // the secret travels with the auth request only
        let carries_secret = |call: &Recorded| call.query.iter().any(|(_, v)| v == "secret");
        assert!(carries_secret(&calls[0]));
        assert!(!carries_secret(sell));
    }
}
