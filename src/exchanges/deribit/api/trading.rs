use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{
    CancelAllByCurrencyParams, CancelAllByInstrumentParams, CancelByLabelParams, CancelParams,
    ClosePositionParams, Direction, EditParams, GetOpenOrdersByCurrencyParams,
    GetOpenOrdersByInstrumentParams, GetOrderStateParams, GetUserTradesByInstrumentParams, Order,
    OrderParams, OrderResponse, UserTrades,
};
use tracing::instrument;

impl DeribitWsClient {
    pub async fn buy(&self, params: &OrderParams) -> Result<OrderResponse, ExchangeError> {
        self.place_order(Direction::Buy, params).await
    }

    pub async fn sell(&self, params: &OrderParams) -> Result<OrderResponse, ExchangeError> {
        self.place_order(Direction::Sell, params).await
    }

    #[instrument(
        skip(self, params),
        fields(exchange = "deribit", instrument = %params.instrument_name, direction = ?direction)
    )]
    pub async fn place_order(
        &self,
        direction: Direction,
        params: &OrderParams,
    ) -> Result<OrderResponse, ExchangeError> {
        self.call(direction.method(), params).await
    }

    pub async fn edit(&self, params: &EditParams) -> Result<OrderResponse, ExchangeError> {
        self.call("private/edit", params).await
    }

    pub async fn cancel(&self, params: &CancelParams) -> Result<Order, ExchangeError> {
        self.call("private/cancel", params).await
    }

    /// Returns the number of cancelled orders
    pub async fn cancel_all(&self) -> Result<u64, ExchangeError> {
        self.call("private/cancel_all", &()).await
    }

    pub async fn cancel_all_by_currency(
        &self,
        params: &CancelAllByCurrencyParams,
    ) -> Result<u64, ExchangeError> {
        self.call("private/cancel_all_by_currency", params).await
    }

    pub async fn cancel_all_by_instrument(
        &self,
        params: &CancelAllByInstrumentParams,
    ) -> Result<u64, ExchangeError> {
        self.call("private/cancel_all_by_instrument", params).await
    }

    pub async fn cancel_by_label(&self, params: &CancelByLabelParams) -> Result<u64, ExchangeError> {
        self.call("private/cancel_by_label", params).await
    }

    pub async fn close_position(
        &self,
        params: &ClosePositionParams,
    ) -> Result<OrderResponse, ExchangeError> {
        self.call("private/close_position", params).await
    }

    pub async fn get_open_orders_by_currency(
        &self,
        params: &GetOpenOrdersByCurrencyParams,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.call("private/get_open_orders_by_currency", params)
            .await
    }

    pub async fn get_open_orders_by_instrument(
        &self,
        params: &GetOpenOrdersByInstrumentParams,
    ) -> Result<Vec<Order>, ExchangeError> {
        self.call("private/get_open_orders_by_instrument", params)
            .await
    }

    pub async fn get_order_state(&self, params: &GetOrderStateParams) -> Result<Order, ExchangeError> {
        self.call("private/get_order_state", params).await
    }

    pub async fn get_user_trades_by_instrument(
        &self,
        params: &GetUserTradesByInstrumentParams,
    ) -> Result<UserTrades, ExchangeError> {
        self.call("private/get_user_trades_by_instrument", params)
            .await
    }
}
