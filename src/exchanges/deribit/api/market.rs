use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{
    BookSummary, ContractSize, Currency, FundingChartData, GetBookSummaryByCurrencyParams,
    GetBookSummaryByInstrumentParams, GetContractSizeParams, GetFundingChartDataParams,
    GetIndexPriceParams, GetInstrumentsParams, GetLastTradesByCurrencyParams,
    GetLastTradesByInstrumentParams, GetMarkPriceHistoryParams, GetOrderBookParams, IndexPrice,
    Instrument, LastTrades, MarkPricePoint, OrderBook, Ticker, TickerParams,
};
use tracing::instrument;

impl DeribitWsClient {
    pub async fn get_book_summary_by_currency(
        &self,
        params: &GetBookSummaryByCurrencyParams,
    ) -> Result<Vec<BookSummary>, ExchangeError> {
        self.call("public/get_book_summary_by_currency", params)
            .await
    }

    pub async fn get_book_summary_by_instrument(
        &self,
        params: &GetBookSummaryByInstrumentParams,
    ) -> Result<Vec<BookSummary>, ExchangeError> {
        self.call("public/get_book_summary_by_instrument", params)
            .await
    }

    pub async fn get_contract_size(
        &self,
        params: &GetContractSizeParams,
    ) -> Result<ContractSize, ExchangeError> {
        self.call("public/get_contract_size", params).await
    }

    pub async fn get_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        self.call("public/get_currencies", &()).await
    }

    pub async fn get_funding_chart_data(
        &self,
        params: &GetFundingChartDataParams,
    ) -> Result<FundingChartData, ExchangeError> {
        self.call("public/get_funding_chart_data", params).await
    }

    pub async fn get_index_price(
        &self,
        params: &GetIndexPriceParams,
    ) -> Result<IndexPrice, ExchangeError> {
        self.call("public/get_index_price", params).await
    }

    pub async fn get_instruments(
        &self,
        params: &GetInstrumentsParams,
    ) -> Result<Vec<Instrument>, ExchangeError> {
        self.call("public/get_instruments", params).await
    }

    pub async fn get_last_trades_by_instrument(
        &self,
        params: &GetLastTradesByInstrumentParams,
    ) -> Result<LastTrades, ExchangeError> {
        self.call("public/get_last_trades_by_instrument", params)
            .await
    }

    pub async fn get_last_trades_by_currency(
        &self,
        params: &GetLastTradesByCurrencyParams,
    ) -> Result<LastTrades, ExchangeError> {
        self.call("public/get_last_trades_by_currency", params)
            .await
    }

    /// Order book snapshot with bids descending and asks ascending
    #[instrument(skip(self), fields(exchange = "deribit", instrument = %params.instrument_name))]
    pub async fn get_order_book(
        &self,
        params: &GetOrderBookParams,
    ) -> Result<OrderBook, ExchangeError> {
        let mut book: OrderBook = self.call("public/get_order_book", params).await?;
        book.sort_levels();
        Ok(book)
    }

    pub async fn ticker(&self, params: &TickerParams) -> Result<Ticker, ExchangeError> {
        self.call("public/ticker", params).await
    }

    pub async fn get_mark_price_history(
        &self,
        params: &GetMarkPriceHistoryParams,
    ) -> Result<Vec<MarkPricePoint>, ExchangeError> {
        self.call("public/get_mark_price_history", params).await
    }
}
