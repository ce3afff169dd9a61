use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{SubscribeParams, UnsubscribeParams};

// Raw subscription RPCs. They bypass the subscription set, so channels
// subscribed here are not replayed after a reconnect; use
// `DeribitWsClient::subscribe` for that.
impl DeribitWsClient {
    pub async fn public_subscribe(
        &self,
        params: &SubscribeParams,
    ) -> Result<Vec<String>, ExchangeError> {
        self.call("public/subscribe", params).await
    }

    pub async fn private_subscribe(
        &self,
        params: &SubscribeParams,
    ) -> Result<Vec<String>, ExchangeError> {
        self.call("private/subscribe", params).await
    }

    pub async fn public_unsubscribe(
        &self,
        params: &UnsubscribeParams,
    ) -> Result<Vec<String>, ExchangeError> {
        self.call("public/unsubscribe", params).await
    }

    pub async fn private_unsubscribe(
        &self,
        params: &UnsubscribeParams,
    ) -> Result<Vec<String>, ExchangeError> {
        self.call("private/unsubscribe", params).await
    }
}
