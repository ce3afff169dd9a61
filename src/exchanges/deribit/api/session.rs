use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{CancelOnDisconnectParams, SetHeartbeatParams};

impl DeribitWsClient {
    /// Ask the server to send `heartbeat` requests every `interval` seconds
    ///
    /// The client configures this itself on every connect; calling it again
    /// changes the interval for the current session only.
    pub async fn set_heartbeat(&self, params: &SetHeartbeatParams) -> Result<String, ExchangeError> {
        self.call("public/set_heartbeat", params).await
    }

    pub async fn disable_heartbeat(&self) -> Result<String, ExchangeError> {
        self.call("public/disable_heartbeat", &()).await
    }

    pub async fn enable_cancel_on_disconnect(
        &self,
        params: &CancelOnDisconnectParams,
    ) -> Result<String, ExchangeError> {
        self.call("private/enable_cancel_on_disconnect", params)
            .await
    }

    pub async fn disable_cancel_on_disconnect(
        &self,
        params: &CancelOnDisconnectParams,
    ) -> Result<String, ExchangeError> {
        self.call("private/disable_cancel_on_disconnect", params)
            .await
    }
}
