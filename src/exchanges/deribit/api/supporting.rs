use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{ApiVersion, HelloParams, TestParams};

impl DeribitWsClient {
    /// Server time in milliseconds since the UNIX epoch
    pub async fn get_time(&self) -> Result<u64, ExchangeError> {
        self.call("public/get_time", &()).await
    }

    pub async fn hello(&self, params: &HelloParams) -> Result<ApiVersion, ExchangeError> {
        self.call("public/hello", params).await
    }

    pub async fn test(&self, params: &TestParams) -> Result<ApiVersion, ExchangeError> {
        self.call("public/test", params).await
    }
}
