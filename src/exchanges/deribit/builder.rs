use crate::core::config::DeribitConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig, TungsteniteConnector};
use crate::exchanges::deribit::client::{DeribitWsClient, EXCHANGE_NAME};
use crate::exchanges::deribit::rest::DeribitRestClient;
use secrecy::Secret;
use std::sync::Arc;

/// Create the tokio-tungstenite connector for `config.ws_url`
pub fn build_connector(config: &DeribitConfig) -> TungsteniteConnector {
    TungsteniteConnector::new(
        config.ws_url.clone(),
        EXCHANGE_NAME.to_string(),
        config.ws.clone(),
    )
}

/// Create a typed REST client; call `authenticate` before private methods
pub fn build_rest_client(
    config: &DeribitConfig,
) -> Result<DeribitRestClient<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(config.rest_url.clone(), EXCHANGE_NAME.to_string())
        .with_timeout(30)
        .with_max_retries(3);

    let rest = RestClientBuilder::new(rest_config).build()?;

    Ok(DeribitRestClient::new(
        rest,
        config.api_key().to_string(),
        Secret::new(config.secret_key().to_string()),
    ))
}

/// Connect a WebSocket client
pub async fn build_ws_client(config: DeribitConfig) -> Result<DeribitWsClient, ExchangeError> {
    let connector = build_connector(&config);
    DeribitWsClient::with_connector(config, Arc::new(connector)).await
}
