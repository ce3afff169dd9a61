use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::RpcEnvelope;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{instrument, trace};

/// REST client trait for JSON-RPC over HTTP
///
/// Every endpoint is a named method under the base URL (for example
/// `public/get_order_book`). Implementations unwrap the JSON-RPC envelope and
/// return its `result` member, or the remote `error` as [`ExchangeError::ApiError`].
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Call `method` with query parameters
    ///
    /// # Arguments
    /// * `method` - The method path, e.g. `public/ticker`
    /// * `query_params` - Query parameters as key-value pairs
    /// * `bearer` - Access token for private methods
    async fn get(
        &self,
        method: &str,
        query_params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<Value, ExchangeError>;

    /// Same as [`RestClient::get`] with a strongly-typed result
    async fn get_json<T: DeserializeOwned>(
        &self,
        method: &str,
        query_params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T, ExchangeError>;

    /// Call `method` with a JSON body
    async fn post(
        &self,
        method: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<Value, ExchangeError>;

    /// Same as [`RestClient::post`] with a strongly-typed result
    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<T, ExchangeError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API, without a trailing method
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Extra attempts for idempotent requests that failed transiently
    pub max_retries: usize,
    /// Pause between retries in milliseconds
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_ms: 250,
            user_agent: concat!("deribit-api/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the retry budget for GET requests
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::Other(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl ReqwestRest {
    pub fn new(base_url: String, exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(base_url, exchange_name)).build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Build the full URL for a method
    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            method.trim_start_matches('/')
        )
    }

    fn authorize(request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Handle the response and extract the envelope result
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        decode_envelope(status, &response_text)
    }

    #[instrument(skip(self, query_params, body, bearer), fields(exchange = %self.config.exchange_name, method = %http_method, endpoint = %method))]
    async fn make_request(
        &self,
        http_method: Method,
        method: &str,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        let url = self.build_url(method);
        let mut request = self.client.request(http_method, &url);

        if !query_params.is_empty() {
            request = request.query(query_params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request = Self::authorize(request, bearer);

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

/// Unwrap a JSON-RPC envelope received over HTTP
///
/// Deribit answers rejected calls with a non-2xx status and an error envelope,
/// so the envelope is inspected before the status code.
pub fn decode_envelope(status: StatusCode, body: &str) -> Result<Value, ExchangeError> {
    match serde_json::from_str::<RpcEnvelope>(body) {
        Ok(envelope) if envelope.error.is_some() || envelope.result.is_some() => {
            envelope.into_result()
        }
        Ok(_) | Err(_) if !status.is_success() => Err(ExchangeError::ApiError {
            code: i64::from(status.as_u16()),
            message: body.to_string(),
        }),
        Ok(_) => Err(ExchangeError::ProtocolError(
            "response carries neither result nor error".to_string(),
        )),
        Err(e) => Err(ExchangeError::DeserializationError(format!(
            "Failed to parse JSON response: {}",
            e
        ))),
    }
}

fn decode_result<T: DeserializeOwned>(value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value)
        .map_err(|e| ExchangeError::DeserializationError(format!("Failed to deserialize JSON: {}", e)))
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params, bearer), fields(exchange = %self.config.exchange_name, endpoint = %method, param_count = query_params.len()))]
    async fn get(
        &self,
        method: &str,
        query_params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        let strategy = FixedInterval::from_millis(self.config.retry_delay_ms)
            .take(self.config.max_retries);

        RetryIf::spawn(
            strategy,
            || self.make_request(Method::GET, method, query_params, None, bearer),
            |e: &ExchangeError| e.is_retryable(),
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        method: &str,
        query_params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<T, ExchangeError> {
        self.get(method, query_params, bearer)
            .await
            .and_then(decode_result)
    }

    #[instrument(skip(self, body, bearer), fields(exchange = %self.config.exchange_name, endpoint = %method))]
    async fn post(
        &self,
        method: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        self.make_request(Method::POST, method, &[], Some(body), bearer)
            .await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<T, ExchangeError> {
        self.post(method, body, bearer).await.and_then(decode_result)
    }
}
