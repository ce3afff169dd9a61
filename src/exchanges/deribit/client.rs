use crate::core::config::{AuthMethod, DeribitConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{generate_nonce, timestamp_millis};
use crate::core::kernel::{
    Event, HmacSigner, ObjectSink, ObjectStream, RpcConnection, Signer, TungsteniteConnector,
    WsConnector,
};
use crate::exchanges::deribit::events::{
    EventDispatcher, HandlerId, EVENT_CONNECTED, EVENT_DISCONNECTED,
};
use crate::exchanges::deribit::models::{AuthParams, AuthResponse, ChannelsParams};
use crate::exchanges::deribit::subscriptions::SubscriptionRegistry;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub const EXCHANGE_NAME: &str = "deribit";

const PRIVATE_METHOD_PREFIX: &str = "private/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Explicitly shut down; never reconnects
    Closed,
}

/// Tokens obtained from `public/auth`
#[derive(Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthTokens {
    fn from_response(response: &AuthResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            scope: response.scope.clone(),
            expires_at: Utc::now() + ChronoDuration::seconds(response.expires_in),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Connection state shared between callers and the background tasks
struct Session {
    state: ConnectionState,
    tokens: Option<AuthTokens>,
    rpc: Option<Arc<RpcConnection>>,
}

struct ClientInner {
    config: DeribitConfig,
    connector: Arc<dyn WsConnector>,
    session: RwLock<Session>,
    subscriptions: tokio::sync::Mutex<SubscriptionRegistry>,
    dispatcher: Arc<EventDispatcher>,
    /// Held for the whole connect sequence so attempts never overlap
    connecting: tokio::sync::Mutex<()>,
    shutdown: CancellationToken,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Persistent Deribit WebSocket JSON-RPC client
///
/// Keeps exactly one live session: dials with linear backoff, authenticates
/// when credentials are configured, replays subscriptions and requests a
/// server heartbeat. A background supervisor notices a lost session and runs
/// the same sequence again when auto-reconnect is enabled.
///
/// Cloning is cheap; all clones share the session. Dropping the last clone
/// behaves like [`DeribitWsClient::close`].
#[derive(Clone)]
pub struct DeribitWsClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for DeribitWsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeribitWsClient")
            .field("url", &self.inner.config.ws_url)
            .field("state", &self.state())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl DeribitWsClient {
    /// Connect to `config.ws_url` over tokio-tungstenite
    pub async fn connect(config: DeribitConfig) -> Result<Self, ExchangeError> {
        let connector = TungsteniteConnector::new(
            config.ws_url.clone(),
            EXCHANGE_NAME.to_string(),
            config.ws.clone(),
        );
        Self::with_connector(config, Arc::new(connector)).await
    }

    /// Connect through any transport
    pub async fn with_connector(
        config: DeribitConfig,
        connector: Arc<dyn WsConnector>,
    ) -> Result<Self, ExchangeError> {
        let client = Self::new(config, connector);
        client.start().await?;
        Ok(client)
    }

    /// Build a client without connecting, so handlers can be registered first
    pub fn new(config: DeribitConfig, connector: Arc<dyn WsConnector>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                connector,
                session: RwLock::new(Session {
                    state: ConnectionState::Disconnected,
                    tokens: None,
                    rpc: None,
                }),
                subscriptions: tokio::sync::Mutex::new(SubscriptionRegistry::new()),
                dispatcher: Arc::new(EventDispatcher::new()),
                connecting: tokio::sync::Mutex::new(()),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Run the connect sequence and start supervising the session
    ///
    /// A caller arriving while another attempt is in progress waits for it and
    /// returns once the session is fully set up, or retries if it failed.
    pub async fn start(&self) -> Result<(), ExchangeError> {
        let _attempt = self.inner.connecting.lock().await;
        match self.state() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Closed => return Err(ExchangeError::NotConnected),
            ConnectionState::Connecting | ConnectionState::Disconnected => {}
        }

        let rpc = establish(&self.inner).await?;
        tokio::spawn(supervise(
            Arc::downgrade(&self.inner),
            rpc,
            self.inner.shutdown.clone(),
        ));
        Ok(())
    }

    /// Shut down for good: stops reconnecting and fails in-flight calls
    pub async fn close(&self) {
        let rpc = {
            let mut session = self.inner.write_session();
            session.state = ConnectionState::Closed;
            session.tokens = None;
            session.rpc.take()
        };
        self.inner.shutdown.cancel();

        if let Some(rpc) = rpc {
            rpc.close().await;
            info!(exchange = EXCHANGE_NAME, "Connection closed");
            self.inner.emit_lifecycle(EVENT_DISCONNECTED);
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read_session().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read_session().tokens.is_some()
    }

    /// Copy of the current tokens, if authenticated
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.inner.read_session().tokens.clone()
    }

    pub fn config(&self) -> &DeribitConfig {
        &self.inner.config
    }

    /// Call `method` with typed params and result
    ///
    /// `private/` methods get the current `access_token` injected and fail with
    /// [`ExchangeError::AuthenticationRequired`] before anything is sent when
    /// the client holds no token.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, ExchangeError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        self.inner.call(method, params).await
    }

    /// Untyped variant of [`DeribitWsClient::call`]
    pub async fn call_raw(&self, method: &str, params: Value) -> Result<Value, ExchangeError> {
        self.inner.call_value(method, params).await
    }

    /// Authenticate with the configured credentials and store the tokens
    pub async fn authenticate(&self) -> Result<AuthResponse, ExchangeError> {
        self.inner.authenticate().await
    }

    pub(crate) fn store_tokens(&self, response: &AuthResponse) {
        self.inner.store_tokens(response);
    }

    pub(crate) fn clear_tokens(&self) {
        self.inner.write_session().tokens = None;
    }

    /// Add channels to the subscription set and subscribe the ones not yet acknowledged
    ///
    /// Returns the channels the server confirmed in this call. Channels whose
    /// subscribe call failed stay pending and are retried on the next
    /// `subscribe` or reconnect.
    #[instrument(skip(self, channels), fields(exchange = EXCHANGE_NAME))]
    pub async fn subscribe<I, S>(&self, channels: I) -> Result<Vec<String>, ExchangeError>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        let mut registry = self.inner.subscriptions.lock().await;
        registry.add(channels);
        if !self.is_connected() {
            return Err(ExchangeError::NotConnected);
        }
        Ok(self.inner.flush_subscriptions(&mut registry).await)
    }

    /// Remove channels from the subscription set and unsubscribe them
    #[instrument(skip(self, channels), fields(exchange = EXCHANGE_NAME))]
    pub async fn unsubscribe<I, S>(&self, channels: I) -> Result<Vec<String>, ExchangeError>
    where
        I: IntoIterator<Item = S> + Send,
        S: AsRef<str>,
    {
        let removed = self.inner.subscriptions.lock().await.remove(channels);
        if removed.is_empty() || !self.is_connected() {
            return Ok(Vec::new());
        }

        let mut confirmed = Vec::new();
        for (method, channels) in [
            ("public/unsubscribe", removed.public),
            ("private/unsubscribe", removed.private),
        ] {
            if channels.is_empty() {
                continue;
            }
            let result: Vec<String> = self.call(method, &ChannelsParams { channels }).await?;
            confirmed.extend(result);
        }
        Ok(confirmed)
    }

    /// Channels in the subscription set, in request order
    pub async fn subscribed_channels(&self) -> Vec<String> {
        self.inner.subscriptions.lock().await.channels().to_vec()
    }

    pub async fn is_subscription_acknowledged(&self, channel: &str) -> bool {
        self.inner.subscriptions.lock().await.is_acknowledged(channel)
    }

    pub async fn all_subscriptions_acknowledged(&self) -> bool {
        self.inner.subscriptions.lock().await.all_acknowledged()
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.inner.dispatcher
    }

    /// Register a handler for a channel or lifecycle event
    pub fn on<F>(&self, key: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on(key, handler)
    }

    /// Register a handler receiving the notification data decoded into `T`
    pub fn on_typed<T, F>(&self, key: impl Into<String>, handler: F) -> HandlerId
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_typed(key, handler)
    }

    pub fn off(&self, key: &str, id: HandlerId) -> bool {
        self.inner.dispatcher.off(key, id)
    }
}

impl ClientInner {
    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        let mut session = self.write_session();
        if session.state != ConnectionState::Closed {
            session.state = state;
        }
    }

    fn emit_lifecycle(&self, key: &str) {
        self.dispatcher.emit(key, &Event::new(key, Value::Null));
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, ExchangeError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| ExchangeError::SerializationError(e.to_string()))?;
        let result = self.call_value(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            ExchangeError::DeserializationError(format!("Failed to decode {} result: {}", method, e))
        })
    }

    async fn call_value(&self, method: &str, params: Value) -> Result<Value, ExchangeError> {
        let (rpc, access_token) = {
            let session = self.read_session();
            match (&session.state, &session.rpc) {
                (ConnectionState::Connected, Some(rpc)) => (
                    rpc.clone(),
                    session.tokens.as_ref().map(|t| t.access_token.clone()),
                ),
                _ => return Err(ExchangeError::NotConnected),
            }
        };

        let mut params = match params {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        if method.starts_with(PRIVATE_METHOD_PREFIX) {
            let token = access_token.ok_or(ExchangeError::AuthenticationRequired)?;
            let Value::Object(map) = &mut params else {
                return Err(ExchangeError::InvalidParameters(format!(
                    "{} expects object params",
                    method
                )));
            };
            map.insert("access_token".to_string(), Value::String(token));
        }

        rpc.call(method, params, self.config.ws.call_timeout).await
    }

    async fn authenticate(&self) -> Result<AuthResponse, ExchangeError> {
        if !self.config.has_credentials() {
            return Err(ExchangeError::AuthError(
                "no API credentials configured".to_string(),
            ));
        }

        let params = match self.config.auth_method {
            AuthMethod::ClientCredentials => {
                AuthParams::client_credentials(self.config.api_key(), self.config.secret_key())
            }
            AuthMethod::ClientSignature => {
                let signer = HmacSigner::new(
                    self.config.api_key().to_string(),
                    self.config.secret_key().to_string(),
                );
                let signed = signer.client_signature(timestamp_millis(), &generate_nonce(), "")?;
                AuthParams::client_signature(signed)
            }
        };

        self.auth_with(&params).await
    }

    async fn auth_with(&self, params: &AuthParams) -> Result<AuthResponse, ExchangeError> {
        let response: AuthResponse = self.call("public/auth", params).await?;
        self.store_tokens(&response);
        Ok(response)
    }

    fn store_tokens(&self, response: &AuthResponse) {
        self.write_session().tokens = Some(AuthTokens::from_response(response));
    }

    /// Subscribe every unacknowledged channel, one call per scope
    async fn flush_subscriptions(&self, registry: &mut SubscriptionRegistry) -> Vec<String> {
        let pending = registry.pending();
        let mut confirmed = Vec::new();

        for (method, channels) in [
            ("public/subscribe", pending.public),
            ("private/subscribe", pending.private),
        ] {
            if channels.is_empty() {
                continue;
            }
            let count = channels.len();
            match self
                .call::<_, Vec<String>>(method, &ChannelsParams { channels })
                .await
            {
                Ok(acked) => {
                    confirmed.extend(registry.acknowledge(acked.iter().map(String::as_str)));
                }
                Err(e) => warn!(method, count, "Subscribe failed, channels stay pending: {}", e),
            }
        }

        confirmed
    }

    /// Dial with linear backoff; attempt `n` is followed by a pause of `n * base`
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME, url = %self.config.ws_url))]
    async fn dial(&self) -> Result<(Box<dyn ObjectSink>, Box<dyn ObjectStream>), ExchangeError> {
        let base = self.config.ws.retry_base_delay;
        let max_attempts = self.config.ws.max_connect_attempts.max(1);
        let strategy = (1..max_attempts)
            .map(move |n| base.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX)));

        let mut attempt = 0_usize;
        let connector = self.connector.clone();
        let action = move || {
            attempt += 1;
            let n = attempt;
            let connector = connector.clone();
            async move {
                connector.connect().await.map_err(|e| {
                    warn!(attempt = n, "WebSocket dial failed: {}", e);
                    e
                })
            }
        };

        tokio::select! {
            () = self.shutdown.cancelled() => Err(ExchangeError::NotConnected),
            result = Retry::spawn(strategy, action) => result.map_err(|e| {
                error!(attempts = max_attempts, "Giving up on WebSocket dial: {}", e);
                e
            }),
        }
    }

    /// Mark the session lost; false if `rpc` is not the current session
    fn detach(&self, rpc: &Arc<RpcConnection>) -> bool {
        let mut session = self.write_session();
        let current = session
            .rpc
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, rpc));
        if !current {
            return false;
        }
        session.rpc = None;
        session.tokens = None;
        if session.state != ConnectionState::Closed {
            session.state = ConnectionState::Disconnected;
        }
        true
    }
}

/// Connecting → Connected: dial, authenticate, resubscribe, configure heartbeat
#[instrument(skip(inner), fields(exchange = EXCHANGE_NAME, url = %inner.config.ws_url))]
async fn establish(inner: &Arc<ClientInner>) -> Result<Arc<RpcConnection>, ExchangeError> {
    inner.set_state(ConnectionState::Connecting);

    let (sink, stream) = match inner.dial().await {
        Ok(pair) => pair,
        Err(e) => {
            inner.set_state(ConnectionState::Disconnected);
            return Err(e);
        }
    };

    let rpc = RpcConnection::new(sink, stream, inner.dispatcher.clone(), inner.config.debug);
    let attached = {
        let mut session = inner.write_session();
        if session.state == ConnectionState::Closed {
            false
        } else {
            session.state = ConnectionState::Connected;
            session.tokens = None;
            session.rpc = Some(rpc.clone());
            true
        }
    };
    if !attached {
        rpc.close().await;
        return Err(ExchangeError::NotConnected);
    }
    info!("WebSocket connected");

    if inner.config.has_credentials() {
        match inner.authenticate().await {
            Ok(_) => debug!("Authenticated"),
            Err(e) => warn!("Authentication failed, continuing with public access only: {}", e),
        }
    }

    {
        let mut registry = inner.subscriptions.lock().await;
        registry.reset();
        let confirmed = inner.flush_subscriptions(&mut registry).await;
        debug!(
            confirmed = confirmed.len(),
            total = registry.len(),
            "Subscriptions replayed"
        );
    }

    let heartbeat = json!({ "interval": inner.config.ws.server_heartbeat_secs });
    if let Err(e) = inner.call_value("public/set_heartbeat", heartbeat).await {
        error!("Failed to configure server heartbeat: {}", e);
        inner.detach(&rpc);
        rpc.close().await;
        return Err(e);
    }

    tokio::spawn(heartbeat_loop(
        rpc.clone(),
        inner.config.ws.heartbeat_period,
        inner.config.ws.call_timeout,
        inner.shutdown.clone(),
    ));

    inner.emit_lifecycle(EVENT_CONNECTED);
    Ok(rpc)
}

/// Periodic `public/test`; a failed probe closes the session so the supervisor reconnects
async fn heartbeat_loop(
    rpc: Arc<RpcConnection>,
    period: Duration,
    call_timeout: Option<Duration>,
    shutdown: CancellationToken,
) {
    let closed = rpc.closed_token();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = closed.cancelled() => break,
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = rpc.call("public/test", json!({}), call_timeout).await {
                    warn!("Heartbeat failed, closing connection: {}", e);
                    rpc.close().await;
                    break;
                }
            }
        }
    }
}

/// Watch the session; on loss emit `disconnected` and reconnect if enabled
async fn supervise(
    inner: Weak<ClientInner>,
    mut rpc: Arc<RpcConnection>,
    shutdown: CancellationToken,
) {
    loop {
        let closed = rpc.closed_token();
        tokio::select! {
            () = closed.cancelled() => {}
            () = shutdown.cancelled() => {
                rpc.close().await;
                return;
            }
        }

        let Some(client) = inner.upgrade() else {
            return;
        };
        if client.detach(&rpc) {
            warn!(exchange = EXCHANGE_NAME, "WebSocket disconnected");
            client.emit_lifecycle(EVENT_DISCONNECTED);
        }
        if !client.config.auto_reconnect || shutdown.is_cancelled() {
            return;
        }

        rpc = loop {
            tokio::select! {
                () = shutdown.cancelled() => return,
                () = tokio::time::sleep(client.config.ws.reconnect_delay) => {}
            }

            let _attempt = tokio::select! {
                () = shutdown.cancelled() => return,
                guard = client.connecting.lock() => guard,
            };
            // a manual start got there first and supervises its own session
            if client.read_session().state != ConnectionState::Disconnected {
                return;
            }

            match establish(&client).await {
                Ok(next) => {
                    info!(exchange = EXCHANGE_NAME, "WebSocket reconnected");
                    break next;
                }
                Err(_) if shutdown.is_cancelled() => return,
                // session dropped again before setup finished
                Err(e @ (ExchangeError::ConnectionLost | ExchangeError::RequestTimeout { .. })) => {
                    warn!(exchange = EXCHANGE_NAME, "Reconnect interrupted, retrying: {}", e);
                }
                Err(e) => {
                    error!(exchange = EXCHANGE_NAME, "Reconnect failed, giving up: {}", e);
                    return;
                }
            }
        };
    }
}
