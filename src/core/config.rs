use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const TEST_WS_URL: &str = "wss://test.deribit.com/ws/api/v2";
pub const TEST_REST_URL: &str = "https://test.deribit.com/api/v2";
pub const PROD_WS_URL: &str = "wss://www.deribit.com/ws/api/v2";
pub const PROD_REST_URL: &str = "https://www.deribit.com/api/v2";

/// Grant used when the WebSocket session authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    ClientCredentials,
    ClientSignature,
}

impl FromStr for AuthMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client_credentials" => Ok(Self::ClientCredentials),
            "client_signature" => Ok(Self::ClientSignature),
            other => Err(ConfigError::InvalidValue {
                name: "DERIBIT_AUTH_METHOD".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials => f.write_str("client_credentials"),
            Self::ClientSignature => f.write_str("client_signature"),
        }
    }
}

/// Timing and sizing knobs for the WebSocket session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsSettings {
    /// Upper bound for a single dial attempt
    pub connect_timeout: Duration,
    /// Largest inbound frame accepted, in bytes
    pub read_limit: usize,
    /// Period of the client-side `public/test` liveness call
    pub heartbeat_period: Duration,
    /// Interval requested from the server via `public/set_heartbeat`, in seconds
    pub server_heartbeat_secs: u64,
    /// Pause between noticing a disconnect and dialing again
    pub reconnect_delay: Duration,
    /// Dial attempt `n` waits `n * retry_base_delay` before retrying
    pub retry_base_delay: Duration,
    pub max_connect_attempts: usize,
    /// `None` lets a call wait for as long as the connection lives
    pub call_timeout: Option<Duration>,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_limit: 32768 * 64,
            heartbeat_period: Duration::from_secs(3),
            server_heartbeat_secs: 30,
            reconnect_delay: Duration::from_secs(1),
            retry_base_delay: Duration::from_secs(5),
            max_connect_attempts: 10000,
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeribitConfig {
    pub ws_url: String,
    pub rest_url: String,
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub auto_reconnect: bool,
    pub debug: bool,
    pub auth_method: AuthMethod,
    pub ws: WsSettings,
}

// Never expose secrets in serialization
impl Serialize for DeribitConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DeribitConfig", 8)?;
        state.serialize_field("ws_url", &self.ws_url)?;
        state.serialize_field("rest_url", &self.rest_url)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("auto_reconnect", &self.auto_reconnect)?;
        state.serialize_field("debug", &self.debug)?;
        state.serialize_field("auth_method", &self.auth_method)?;
        state.serialize_field("ws", &self.ws)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for DeribitConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct DeribitConfigHelper {
            #[serde(default = "default_ws_url")]
            ws_url: String,
            #[serde(default = "default_rest_url")]
            rest_url: String,
            #[serde(default)]
            api_key: String,
            #[serde(default)]
            secret_key: String,
            #[serde(default = "default_true")]
            auto_reconnect: bool,
            #[serde(default)]
            debug: bool,
            #[serde(default)]
            auth_method: AuthMethod,
            #[serde(default)]
            ws: WsSettings,
        }

        let helper = DeribitConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            ws_url: helper.ws_url,
            rest_url: helper.rest_url,
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            auto_reconnect: helper.auto_reconnect,
            debug: helper.debug,
            auth_method: helper.auth_method,
            ws: helper.ws,
        })
    }
}

fn default_ws_url() -> String {
    TEST_WS_URL.to_string()
}

fn default_rest_url() -> String {
    TEST_REST_URL.to_string()
}

const fn default_true() -> bool {
    true
}

impl DeribitConfig {
    /// Create a test-network configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            auto_reconnect: true,
            debug: false,
            auth_method: AuthMethod::default(),
            ws: WsSettings::default(),
        }
    }

    /// Configuration for public market data only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Create configuration from environment variables
    ///
    /// Recognised variables:
    /// - `DERIBIT_API_KEY`, `DERIBIT_API_SECRET` (optional, read-only without them)
    /// - `DERIBIT_AUTO_RECONNECT` (defaults to true)
    /// - `DERIBIT_DEBUG_MODE` (defaults to false)
    /// - `DERIBIT_REAL_MODE` (defaults to false, selects production endpoints)
    /// - `DERIBIT_WS_URL`, `DERIBIT_REST_URL` (override the selected endpoints)
    /// - `DERIBIT_AUTH_METHOD` (`client_credentials` or `client_signature`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("DERIBIT_API_KEY").unwrap_or_default();
        let secret_key = lookup("DERIBIT_API_SECRET").unwrap_or_default();
        let auto_reconnect = parse_flag(&lookup, "DERIBIT_AUTO_RECONNECT", true)?;
        let debug = parse_flag(&lookup, "DERIBIT_DEBUG_MODE", false)?;
        let real_mode = parse_flag(&lookup, "DERIBIT_REAL_MODE", false)?;
        let auth_method = lookup("DERIBIT_AUTH_METHOD")
            .map(|value| value.parse::<AuthMethod>())
            .transpose()?
            .unwrap_or_default();

        let mut config = Self::new(api_key, secret_key)
            .real_mode(real_mode)
            .auto_reconnect(auto_reconnect)
            .debug(debug)
            .auth_method(auth_method);

        if let Some(ws_url) = lookup("DERIBIT_WS_URL").filter(|v| !v.is_empty()) {
            config.ws_url = ws_url;
        }
        if let Some(rest_url) = lookup("DERIBIT_REST_URL").filter(|v| !v.is_empty()) {
            config.rest_url = rest_url;
        }

        Ok(config)
    }

    /// Load a `.env` file (if it exists) and then read the environment
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }

    /// Switch between the test network and production endpoints
    #[must_use]
    pub fn real_mode(mut self, real: bool) -> Self {
        if real {
            self.ws_url = PROD_WS_URL.to_string();
            self.rest_url = PROD_REST_URL.to_string();
        } else {
            self.ws_url = TEST_WS_URL.to_string();
            self.rest_url = TEST_REST_URL.to_string();
        }
        self
    }

    #[must_use]
    pub fn ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = ws_url;
        self
    }

    #[must_use]
    pub fn rest_url(mut self, rest_url: String) -> Self {
        self.rest_url = rest_url;
        self
    }

    #[must_use]
    pub const fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    #[must_use]
    pub const fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    #[must_use]
    pub const fn auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    #[must_use]
    pub fn ws_settings(mut self, settings: WsSettings) -> Self {
        self.ws = settings;
        self
    }

    /// Check if this configuration has credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn parse_flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
