use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SetHeartbeatParams {
    /// Seconds, at least 10
    pub interval: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelOnDisconnectScope {
    Connection,
    Account,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CancelOnDisconnectParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<CancelOnDisconnectScope>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelsParams {
    pub channels: Vec<String>,
}

pub type SubscribeParams = ChannelsParams;
pub type UnsubscribeParams = ChannelsParams;

#[derive(Debug, Clone, Serialize)]
pub struct HelloParams {
    pub client_name: String,
    pub client_version: String,
}

impl Default for HelloParams {
    fn default() -> Self {
        Self {
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestParams {
    /// `"exception"` makes the server answer with an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,
}

/// Result of `public/hello` and `public/test`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiVersion {
    pub version: String,
}
