use crate::core::errors::ExchangeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Method name the server uses for channel push notifications
pub const SUBSCRIPTION_METHOD: &str = "subscription";

/// Method name of the server-initiated heartbeat notification
pub const HEARTBEAT_METHOD: &str = "heartbeat";

/// Outgoing JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// Remote `error` member of a response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<RpcErrorObject> for ExchangeError {
    fn from(err: RpcErrorObject) -> Self {
        // the data member usually names the offending parameter
        let message = match err.data {
            Some(Value::Null) | None => err.message,
            Some(data) => format!("{} ({})", err.message, data),
        };
        Self::ApiError {
            code: err.code,
            message,
        }
    }
}

/// Any inbound JSON-RPC message: response, notification or both shapes at once
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcEnvelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default, rename = "usIn")]
    pub us_in: Option<u64>,
    #[serde(default, rename = "usOut")]
    pub us_out: Option<u64>,
}

impl RpcEnvelope {
    /// Numeric correlation id, if the message carries one
    pub fn correlation_id(&self) -> Option<u64> {
        id_of(self.id.as_ref()?)
    }

    /// Resolve the envelope into the call outcome
    pub fn into_result(self) -> Result<Value, ExchangeError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        self.result.ok_or_else(|| {
            ExchangeError::ProtocolError("response carries neither result nor error".to_string())
        })
    }
}

/// Push notification delivered to the event dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

impl Event {
    pub fn new(channel: impl Into<String>, data: Value) -> Self {
        Self {
            channel: channel.into(),
            data,
        }
    }
}

/// What an inbound frame turned out to be
#[derive(Debug)]
pub enum Inbound {
    /// Carries an id; may still be a notification if nobody waits for that id
    Response { id: u64, envelope: RpcEnvelope },
    /// `method == "subscription"`
    Notification(RpcEnvelope),
    /// Server heartbeat request or `test_request`
    Heartbeat(RpcEnvelope),
    /// Anything else (unknown method without an id)
    Other(RpcEnvelope),
}

fn id_of(id: &Value) -> Option<u64> {
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Correlation id of a raw frame, readable even when the envelope is not
pub fn peek_id(value: &Value) -> Option<u64> {
    id_of(value.get("id")?)
}

/// Classify a decoded inbound value
pub fn classify(value: Value) -> Result<Inbound, ExchangeError> {
    let envelope: RpcEnvelope = serde_json::from_value(value)
        .map_err(|e| ExchangeError::DeserializationError(format!("invalid envelope: {}", e)))?;

    match envelope.method.as_deref() {
        Some(SUBSCRIPTION_METHOD) => return Ok(Inbound::Notification(envelope)),
        Some(HEARTBEAT_METHOD) => return Ok(Inbound::Heartbeat(envelope)),
        _ => {}
    }

    match envelope.correlation_id() {
        Some(id) => Ok(Inbound::Response { id, envelope }),
        None => Ok(Inbound::Other(envelope)),
    }
}

/// Decode `params.channel` / `params.data` into an [`Event`]
pub fn decode_event(envelope: &RpcEnvelope) -> Result<Event, ExchangeError> {
    let params = envelope
        .params
        .as_ref()
        .ok_or_else(|| ExchangeError::DeserializationError("notification without params".into()))?;
    Event::deserialize(params)
        .map_err(|e| ExchangeError::DeserializationError(format!("invalid notification: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let params = json!({});
        let request = RpcRequest::new(7, "public/get_time", &params);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 7, "method": "public/get_time", "params": {}})
        );
    }

    #[test]
    fn test_classify_response() {
        let inbound =
            classify(json!({"jsonrpc": "2.0", "id": 1, "result": 1_610_000_000_000_u64})).unwrap();
        match inbound {
            Inbound::Response { id, envelope } => {
                assert_eq!(id, 1);
                assert_eq!(envelope.into_result().unwrap(), json!(1_610_000_000_000_u64));
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_error_envelope_maps_to_api_error() {
        let inbound = classify(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": 10009, "message": "not_enough_funds"}
        }))
        .unwrap();
        let Inbound::Response { envelope, .. } = inbound else {
            panic!("expected a response");
        };
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ExchangeError::ApiError { code: 10009, .. }));
        assert!(err.to_string().contains("not_enough_funds"));
    }

    #[test]
    fn test_empty_response_is_protocol_error() {
        let envelope = RpcEnvelope {
            id: Some(json!(4)),
            ..RpcEnvelope::default()
        };
        assert!(matches!(
            envelope.into_result(),
            Err(ExchangeError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_classify_notification_and_decode_event() {
        let inbound = classify(json!({
            "jsonrpc": "2.0",
            "method": "subscription",
            "params": {"channel": "book.BTC-PERPETUAL.100ms", "data": {"change_id": 42}}
        }))
        .unwrap();
        let Inbound::Notification(envelope) = inbound else {
            panic!("expected a notification");
        };
        let event = decode_event(&envelope).unwrap();
        assert_eq!(event.channel, "book.BTC-PERPETUAL.100ms");
        assert_eq!(event.data["change_id"], 42);
    }

    #[test]
    fn test_classify_heartbeat() {
        let inbound = classify(json!({
            "jsonrpc": "2.0",
            "method": "heartbeat",
            "params": {"type": "test_request"}
        }))
        .unwrap();
        assert!(matches!(inbound, Inbound::Heartbeat(_)));
    }

    #[test]
    fn test_peek_id_on_malformed_envelope() {
        let frame = json!({"jsonrpc": "2.0", "id": "12", "error": "oops"});
        assert!(classify(frame.clone()).is_err());
        assert_eq!(peek_id(&frame), Some(12));
        assert_eq!(peek_id(&json!({"method": "subscription"})), None);
    }

    #[test]
    fn test_malformed_notification_is_an_error() {
        let envelope = RpcEnvelope {
            method: Some("subscription".to_string()),
            params: Some(json!({"data": 1})),
            ..RpcEnvelope::default()
        };
        assert!(decode_event(&envelope).is_err());
    }
}
