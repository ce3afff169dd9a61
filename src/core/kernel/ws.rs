use crate::core::config::WsSettings;
use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::{Message, WebSocketConfig};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{instrument, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a JSON message transport
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Serialize and send one JSON value as a single frame
    async fn write_object(&mut self, value: &Value) -> Result<(), ExchangeError>;

    /// Send a close frame and release the write half
    async fn close(&mut self) -> Result<(), ExchangeError>;
}

/// Read half of a JSON message transport
///
/// Control frames and undecodable payloads never surface here. `None` means
/// the peer closed the connection or the stream ended.
#[async_trait]
pub trait ObjectStream: Send {
    async fn read_object(&mut self) -> Option<Result<Value, ExchangeError>>;
}

/// Dials a fresh transport session
///
/// Every reconnect calls `connect` again, so implementations must be reusable.
#[async_trait]
pub trait WsConnector: Send + Sync + 'static {
    async fn connect(&self)
        -> Result<(Box<dyn ObjectSink>, Box<dyn ObjectStream>), ExchangeError>;
}

/// tokio-tungstenite backed connector
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    url: String,
    exchange_name: String,
    settings: WsSettings,
}

impl TungsteniteConnector {
    pub fn new(url: String, exchange_name: String, settings: WsSettings) -> Self {
        Self {
            url,
            exchange_name,
            settings,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn socket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.settings.read_limit);
        config.max_frame_size = Some(self.settings.read_limit);
        config
    }
}

#[async_trait]
impl WsConnector for TungsteniteConnector {
    #[instrument(skip(self), fields(exchange = %self.exchange_name, url = %self.url))]
    async fn connect(
        &self,
    ) -> Result<(Box<dyn ObjectSink>, Box<dyn ObjectStream>), ExchangeError> {
        let connection = tokio::time::timeout(
            self.settings.connect_timeout,
            connect_async_with_config(self.url.as_str(), Some(self.socket_config()), true),
        );

        let (ws_stream, _) = connection
            .await
            .map_err(|_| {
                ExchangeError::ConnectionTimeout("WebSocket connection timeout".to_string())
            })?
            .map_err(|e| {
                ExchangeError::NetworkError(format!("WebSocket connection failed: {}", e))
            })?;

        let (write, read) = ws_stream.split();
        Ok((
            Box::new(TungsteniteSink { write: Some(write) }),
            Box::new(TungsteniteStream { read }),
        ))
    }
}

struct TungsteniteSink {
    write: Option<SplitSink<WsStream, Message>>,
}

#[async_trait]
impl ObjectSink for TungsteniteSink {
    async fn write_object(&mut self, value: &Value) -> Result<(), ExchangeError> {
        let write = self.write.as_mut().ok_or_else(|| {
            ExchangeError::NetworkError("WebSocket write stream not available".to_string())
        })?;

        let text = serde_json::to_string(value)
            .map_err(|e| ExchangeError::SerializationError(e.to_string()))?;
        write.send(Message::Text(text)).await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to send WebSocket message: {}", e))
        })
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        if let Some(mut write) = self.write.take() {
            let _ = write.send(Message::Close(None)).await;
        }
        Ok(())
    }
}

struct TungsteniteStream {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl ObjectStream for TungsteniteStream {
    async fn read_object(&mut self) -> Option<Result<Value, ExchangeError>> {
        loop {
            let payload = match self.read.next().await? {
                Ok(Message::Text(text)) => text.into_bytes(),
                Ok(Message::Binary(data)) => data,
                // tungstenite queues the pong reply itself
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Ok(Message::Close(frame)) => {
                    trace!(?frame, "WebSocket closed by peer");
                    return None;
                }
                Err(e) => {
                    return Some(Err(ExchangeError::NetworkError(format!(
                        "WebSocket error: {}",
                        e
                    ))))
                }
            };

            match serde_json::from_slice::<Value>(&payload) {
                Ok(value) => return Some(Ok(value)),
                Err(e) => warn!("Dropping undecodable WebSocket frame: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_config_applies_read_limit() {
        let settings = WsSettings {
            read_limit: 4096,
            ..WsSettings::default()
        };
        let connector =
            TungsteniteConnector::new("wss://example.invalid".into(), "deribit".into(), settings);
        let config = connector.socket_config();
        assert_eq!(config.max_message_size, Some(4096));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_host_fails() {
        let settings = WsSettings {
            connect_timeout: std::time::Duration::from_secs(2),
            ..WsSettings::default()
        };
        let connector =
            TungsteniteConnector::new("ws://127.0.0.1:1".into(), "deribit".into(), settings);
        let result = connector.connect().await;
        assert!(matches!(
            result,
            Err(ExchangeError::NetworkError(_) | ExchangeError::ConnectionTimeout(_))
        ));
    }
}
