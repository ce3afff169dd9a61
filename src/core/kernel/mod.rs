//! Transport kernel shared by the WebSocket and REST surfaces
//!
//! The kernel knows JSON-RPC 2.0 and how to move JSON values over a socket or
//! HTTP. It contains no Deribit method names or channel conventions.
//!
//! ## Transport Layer
//! - `WsConnector`: dials a session and hands back an `ObjectSink` / `ObjectStream` pair
//! - `TungsteniteConnector`: tokio-tungstenite implementation with connect timeout and read limit
//! - `RestClient`: HTTP calls of named methods, unwrapping the JSON-RPC envelope
//!
//! ## Correlation
//! - `RpcConnection`: assigns ids, matches responses to waiting callers and
//!   forwards push notifications to an `EventSink`
//!
//! ## Authentication
//! - `Signer` / `HmacSigner`: HMAC-SHA256 signatures for the `client_signature` grant
//!
//! # Example
//! ```rust,no_run
//! use deribit_api::core::config::WsSettings;
//! use deribit_api::core::kernel::*;
//! use std::sync::Arc;
//!
//! struct PrintEvents;
//!
//! impl EventSink for PrintEvents {
//!     fn dispatch(&self, event: Event) {
//!         println!("{}: {}", event.channel, event.data);
//!     }
//! }
//!
//! # async fn example() -> Result<(), deribit_api::ExchangeError> {
//! let connector = TungsteniteConnector::new(
//!     "wss://test.deribit.com/ws/api/v2".to_string(),
//!     "deribit".to_string(),
//!     WsSettings::default(),
//! );
//! let (sink, stream) = connector.connect().await?;
//! let rpc = RpcConnection::new(sink, stream, Arc::new(PrintEvents), false);
//! let now = rpc.call("public/get_time", serde_json::json!({}), None).await?;
//! println!("server time: {}", now);
//! # Ok(())
//! # }
//! ```
pub mod codec;
pub mod rest;
pub mod rpc;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::{Event, RpcEnvelope, RpcErrorObject, RpcRequest};
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use rpc::{EventSink, RpcConnection};
pub use signer::{ClientSignature, HmacSigner, Signer};
pub use ws::{ObjectSink, ObjectStream, TungsteniteConnector, WsConnector};
