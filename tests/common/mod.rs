//! In-memory Deribit stand-in implementing `WsConnector` over tokio channels
#![allow(dead_code)]

use async_trait::async_trait;
use deribit_api::core::config::{DeribitConfig, WsSettings};
use deribit_api::core::kernel::{ObjectSink, ObjectStream, WsConnector};
use deribit_api::ExchangeError;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const SERVER_TIME: u64 = 1_610_000_000_000;

/// Short timings so reconnect scenarios finish quickly
pub fn fast_settings() -> WsSettings {
    WsSettings {
        connect_timeout: Duration::from_millis(500),
        heartbeat_period: Duration::from_millis(100),
        reconnect_delay: Duration::from_millis(20),
        retry_base_delay: Duration::from_millis(10),
        max_connect_attempts: 5,
        call_timeout: Some(Duration::from_millis(500)),
        ..WsSettings::default()
    }
}

pub fn public_config() -> DeribitConfig {
    DeribitConfig::read_only().ws_settings(fast_settings())
}

pub fn private_config() -> DeribitConfig {
    DeribitConfig::new("client-id".to_string(), "client-secret".to_string())
        .ws_settings(fast_settings())
}

#[derive(Default)]
struct State {
    session: Option<(u64, mpsc::UnboundedSender<Value>)>,
    requests: Vec<Value>,
    errors: HashMap<String, (i64, String)>,
    results: HashMap<String, Value>,
    raw: HashMap<String, Value>,
    silent: HashSet<String>,
    deferred_methods: HashSet<String>,
    deferred: Vec<(Value, Value)>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    dials: AtomicUsize,
    failing_dials: AtomicUsize,
    sessions: AtomicU64,
    tokens: AtomicU64,
}

/// Scripted exchange; clones share the same state
#[derive(Clone, Default)]
pub struct MockExchange {
    shared: Arc<Shared>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn WsConnector> {
        Arc::new(self.clone())
    }

    /// Answer `method` with a JSON-RPC error
    pub fn fail_method(&self, method: &str, code: i64, message: &str) {
        self.state()
            .errors
            .insert(method.to_string(), (code, message.to_string()));
    }

    pub fn clear_failure(&self, method: &str) {
        self.state().errors.remove(method);
    }

    pub fn respond_with(&self, method: &str, result: Value) {
        self.state().results.insert(method.to_string(), result);
    }

    /// Answer `method` with `frame` verbatim apart from the request id
    pub fn respond_raw(&self, method: &str, frame: Value) {
        self.state().raw.insert(method.to_string(), frame);
    }

    /// Never answer `method`
    pub fn silence(&self, method: &str) {
        self.state().silent.insert(method.to_string());
    }

    pub fn unsilence(&self, method: &str) {
        self.state().silent.remove(method);
    }

    /// Hold answers to `method` until `release_deferred_reversed`
    pub fn defer(&self, method: &str) {
        self.state().deferred_methods.insert(method.to_string());
    }

    pub fn deferred_count(&self) -> usize {
        self.state().deferred.len()
    }

    /// Send held answers, newest request first
    pub fn release_deferred_reversed(&self) {
        let mut state = self.state();
        let held: Vec<(Value, Value)> = state.deferred.drain(..).rev().collect();
        for (request, result) in held {
            let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
            if let Some((_, tx)) = &state.session {
                let _ = tx.send(reply);
            }
        }
        state.deferred_methods.clear();
    }

    /// Make the next `count` dial attempts fail
    pub fn fail_next_dials(&self, count: usize) {
        self.shared.failing_dials.store(count, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> usize {
        self.shared.dials.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.state().session.is_some()
    }

    /// Drop the live session as if the network went away
    pub fn drop_connection(&self) {
        self.state().session = None;
    }

    /// Push a `subscription` notification
    pub fn notify(&self, channel: &str, data: Value) {
        self.push(json!({
            "jsonrpc": "2.0",
            "method": "subscription",
            "params": {"channel": channel, "data": data}
        }));
    }

    /// Send any raw frame on the live session
    pub fn push(&self, frame: Value) {
        if let Some((_, tx)) = &self.state().session {
            let _ = tx.send(frame);
        }
    }

    pub fn requests(&self) -> Vec<Value> {
        self.state().requests.clone()
    }

    /// Params of every request for `method`, oldest first
    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.state()
            .requests
            .iter()
            .filter(|request| request["method"] == method)
            .map(|request| request["params"].clone())
            .collect()
    }

    pub fn count_of(&self, method: &str) -> usize {
        self.params_of(method).len()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.shared.state.lock().unwrap()
    }

    fn default_result(&self, method: &str, params: &Value) -> Value {
        match method {
            "public/auth" => {
                let n = self.shared.tokens.fetch_add(1, Ordering::SeqCst) + 1;
                json!({
                    "access_token": format!("access-{}", n),
                    "expires_in": 900,
                    "refresh_token": format!("refresh-{}", n),
                    "scope": "session:mock",
                    "token_type": "bearer"
                })
            }
            "public/subscribe" | "private/subscribe" | "public/unsubscribe"
            | "private/unsubscribe" => params["channels"].clone(),
            "public/get_time" => json!(SERVER_TIME),
            "public/get_index_price" => {
                let price = match params["index_name"].as_str() {
                    Some("btc_usd") => 42_000.5,
                    Some("eth_usd") => 2_500.25,
                    _ => 1.0,
                };
                json!({"index_price": price, "estimated_delivery_price": price})
            }
            "public/test" | "public/hello" => json!({"version": "1.2.26"}),
            _ => json!("ok"),
        }
    }

    fn handle(&self, session_id: u64, request: Value) -> Result<(), ExchangeError> {
        let mut state = self.state();
        let tx = match &state.session {
            Some((id, tx)) if *id == session_id => tx.clone(),
            _ => return Err(ExchangeError::ConnectionLost),
        };
        state.requests.push(request.clone());

        let method = request["method"].as_str().unwrap_or_default().to_string();
        let params = request["params"].clone();
        let id = request["id"].clone();

        if state.silent.contains(&method) {
            return Ok(());
        }

        let reply = if let Some(frame) = state.raw.get(&method) {
            let mut frame = frame.clone();
            frame["id"] = id;
            frame
        } else if let Some((code, message)) = state.errors.get(&method) {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
        } else if method.starts_with("private/") && params.get("access_token").is_none() {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": 13009, "message": "unauthorized"}})
        } else {
            let result = state
                .results
                .get(&method)
                .cloned()
                .unwrap_or_else(|| self.default_result(&method, &params));
            if state.deferred_methods.contains(&method) {
                state.deferred.push((request, result));
                return Ok(());
            }
            json!({"jsonrpc": "2.0", "id": id, "result": result, "usIn": 1, "usOut": 2, "usDiff": 1})
        };

        let _ = tx.send(reply);
        Ok(())
    }
}

#[async_trait]
impl WsConnector for MockExchange {
    async fn connect(&self) -> Result<(Box<dyn ObjectSink>, Box<dyn ObjectStream>), ExchangeError> {
        self.shared.dials.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .shared
            .failing_dials
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ExchangeError::NetworkError("connection refused".to_string()));
        }

        let session_id = self.shared.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().session = Some((session_id, tx));

        Ok((
            Box::new(MockSink {
                exchange: self.clone(),
                session_id,
            }),
            Box::new(MockStream { rx }),
        ))
    }
}

struct MockSink {
    exchange: MockExchange,
    session_id: u64,
}

#[async_trait]
impl ObjectSink for MockSink {
    async fn write_object(&mut self, value: &Value) -> Result<(), ExchangeError> {
        self.exchange.handle(self.session_id, value.clone())
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        let mut state = self.exchange.state();
        if matches!(&state.session, Some((id, _)) if *id == self.session_id) {
            state.session = None;
        }
        Ok(())
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<Value>,
}

#[async_trait]
impl ObjectStream for MockStream {
    async fn read_object(&mut self) -> Option<Result<Value, ExchangeError>> {
        self.rx.recv().await.map(Ok)
    }
}

/// Poll `condition` every 10ms for up to 3s
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..300 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
