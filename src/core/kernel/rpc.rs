use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::{
    classify, decode_event, peek_id, Event, Inbound, RpcEnvelope, RpcRequest,
};
use crate::core::kernel::ws::{ObjectSink, ObjectStream};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

/// Receiver of push notifications decoded by the correlator
///
/// Called from the single receive loop, so implementations must return quickly.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: Event);
}

type CallResult = Result<Value, ExchangeError>;

#[derive(Default)]
struct PendingCalls {
    closed: bool,
    calls: HashMap<u64, oneshot::Sender<CallResult>>,
}

struct Shared {
    pending: Mutex<PendingCalls>,
    /// Asks the receive loop to stop
    stop: CancellationToken,
    /// Cancelled once the receive loop has exited and pending calls were failed
    closed: CancellationToken,
    events: Arc<dyn EventSink>,
    debug: bool,
}

impl Shared {
    fn register(&self, id: u64) -> Result<oneshot::Receiver<CallResult>, ExchangeError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.closed {
            return Err(ExchangeError::ConnectionLost);
        }
        let (tx, rx) = oneshot::channel();
        pending.calls.insert(id, tx);
        Ok(rx)
    }

    fn take(&self, id: u64) -> Option<oneshot::Sender<CallResult>> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .remove(&id)
    }

    fn fail_all(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.closed = true;
            pending.calls.drain().collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "Failing in-flight calls after disconnect");
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(ExchangeError::ConnectionLost));
        }
    }

    fn handle_inbound(&self, value: Value) {
        if self.debug {
            debug!(frame = %value, "inbound");
        }

        let id = peek_id(&value);
        match classify(value) {
            Ok(Inbound::Response { id, envelope }) => match self.take(id) {
                Some(tx) => {
                    // the caller may have timed out already
                    let _ = tx.send(envelope.into_result());
                }
                None => self.forward(&envelope),
            },
            Ok(Inbound::Notification(envelope) | Inbound::Other(envelope)) => {
                self.forward(&envelope);
            }
            Ok(Inbound::Heartbeat(envelope)) => {
                trace!(params = ?envelope.params, "server heartbeat");
            }
            Err(e) => match id.and_then(|id| self.take(id)) {
                Some(tx) => {
                    let _ = tx.send(Err(e));
                }
                None => warn!("Dropping malformed message: {}", e),
            },
        }
    }

    fn forward(&self, envelope: &RpcEnvelope) {
        match decode_event(envelope) {
            Ok(event) => self.events.dispatch(event),
            Err(e) => warn!("Dropping push notification: {}", e),
        }
    }
}

/// Removes a registered id when the waiting call goes away for any reason
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.take(self.id);
    }
}

/// JSON-RPC correlator over one transport session
///
/// Owns the write half behind an async mutex and a background task that is
/// the only reader of the stream. Responses are routed to callers by id,
/// everything else goes to the [`EventSink`].
pub struct RpcConnection {
    sink: tokio::sync::Mutex<Box<dyn ObjectSink>>,
    next_id: AtomicU64,
    shared: Arc<Shared>,
}

impl RpcConnection {
    pub fn new(
        sink: Box<dyn ObjectSink>,
        stream: Box<dyn ObjectStream>,
        events: Arc<dyn EventSink>,
        debug: bool,
    ) -> Arc<Self> {
        let shared = Arc::new(Shared {
            pending: Mutex::new(PendingCalls::default()),
            stop: CancellationToken::new(),
            closed: CancellationToken::new(),
            events,
            debug,
        });

        tokio::spawn(receive_loop(shared.clone(), stream));

        Arc::new(Self {
            sink: tokio::sync::Mutex::new(sink),
            next_id: AtomicU64::new(1),
            shared,
        })
    }

    /// Send `method` and wait for its matching response
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ExchangeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rx = self.shared.register(id)?;
        let _guard = PendingGuard {
            shared: &self.shared,
            id,
        };

        let frame = serde_json::to_value(RpcRequest::new(id, method, &params))
            .map_err(|e| ExchangeError::SerializationError(e.to_string()))?;
        if self.shared.debug {
            debug!(frame = %frame, "outbound");
        }

        self.sink.lock().await.write_object(&frame).await?;

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| {
                ExchangeError::RequestTimeout {
                    method: method.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                }
            })?,
            None => rx.await,
        };

        outcome.unwrap_or(Err(ExchangeError::ConnectionLost))
    }

    /// Close the transport and fail every in-flight call
    pub async fn close(&self) {
        self.shared.fail_all();
        self.shared.stop.cancel();
        if let Err(e) = self.sink.lock().await.close().await {
            debug!("Error while closing WebSocket: {}", e);
        }
    }

    /// Token cancelled once the session is gone
    pub fn closed_token(&self) -> CancellationToken {
        self.shared.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    pub fn pending_calls(&self) -> usize {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .len()
    }
}

impl Drop for RpcConnection {
    fn drop(&mut self) {
        self.shared.stop.cancel();
    }
}

async fn receive_loop(shared: Arc<Shared>, mut stream: Box<dyn ObjectStream>) {
    loop {
        let next = tokio::select! {
            () = shared.stop.cancelled() => break,
            next = stream.read_object() => next,
        };

        match next {
            Some(Ok(value)) => shared.handle_inbound(value),
            Some(Err(e)) => {
                warn!("WebSocket read failed: {}", e);
                break;
            }
            None => {
                debug!("WebSocket stream ended");
                break;
            }
        }
    }

    shared.fail_all();
    shared.closed.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    struct ChannelSink(mpsc::UnboundedSender<Value>);

    #[async_trait]
    impl ObjectSink for ChannelSink {
        async fn write_object(&mut self, value: &Value) -> Result<(), ExchangeError> {
            self.0
                .send(value.clone())
                .map_err(|_| ExchangeError::NetworkError("peer gone".to_string()))
        }

        async fn close(&mut self) -> Result<(), ExchangeError> {
            Ok(())
        }
    }

    struct ChannelStream(mpsc::UnboundedReceiver<Value>);

    #[async_trait]
    impl ObjectStream for ChannelStream {
        async fn read_object(&mut self) -> Option<Result<Value, ExchangeError>> {
            self.0.recv().await.map(Ok)
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl EventSink for Recorder {
        fn dispatch(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct Harness {
        rpc: Arc<RpcConnection>,
        outbound: mpsc::UnboundedReceiver<Value>,
        inbound: mpsc::UnboundedSender<Value>,
        events: Arc<Recorder>,
    }

    fn harness() -> Harness {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let events = Arc::new(Recorder::default());
        let rpc = RpcConnection::new(
            Box::new(ChannelSink(out_tx)),
            Box::new(ChannelStream(in_rx)),
            events.clone(),
            true,
        );
        Harness {
            rpc,
            outbound: out_rx,
            inbound: in_tx,
            events,
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_result_is_decoded() {
        let mut h = harness();
        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move { rpc.call("public/get_time", json!({}), None).await });

        let request = h.outbound.recv().await.unwrap();
        assert_eq!(request["id"], 1);
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["params"], json!({}));

        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": 1, "result": 1_610_000_000_000_u64}))
            .unwrap();
        let result = call.await.unwrap().unwrap();
        assert_eq!(result.as_u64(), Some(1_610_000_000_000));
    }

    #[tokio::test]
    async fn test_responses_in_reverse_order_reach_their_callers() {
        let mut h = harness();
        let first = {
            let rpc = h.rpc.clone();
            tokio::spawn(async move { rpc.call("public/test", json!({"n": 1}), None).await })
        };
        let first_req = h.outbound.recv().await.unwrap();
        let second = {
            let rpc = h.rpc.clone();
            tokio::spawn(async move { rpc.call("public/test", json!({"n": 2}), None).await })
        };
        let second_req = h.outbound.recv().await.unwrap();

        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": second_req["id"], "result": "second"}))
            .unwrap();
        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": first_req["id"], "result": "first"}))
            .unwrap();

        assert_eq!(first.await.unwrap().unwrap(), json!("first"));
        assert_eq!(second.await.unwrap().unwrap(), json!("second"));
    }

    #[tokio::test]
    async fn test_disconnect_fails_pending_calls() {
        let mut h = harness();
        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move { rpc.call("public/test", json!({}), None).await });
        h.outbound.recv().await.unwrap();

        drop(h.inbound);
        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, ExchangeError::ConnectionLost));

        h.rpc.closed_token().cancelled().await;
        assert!(h.rpc.is_closed());
        let err = h.rpc.call("public/test", json!({}), None).await.unwrap_err();
        assert!(matches!(err, ExchangeError::ConnectionLost));
    }

    #[tokio::test]
    async fn test_timeout_forgets_pending_call() {
        let mut h = harness();
        let err = h
            .rpc
            .call("public/test", json!({}), Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::RequestTimeout { .. }));
        assert_eq!(h.rpc.pending_calls(), 0);
        assert!(h.outbound.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_notifications_and_unmatched_ids_reach_event_sink() {
        let h = harness();
        h.inbound
            .send(json!({
                "jsonrpc": "2.0",
                "method": "subscription",
                "params": {"channel": "ticker.BTC-PERPETUAL.raw", "data": {"last_price": 1.0}}
            }))
            .unwrap();
        h.inbound
            .send(json!({
                "jsonrpc": "2.0",
                "id": 99,
                "params": {"channel": "trades.BTC-PERPETUAL.raw", "data": []}
            }))
            .unwrap();
        h.inbound
            .send(json!({"jsonrpc": "2.0", "method": "subscription", "params": {"bogus": true}}))
            .unwrap();
        h.inbound
            .send(json!({"jsonrpc": "2.0", "method": "heartbeat", "params": {"type": "heartbeat"}}))
            .unwrap();

        // a round trip guarantees the earlier frames were processed
        let rpc = h.rpc.clone();
        let mut outbound = h.outbound;
        let inbound = h.inbound.clone();
        let call = tokio::spawn(async move { rpc.call("public/test", json!({}), None).await });
        let req = outbound.recv().await.unwrap();
        inbound
            .send(json!({"jsonrpc": "2.0", "id": req["id"], "result": {}}))
            .unwrap();
        call.await.unwrap().unwrap();

        let events = h.events.0.lock().unwrap();
        let channels: Vec<_> = events.iter().map(|e| e.channel.as_str()).collect();
        assert_eq!(
            channels,
            vec!["ticker.BTC-PERPETUAL.raw", "trades.BTC-PERPETUAL.raw"]
        );
    }

    #[tokio::test]
    async fn test_malformed_response_fails_its_caller() {
        let mut h = harness();
        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move {
            rpc.call("public/get_time", json!({}), Some(Duration::from_secs(5)))
                .await
        });
        let req = h.outbound.recv().await.unwrap();

        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": req["id"], "error": "not_enough_funds"}))
            .unwrap();

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, ExchangeError::DeserializationError(_)));
        assert_eq!(h.rpc.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_broken_responses_fail_their_callers() {
        let mut h = harness();
        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move { rpc.call("public/test", json!({}), None).await });
        let req = h.outbound.recv().await.unwrap();

        // a string error code and a bogus usIn both break the envelope
        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": 999, "error": {"code": "x", "message": "m"}}))
            .unwrap();
        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": req["id"], "usIn": -1}))
            .unwrap();
        assert!(matches!(
            call.await.unwrap(),
            Err(ExchangeError::DeserializationError(_))
        ));

        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move { rpc.call("public/test", json!({}), None).await });
        let req = h.outbound.recv().await.unwrap();
        h.inbound
            .send(json!({"jsonrpc": "2.0", "id": req["id"]}))
            .unwrap();
        assert!(matches!(
            call.await.unwrap(),
            Err(ExchangeError::ProtocolError(_))
        ));
        assert!(h.events.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_fails_calls_and_signals_closed() {
        let mut h = harness();
        let rpc = h.rpc.clone();
        let call = tokio::spawn(async move { rpc.call("public/test", json!({}), None).await });
        h.outbound.recv().await.unwrap();

        h.rpc.close().await;
        assert!(matches!(
            call.await.unwrap(),
            Err(ExchangeError::ConnectionLost)
        ));
        h.rpc.closed_token().cancelled().await;
    }
}
