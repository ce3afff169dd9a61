use crate::core::kernel::{Event, EventSink};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Emitted after every successful (re)connect, once subscriptions were replayed
pub const EVENT_CONNECTED: &str = "connected";

/// Emitted when the session is lost or closed
pub const EVENT_DISCONNECTED: &str = "disconnected";

/// Handle returned by [`EventDispatcher::on`], used to remove the handler again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Named-event publish/subscribe table
///
/// Handlers run synchronously on the emitting task, in registration order.
/// Push notifications are emitted from the connection's receive loop, so a
/// handler must not block or await a call on the same client.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key` (a channel name or a lifecycle event)
    pub fn on<F>(&self, key: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Register a handler that receives `data` decoded into `T`
    ///
    /// Payloads that fail to decode are logged and skipped.
    pub fn on_typed<T, F>(&self, key: impl Into<String>, handler: F) -> HandlerId
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on(key, move |event: &Event| {
            match serde_json::from_value::<T>(event.data.clone()) {
                Ok(data) => handler(data),
                Err(e) => warn!(channel = %event.channel, "Failed to decode event payload: {}", e),
            }
        })
    }

    /// Remove a handler, returning whether it was registered under `key`
    pub fn off(&self, key: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(key);
        }
        removed
    }

    /// Invoke every handler registered for `key`
    pub fn emit(&self, key: &str, event: &Event) {
        // snapshot so handlers may register or remove handlers themselves
        let snapshot: Vec<Handler> = match self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return,
        };

        for handler in snapshot {
            handler(event);
        }
    }

    pub fn handler_count(&self, key: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, Vec::len)
    }
}

impl EventSink for EventDispatcher {
    fn dispatch(&self, event: Event) {
        self.emit(&event.channel, &event);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("EventDispatcher")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}
