//! # Realtime Transport
//!
//! The capability the subscription layer consumes: open a subscription on
//! a wire channel with a message handler, get back a teardown.
//!
//! [`MemoryTransport`] delivers synchronously inside the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::errors::{RealtimeError, RealtimeResult};

/// Releases one underlying subscription. Consumed on call, so it runs at most once.
pub type Teardown = Box<dyn FnOnce() + Send + 'static>;

/// Receives raw envelopes for one channel
pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// A source of realtime messages
pub trait RealtimeTransport: Send + Sync {
    /// Open a subscription on `channel`.
    ///
    /// Returns as soon as the subscription is requested; the connection may
    /// still be negotiating. An `Err` means nothing was acquired.
    fn subscribe(&self, channel: &str, handler: MessageHandler) -> RealtimeResult<Teardown>;
}

type HandlerTable = HashMap<String, HashMap<u64, MessageHandler>>;

/// In-process transport
#[derive(Default)]
pub struct MemoryTransport {
    handlers: Arc<RwLock<HandlerTable>>,
    next_id: AtomicU64,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `envelope` to every handler on `channel`. Returns the number of handlers reached.
    pub fn publish(&self, channel: &str, envelope: Value) -> usize {
        // Handlers run outside the lock so they may subscribe or tear down
        let targets: Vec<MessageHandler> = match self.handlers.read() {
            Ok(handlers) => handlers
                .get(channel)
                .map(|subs| subs.values().cloned().collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        for handler in &targets {
            handler(envelope.clone());
        }

        targets.len()
    }

    /// Open handlers on `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.handlers
            .read()
            .map(|handlers| handlers.get(channel).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    /// Open handlers across all channels
    pub fn total_subscribers(&self) -> usize {
        self.handlers
            .read()
            .map(|handlers| handlers.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }
}

impl RealtimeTransport for MemoryTransport {
    fn subscribe(&self, channel: &str, handler: MessageHandler) -> RealtimeResult<Teardown> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .write()
            .map_err(|_| RealtimeError::TransportUnavailable("handler table lock poisoned".into()))?
            .entry(channel.to_string())
            .or_default()
            .insert(id, handler);

        let table = Arc::clone(&self.handlers);
        let channel = channel.to_string();
        Ok(Box::new(move || {
            if let Ok(mut handlers) = table.write() {
                if let Some(subs) = handlers.get_mut(&channel) {
                    subs.remove(&id);
                    if subs.is_empty() {
                        handlers.remove(&channel);
                    }
                }
            }
        }))
    }
}
