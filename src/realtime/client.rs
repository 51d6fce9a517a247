//! # Realtime Client
//!
//! Bridges "notify me about changes to collection C in database D" to a
//! transport and the subscription registry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::channel::Channel;
use super::dispatcher::dispatch;
use super::errors::RealtimeResult;
use super::event::ChangeKind;
use super::subscription::SubscriptionRegistry;
use super::transport::{MessageHandler, RealtimeTransport};
use crate::config::RealtimeConfig;

/// Subscribes to collection changes and owns their teardown through a registry
pub struct RealtimeClient {
    transport: Arc<dyn RealtimeTransport>,
    registry: Arc<SubscriptionRegistry>,
    default_database: String,
}

impl RealtimeClient {
    /// Create a client with its own registry
    pub fn new(transport: Arc<dyn RealtimeTransport>, config: &RealtimeConfig) -> Self {
        Self::with_registry(transport, Arc::new(SubscriptionRegistry::new()), config)
    }

    /// Create a client that shares `registry` with other components
    pub fn with_registry(
        transport: Arc<dyn RealtimeTransport>,
        registry: Arc<SubscriptionRegistry>,
        config: &RealtimeConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            default_database: config.database_id.clone(),
        }
    }

    /// Database used when a subscription names none
    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Registry backing this client
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Subscribe to document changes in `collection_id`.
    ///
    /// `database_id` falls back to the configured default. Returns the channel
    /// key for [`RealtimeClient::unsubscribe_from_channel`]. Subscribing again to
    /// the same key replaces the earlier subscription.
    ///
    /// On error nothing is registered.
    pub fn subscribe_to_channel<P, F>(
        &self,
        collection_id: &str,
        on_event: F,
        database_id: Option<&str>,
    ) -> RealtimeResult<String>
    where
        P: DeserializeOwned + 'static,
        F: Fn(ChangeKind, P) + Send + Sync + 'static,
    {
        let database_id = database_id.unwrap_or(&self.default_database);
        let channel = Channel::new(database_id, collection_id)?;
        let wire_name = channel.wire_name();
        let key = channel.key();

        let handler: MessageHandler = {
            let wire_name = wire_name.clone();
            Arc::new(move |envelope: Value| {
                dispatch(&wire_name, &envelope, &on_event);
            })
        };

        let teardown = self.transport.subscribe(&wire_name, handler)?;
        self.registry.add(key.clone(), teardown);

        Ok(key)
    }

    /// Tear down one subscription. Unknown keys are a no-op.
    pub fn unsubscribe_from_channel(&self, key: &str) {
        self.registry.remove(key);
    }

    /// Tear down every subscription in the registry
    pub fn unsubscribe_from_all(&self) {
        self.registry.remove_all();
    }

    /// Number of subscriptions the registry holds
    pub fn active_count(&self) -> usize {
        self.registry.count()
    }
}
