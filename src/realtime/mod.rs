//! # Real-Time Subscriptions
//!
//! Document-change notifications for database collections.
//!
//! ## Architecture
//!
//! - **Transport**: opens a wire channel, delivers raw envelopes, hands back a teardown
//! - **Registry**: owns one teardown per channel key
//! - **Dispatcher**: classifies each envelope and calls the caller's handler (best-effort)
//! - **Client**: subscribe/unsubscribe orchestration over transport + registry
//! - **WebSocket**: network transport for the backend's realtime endpoint
//!
//! ```ignore
//! use std::sync::Arc;
//! use portal_realtime::config::RealtimeConfig;
//! use portal_realtime::realtime::{MemoryTransport, RealtimeClient};
//!
//! let client = RealtimeClient::new(Arc::new(MemoryTransport::new()), &RealtimeConfig::default());
//! let key = client.subscribe_to_channel("orders", |kind, doc: serde_json::Value| {
//!     println!("{} {}", kind, doc);
//! }, None)?;
//! client.unsubscribe_from_channel(&key);
//! ```

pub mod channel;
pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod event;
pub mod subscription;
pub mod transport;
pub mod websocket;

pub use channel::Channel;
pub use client::RealtimeClient;
pub use dispatcher::{dispatch, DispatchOutcome};
pub use errors::{RealtimeError, RealtimeResult};
pub use event::{document_event_path, ChangeKind, Envelope};
pub use subscription::SubscriptionRegistry;
pub use transport::{MemoryTransport, MessageHandler, RealtimeTransport, Teardown};
pub use websocket::{WebSocketConfig, WebSocketTransport};
