//! portal-realtime - realtime document-change subscriptions
//!
//! A process-wide [`realtime::SubscriptionRegistry`] owns the teardown of
//! every open channel; [`realtime::RealtimeClient`] opens channels over a
//! [`realtime::RealtimeTransport`] and dispatches classified changes.

pub mod cli;
pub mod config;
pub mod observability;
pub mod realtime;
