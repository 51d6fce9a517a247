//! Observable events for the realtime subscription layer
//!
//! Events are explicit and typed. Each event carries its own severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Registry
    /// Channel registered
    Subscribed,
    /// Channel re-registered, previous teardown released
    SubscriptionReplaced,
    /// Channel torn down
    Unsubscribed,
    /// Every channel torn down
    UnsubscribedAll,

    // Dispatch
    /// Event kind outside create/update/delete, message dropped
    UnknownEvent,
    /// Envelope could not be read, message dropped
    MalformedMessage,
    /// Caller handler panicked, message dropped
    HandlerPanicked,

    // Transport
    /// Socket connected
    TransportConnected,
    /// Socket closed or lost
    TransportDisconnected,
    /// Transport-level failure or server error frame
    TransportError,
    /// Server closed for a policy violation, no reconnect
    TransportRejected,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Subscribed => "REALTIME_SUBSCRIBED",
            Event::SubscriptionReplaced => "REALTIME_SUBSCRIPTION_REPLACED",
            Event::Unsubscribed => "REALTIME_UNSUBSCRIBED",
            Event::UnsubscribedAll => "REALTIME_UNSUBSCRIBED_ALL",
            Event::UnknownEvent => "REALTIME_UNKNOWN_EVENT",
            Event::MalformedMessage => "REALTIME_MALFORMED_MESSAGE",
            Event::HandlerPanicked => "REALTIME_HANDLER_PANICKED",
            Event::TransportConnected => "REALTIME_TRANSPORT_CONNECTED",
            Event::TransportDisconnected => "REALTIME_TRANSPORT_DISCONNECTED",
            Event::TransportError => "REALTIME_TRANSPORT_ERROR",
            Event::TransportRejected => "REALTIME_TRANSPORT_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded
            | Event::Subscribed
            | Event::Unsubscribed
            | Event::UnsubscribedAll => Severity::Trace,
            Event::TransportConnected => Severity::Info,
            Event::SubscriptionReplaced
            | Event::UnknownEvent
            | Event::TransportDisconnected => Severity::Warn,
            Event::MalformedMessage
            | Event::HandlerPanicked
            | Event::TransportError
            | Event::TransportRejected => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::UnknownEvent.as_str(), "REALTIME_UNKNOWN_EVENT");
        assert_eq!(Event::MalformedMessage.to_string(), "REALTIME_MALFORMED_MESSAGE");
    }

    #[test]
    fn test_dropped_messages_are_not_quiet() {
        assert!(Event::UnknownEvent.severity() >= Severity::Warn);
        assert!(Event::MalformedMessage.severity() >= Severity::Warn);
        assert!(Event::HandlerPanicked.severity() >= Severity::Warn);
    }
}
