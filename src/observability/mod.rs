//! Observability for the realtime subscription layer
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle and diagnostic events
//!
//! Observability never fails the caller.
//!
//! ```ignore
//! use portal_realtime::observability::{log_event, Event};
//!
//! log_event(Event::UnknownEvent, &[("channel", "databases.main.collections.orders.documents")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

#[cfg(test)]
pub(crate) use logger::capture_logs;

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
