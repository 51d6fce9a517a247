//! # Event Dispatcher
//!
//! Turns one raw envelope into at most one call of the caller's handler.
//!
//! ## Delivery
//! Best-effort, at most once. Messages are handled independently; nothing
//! that goes wrong while reading or handling a message escapes this module
//! or affects the subscription.

use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::event::{terminal_segment, ChangeKind, Envelope};
use crate::observability::{log_event, Event};

/// What happened to a single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler was called with this kind
    Delivered(ChangeKind),
    /// First event path named an unrecognised kind
    Unknown(String),
    /// Envelope or payload could not be read
    Malformed(String),
    /// Handler panicked while handling the message
    HandlerPanicked,
}

impl DispatchOutcome {
    /// Whether the handler received the message
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered(_))
    }
}

/// Classify `envelope` and hand its payload to `handler`.
///
/// Only the first event path is consulted.
pub fn dispatch<P, F>(channel: &str, envelope: &Value, handler: &F) -> DispatchOutcome
where
    P: DeserializeOwned,
    F: Fn(ChangeKind, P) + ?Sized,
{
    let envelope = Envelope::new(envelope);
    let kind = match classify(&envelope) {
        Ok(kind) => kind,
        Err(outcome) => {
            report(channel, &envelope, &outcome);
            return outcome;
        }
    };

    let payload = match P::deserialize(envelope.payload()) {
        Ok(payload) => payload,
        Err(e) => {
            let outcome = DispatchOutcome::Malformed(format!("payload: {}", e));
            report(channel, &envelope, &outcome);
            return outcome;
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler(kind, payload))) {
        Ok(()) => DispatchOutcome::Delivered(kind),
        Err(panic) => {
            let outcome = DispatchOutcome::HandlerPanicked;
            let message = panic_message(&*panic);
            log_event(
                Event::HandlerPanicked,
                &[
                    ("channel", channel),
                    ("kind", kind.as_str()),
                    ("error", message.as_str()),
                ],
            );
            outcome
        }
    }
}

fn classify(envelope: &Envelope<'_>) -> Result<ChangeKind, DispatchOutcome> {
    let first = envelope.primary_event().map_err(DispatchOutcome::Malformed)?;

    ChangeKind::from_event_path(first)
        .ok_or_else(|| DispatchOutcome::Unknown(terminal_segment(first).to_string()))
}

fn report(channel: &str, envelope: &Envelope<'_>, outcome: &DispatchOutcome) {
    let raw = envelope.raw().to_string();
    match outcome {
        DispatchOutcome::Unknown(kind) => log_event(
            Event::UnknownEvent,
            &[("channel", channel), ("kind", kind.as_str()), ("envelope", raw.as_str())],
        ),
        DispatchOutcome::Malformed(error) => log_event(
            Event::MalformedMessage,
            &[("channel", channel), ("error", error.as_str()), ("envelope", raw.as_str())],
        ),
        DispatchOutcome::Delivered(_) | DispatchOutcome::HandlerPanicked => {}
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
