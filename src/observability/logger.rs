//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering
//! - Lines below the process-wide minimum severity are dropped
//! - ERROR and FATAL go to stderr; everything goes to stderr once stdout is reserved

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    fn uses_stderr(&self, stdout_reserved: bool) -> bool {
        stdout_reserved || *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);
static STDOUT_RESERVED: AtomicBool = AtomicBool::new(false);

#[cfg(test)]
thread_local! {
    static CAPTURED: std::cell::RefCell<Option<Vec<String>>> = const { std::cell::RefCell::new(None) };
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Set the minimum severity that is written
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Route every later line to stderr, leaving stdout to program output
    pub fn reserve_stdout() {
        STDOUT_RESERVED.store(true, Ordering::Relaxed);
    }

    /// Whether stdout is reserved for program output
    pub fn stdout_reserved() -> bool {
        STDOUT_RESERVED.load(Ordering::Relaxed)
    }

    /// Whether a line at `severity` would be written
    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }

        let line = Self::format_line(severity, event, fields);

        #[cfg(test)]
        {
            let captured = CAPTURED.with(|c| {
                if let Some(lines) = c.borrow_mut().as_mut() {
                    lines.push(line.clone());
                    true
                } else {
                    false
                }
            });
            if captured {
                return;
            }
        }

        if severity.uses_stderr(Self::stdout_reserved()) {
            Self::write_line(&line, &mut io::stderr());
        } else {
            Self::write_line(&line, &mut io::stdout());
        }
    }

    fn write_line<W: Write>(line: &str, writer: &mut W) {
        // One write per line; failures are never surfaced to callers
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(256);

        output.push_str("{\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");
        output
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

/// Run `f` and return the log lines it produced on this thread
#[cfg(test)]
pub(crate) fn capture_logs<F: FnOnce()>(f: F) -> Vec<String> {
    CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
    f();
    CAPTURED.with(|c| c.borrow_mut().take().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!(" ERROR ".parse::<Severity>().unwrap(), Severity::Error);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_error_and_fatal_use_stderr() {
        assert!(Severity::Error.uses_stderr(false));
        assert!(Severity::Fatal.uses_stderr(false));
        assert!(!Severity::Warn.uses_stderr(false));
        assert!(!Severity::Info.uses_stderr(false));
        assert!(!Severity::Trace.uses_stderr(false));
    }

    #[test]
    fn test_reserved_stdout_sends_everything_to_stderr() {
        for severity in [Severity::Trace, Severity::Info, Severity::Warn, Severity::Error] {
            assert!(severity.uses_stderr(true));
        }
    }

    #[test]
    fn test_log_json_format() {
        let line = Logger::format_line(Severity::Warn, "REALTIME_UNKNOWN_EVENT", &[]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "REALTIME_UNKNOWN_EVENT");
        assert_eq!(parsed["severity"], "WARN");
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_fields_sorted_and_escaped() {
        let line = Logger::format_line(
            Severity::Info,
            "E",
            &[("zeta", "1"), ("alpha", "say \"hi\"\n")],
        );
        let alpha = line.find("alpha").unwrap();
        let zeta = line.find("zeta").unwrap();
        assert!(alpha < zeta);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["alpha"], "say \"hi\"\n");
    }

    #[test]
    fn test_capture_logs() {
        let lines = capture_logs(|| {
            Logger::error("CAPTURED_EVENT", &[("k", "v")]);
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("CAPTURED_EVENT"));
    }
}
