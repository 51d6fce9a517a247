//! JSON line output for the CLI
//!
//! One JSON object per line on stdout, UTF-8.

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};
use crate::observability::Logger;
use crate::realtime::ChangeKind;

/// Write a JSON value as one line to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_json_to(&mut stdout, value)
}

/// Write a JSON value as one line to `writer`
pub fn write_json_to<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Line printed for a delivered change
pub fn change_line(kind: ChangeKind, payload: Value) -> Value {
    json!({
        "event": kind.as_str(),
        "payload": payload,
    })
}

/// Change handler that writes one line per delivered change to `out`
pub fn change_printer<W>(out: W) -> impl Fn(ChangeKind, Value) + Send + Sync + 'static
where
    W: Write + Send + 'static,
{
    let out = Mutex::new(out);
    move |kind: ChangeKind, payload: Value| {
        let written = match out.lock() {
            Ok(mut out) => write_json_to(&mut *out, &change_line(kind, payload)),
            Err(_) => Err(CliError::io_error("output lock poisoned")),
        };
        if let Err(e) = written {
            Logger::error("CLI_OUTPUT_FAILED", &[("error", e.message())]);
        }
    }
}
