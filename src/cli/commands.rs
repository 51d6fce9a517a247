//! CLI command implementations

use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{change_printer, write_json};
use crate::config::RealtimeConfig;
use crate::observability::{log_event, Event, Logger};
use crate::realtime::{Channel, RealtimeClient, WebSocketTransport};

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Watch {
            collection,
            database,
            config,
        } => watch(&collection, database.as_deref(), config.as_deref()),
        Command::Channel {
            collection,
            database,
            config,
        } => channel(&collection, database.as_deref(), config.as_deref()),
    }
}

/// Load configuration from `path`, or from the environment when absent,
/// and apply its log level.
pub fn load_config(path: Option<&Path>) -> CliResult<RealtimeConfig> {
    let (config, source) = match path {
        Some(path) => (RealtimeConfig::from_file(path)?, path.display().to_string()),
        None => (RealtimeConfig::from_env()?, "environment".to_string()),
    };

    Logger::set_min_severity(config.severity()?);
    log_event(
        Event::ConfigLoaded,
        &[("source", source.as_str()), ("database_id", config.database_id.as_str())],
    );
    Ok(config)
}

/// Print the wire channel name and registry key
pub fn channel(collection: &str, database: Option<&str>, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let channel = Channel::new(database.unwrap_or(&config.database_id), collection)?;

    write_json(&json!({
        "channel": channel.wire_name(),
        "key": channel.key(),
    }))
}

/// Stream changes until Ctrl-C, then release every subscription.
///
/// Stdout carries only change lines; diagnostics go to stderr.
pub fn watch(collection: &str, database: Option<&str>, config_path: Option<&Path>) -> CliResult<()> {
    Logger::reserve_stdout();
    let config = load_config(config_path)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(async {
        let transport = Arc::new(WebSocketTransport::from_config(&config)?);
        let client = RealtimeClient::new(transport, &config);

        let key = client.subscribe_to_channel(collection, change_printer(io::stdout()), database)?;
        Logger::info("CLI_WATCH_STARTED", &[("key", key.as_str())]);

        let interrupted = tokio::signal::ctrl_c()
            .await
            .map_err(|e| CliError::io_error(format!("Failed to wait for Ctrl-C: {}", e)));

        client.unsubscribe_from_all();
        Logger::info("CLI_WATCH_STOPPED", &[("key", key.as_str())]);

        interrupted
    })
}
