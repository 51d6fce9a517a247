//! CLI module
//!
//! Provides command-line interface for:
//! - watch: stream collection changes as JSON lines until Ctrl-C
//! - channel: print the channel name and registry key for a collection

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{channel, load_config, run_command, watch};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{change_line, write_json};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
