//! CLI argument definitions using clap
//!
//! Commands:
//! - portal-realtime watch --collection <id> [--database <id>] [--config <path>]
//! - portal-realtime channel --collection <id> [--database <id>] [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// portal-realtime - watch document changes on backend collections
#[derive(Parser, Debug)]
#[command(name = "portal-realtime")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream create/update/delete events for a collection as JSON lines
    Watch {
        /// Collection to watch
        #[arg(long)]
        collection: String,

        /// Database id (defaults to the configured database)
        #[arg(long)]
        database: Option<String>,

        /// JSON configuration file; environment variables are used when absent
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the wire channel name and registry key for a collection
    Channel {
        /// Collection id
        #[arg(long)]
        collection: String,

        /// Database id (defaults to the configured database)
        #[arg(long)]
        database: Option<String>,

        /// JSON configuration file; environment variables are used when absent
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from([
            "portal-realtime",
            "watch",
            "--collection",
            "orders",
            "--database",
            "main",
        ])
        .unwrap();

        match cli.command {
            Command::Watch { collection, database, config } => {
                assert_eq!(collection, "orders");
                assert_eq!(database.as_deref(), Some("main"));
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_collection_required() {
        assert!(Cli::try_parse_from(["portal-realtime", "channel"]).is_err());
    }
}
