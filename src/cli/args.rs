//! CLI argument definitions using clap
//!
//! Commands:
//! - wikistore init --config <path>
//! - wikistore start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wikistore - versioned wiki pages with signed sessions
#[derive(Parser, Debug)]
#[command(name = "wikistore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and a fresh session secret
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./wikistore.json")]
        config: PathBuf,
    },

    /// Open the store and serve JSON-lines requests from stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./wikistore.json")]
        config: PathBuf,
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
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["wikistore", "start"]).unwrap();
        match cli.command {
            Command::Start { config } => assert_eq!(config, PathBuf::from("./wikistore.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_path() {
        let cli = Cli::try_parse_from(["wikistore", "init", "--config", "/etc/wiki.json"]).unwrap();
        assert!(matches!(cli.command, Command::Init { config } if config == PathBuf::from("/etc/wiki.json")));
    }
}
