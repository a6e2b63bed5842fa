//! CLI module for cloudvox
//!
//! Provides command-line interface parsing for the cloudvox binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cloudvox - keyword-routed AWS operations assistant
///
/// Routes each question to one of three agents: EC2 status, AWS
/// documentation research or invoice management.
#[derive(Parser, Debug)]
#[command(
    name = "cloudvox",
    version,
    about = "cloudvox - keyword-routed AWS operations assistant",
    long_about = "Routes natural-language questions to an EC2 agent, an AWS documentation\n\
                  research agent or an invoice agent, chosen by keyword rules in cloudvox.toml.",
    after_help = "EXAMPLES:\n    \
                  cloudvox ask \"Show me my EC2 instances\"\n    \
                  cloudvox chat                          # Interactive session\n    \
                  cloudvox route \"lambda timeout limits\" # Show which agent would answer\n    \
                  cloudvox config --validate             # Check cloudvox.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "cloudvox.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route one question and print the answer
    Ask {
        /// The question, as spoken
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Interactive session; type `exit` to leave
    Chat,

    /// Show which agent a question would go to, without calling it
    Route {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and report warnings
        #[arg(long)]
        validate: bool,
    },

    /// List enabled agents and routing rules
    Agents,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Join the words of a query given as separate arguments
pub fn join_query(words: &[String]) -> String {
    words.join(" ")
}

/// Commands that end an interactive session
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_globals() {
        let cli = Cli::try_parse_from([
            "cloudvox",
            "ask",
            "show",
            "my",
            "servers",
            "--config",
            "other.toml",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(cli.no_color);
        match cli.command {
            Commands::Ask { query } => assert_eq!(join_query(&query), "show my servers"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_route_json() {
        let cli = Cli::try_parse_from(["cloudvox", "route", "lambda limits", "--json"]).unwrap();

        assert_eq!(cli.config, PathBuf::from("cloudvox.toml"));
        assert!(matches!(cli.command, Commands::Route { json: true, .. }));
    }

    #[test]
    fn test_ask_requires_query() {
        assert!(Cli::try_parse_from(["cloudvox", "ask"]).is_err());
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command(" EXIT "));
        assert!(is_exit_command("q"));
        assert!(!is_exit_command("quit smoking"));
    }
}
