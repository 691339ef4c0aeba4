use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Polls news pages and feeds and posts new items to a chat destination")]
#[command(version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start every poller and accept operator commands on stdin
    Run {
        /// Dry run - log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the configured sources
    List,

    /// Run one cycle for a single source and print the notification
    Check {
        /// Source name or alias
        name: String,

        /// Actually send the notification to the destination
        #[arg(long)]
        deliver: bool,
    },
}

/// A line typed at the operator console while `run` is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Status,
    Toggle(String),
    Help,
    Quit,
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_lowercase();
        let argument = words.next();

        match (command.as_str(), argument) {
            ("status", None) => Ok(OperatorCommand::Status),
            ("toggle", Some(name)) => Ok(OperatorCommand::Toggle(name.to_string())),
            ("toggle", None) => Err("The `toggle` command needs a source name.".to_string()),
            ("help" | "?", None) => Ok(OperatorCommand::Help),
            ("quit" | "exit", None) => Ok(OperatorCommand::Quit),
            ("", None) => Err(String::new()),
            _ => Err(format!("Unknown command: {}", line.trim())),
        }
    }
}
