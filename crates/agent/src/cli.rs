use std::path::PathBuf;

use clap::{Parser, Subcommand};
use infrastructure::config::{LogFormat, LogLevel, SinkKind};

#[derive(Parser, Debug)]
#[command(
    name = "policyfw-agent",
    about = "Declarative discard-policy compiler for SDN switches",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML agent configuration (defaults to
    /// /etc/policyfw/agent.yaml when present)
    #[arg(short, long, env = "POLICYFW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Policy document override (takes precedence over config file)
    #[arg(short, long, global = true)]
    pub policies: Option<PathBuf>,

    /// Log level override (takes precedence over config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log format: text (default) or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Enforcement sink: log (default) or json lines on stdout
    #[arg(long)]
    pub sink: Option<SinkKind>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version information
    Version,

    /// Compile the policy document and print one JSON rule per line
    Compile {
        /// Install on this enforcement point instead of the one named
        /// in the policy document
        #[arg(long)]
        switch: Option<u64>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
