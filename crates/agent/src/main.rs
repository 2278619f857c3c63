#![forbid(unsafe_code)]

mod cli;
mod commands;
mod reload;
mod shutdown;
mod startup;

use std::path::Path;

use anyhow::Result;
use infrastructure::constants::{DEFAULT_CONFIG_PATH, GRACEFUL_SHUTDOWN_TIMEOUT};
use infrastructure::logging::init_logging;

use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();

    if let Some(Command::Version) = cli.command {
        println!("policyfw-agent {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = startup::resolve_config(&cli, Path::new(DEFAULT_CONFIG_PATH))?;
    init_logging(config.agent.log_level, config.agent.log_format)?;

    match cli.command {
        Some(Command::Compile { switch }) => {
            let count = commands::cmd_compile(&config, switch, std::io::stdout())?;
            tracing::info!(count, "policy document compiled");
            Ok(())
        }
        Some(Command::Version) => Ok(()),
        None => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(startup::run(config));
            // A blocking stdin read cannot be cancelled.
            runtime.shutdown_timeout(GRACEFUL_SHUTDOWN_TIMEOUT);
            result
        }
    }
}
