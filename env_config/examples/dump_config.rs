//! Resolve configuration for the current directory and print every key.
//!
//! Control the resolver with `ENV_CONFIG_*` variables, for example
//! `ENV_CONFIG_ENVIRONMENT=test,staging`. Set `RUST_LOG=env_config=debug` to
//! see which sources were loaded.

use std::io::{self, Write};
use std::process::ExitCode;

use env_config::EnvConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let config = match EnvConfig::from_process() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration could not be resolved");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    let written = writeln!(stdout, "# environments: {}", config.environments())
        .and_then(|()| write!(stdout, "{config}"))
        .and_then(|()| stdout.flush());
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "could not write configuration");
            ExitCode::FAILURE
        }
    }
}
