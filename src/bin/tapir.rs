//! TAPIR CLI Binary
//!
//! Command-line client for the TAPIR evidence graph server.

use anyhow::Context;
use clap::Parser;
use std::process;
use tapir_client::config::{ClientConfig, ConfigLoader};
use tapir_client::logging::init_logging;
use tapir_client::tooling::cli::{Cli, CliContext};

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigLoader::load().context("loading configuration")?,
    };
    let mut config = config.with_overrides(cli.address.clone(), cli.key.clone(), cli.tls);

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = load_config(cli)?;
    init_logging(Some(&config.logging), cli.log_file.clone()).context("initializing logging")?;
    let context = CliContext::new(&config)
        .with_context(|| format!("connecting to {}", config.address))?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
