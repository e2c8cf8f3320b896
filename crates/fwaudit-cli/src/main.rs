use std::io::BufReader;

use clap::Parser;
use fwaudit_model::{Domains, IpModel, ModelOptions};
use fwaudit_store::{FqdnResolver, Network, StoreConfig};
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod interrupt;
mod render;
mod shell;

use args::Cli;
use shell::Session;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("fatal: {err:?}");
            2
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };

    let mut session = Session {
        domains: Domains::new(),
        network: Network::new(IpModel::Dual, ModelOptions::none()),
        fqdn: FqdnResolver::from_config(&config.fqdn)?,
        config,
        selected: None,
    };

    interrupt::install();

    if let Some(script) = &cli.script {
        let file = std::fs::File::open(script)?;
        let code = shell::run(&mut session, &mut BufReader::new(file), false);
        if code != 0 || cli.batch {
            return Ok(code);
        }
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    Ok(shell::run(&mut session, &mut input, true))
}
