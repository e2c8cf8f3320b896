//! The one-command-per-line shell.

use std::io::{BufRead, Write};

use fwaudit_model::Domains;
use fwaudit_store::{FqdnResolver, Network, StoreConfig};
use tracing::error;

use crate::commands::{self, Flow};
use crate::interrupt;

/// Everything a command can touch.
pub struct Session {
    pub domains: Domains,
    pub network: Network,
    pub fqdn: FqdnResolver,
    pub config: StoreConfig,
    /// Name of the firewall `fw` commands operate on.
    pub selected: Option<String>,
}

/// Reads commands until quit or end of input. Returns the process exit
/// code: 0 for a graceful quit, nonzero when a fatal error stopped the
/// shell.
pub fn run(session: &mut Session, input: &mut dyn BufRead, interactive: bool) -> i32 {
    let mut line = String::new();
    loop {
        if interactive {
            print!("fwaudit> ");
            let _ = std::io::stdout().flush();
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "cannot read command input");
                return 2;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        interrupt::rearm();
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        match commands::dispatch(session, &tokens) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => return 0,
            Err(message) => println!("error: {message}"),
        }
    }
}
