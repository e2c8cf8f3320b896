//! The `bdd` command family: engine introspection.

use fwaudit_model::DomainKind;

use crate::commands::{CmdResult, Flow};
use crate::shell::Session;

pub fn execute(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (sub, _rest) = tokens.split_first().ok_or("usage: bdd info|gc")?;

    match *sub {
        "info" => {
            println!("engine: biodivine-lib-bdd");
            println!("configured node table size : {}", session.config.bdd.node_size);
            println!("configured cache size      : {}", session.config.bdd.cache_size);
            println!("allocated variables        : {}", session.domains.num_vars());
            println!();
            println!("domain variable blocks");
            println!("----------------------");
            for kind in DomainKind::ALL {
                println!("{kind:?}: {} bit(s)", kind.width());
            }
            Ok(Flow::Continue)
        }
        "gc" => {
            // Node storage is reference-counted inside the engine; there
            // is no global table to collect.
            println!("nodes are reclaimed automatically; nothing to collect");
            Ok(Flow::Continue)
        }
        other => Err(format!("unknown bdd command '{other}'")),
    }
}
