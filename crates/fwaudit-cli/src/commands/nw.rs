//! The `nw` command family: network-wide views.

use crate::args::CommandArgs;
use crate::commands::{emit_table, CmdResult, Flow};
use crate::shell::Session;

pub fn execute(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (sub, rest) = tokens.split_first().ok_or("usage: nw list")?;
    match *sub {
        "list" => {
            let args = CommandArgs::parse(rest)?;
            emit_table(session, &session.network.info(), &args)?;
            Ok(Flow::Continue)
        }
        other => Err(format!("unknown nw command '{other}'")),
    }
}
