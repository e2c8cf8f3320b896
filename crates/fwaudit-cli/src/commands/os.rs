//! The `os` command family: object store management.

use std::path::Path;

use fwaudit_store::{apply_object_file, Network, ObjectFile};

use crate::args::CommandArgs;
use crate::commands::{emit_table, CmdResult, Flow};
use crate::shell::Session;

pub fn execute(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (sub, rest) = tokens.split_first().ok_or("usage: os load|info|clear")?;
    let args = CommandArgs::parse(rest)?;

    match *sub {
        "load" => {
            args.expect_words(1, "os load <objects.toml>")?;
            let path = args.word(0).expect("checked");
            let file = ObjectFile::load(Path::new(path)).map_err(|err| err.to_string())?;
            apply_object_file(&file, &mut session.network).map_err(|err| err.to_string())?;
            println!("object definitions loaded from {path}");
            Ok(Flow::Continue)
        }
        "info" => {
            emit_table(session, &session.network.object_info(), &args)?;
            Ok(Flow::Continue)
        }
        "clear" => {
            // Firewalls reference catalog objects, so the whole network
            // is rebuilt together.
            let ip_model = session.network.ip_model();
            let options = session.network.model_options();
            session.network = Network::new(ip_model, options);
            session.selected = None;
            println!("object store cleared");
            Ok(Flow::Continue)
        }
        other => Err(format!("unknown os command '{other}'")),
    }
}
