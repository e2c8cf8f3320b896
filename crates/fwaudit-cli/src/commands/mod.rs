//! Command dispatch.

mod bdd;
mod fw;
mod nw;
mod opt;
mod os;

use std::fs::File;
use std::io::BufWriter;

use fwaudit_model::Table;

use crate::args::CommandArgs;
use crate::interrupt;
use crate::render;
use crate::shell::Session;

pub enum Flow {
    Continue,
    Quit,
}

/// Command errors are plain messages; the shell prints them and goes on.
pub type CmdResult = Result<Flow, String>;

pub fn dispatch(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (family, rest) = tokens.split_first().expect("shell skips empty lines");
    match *family {
        "fw" => fw::execute(session, rest),
        "nw" => nw::execute(session, rest),
        "os" => os::execute(session, rest),
        "opt" => opt::execute(session, rest),
        "bdd" => bdd::execute(session, rest),
        "help" => {
            print_help();
            Ok(Flow::Continue)
        }
        "quit" | "exit" => Ok(Flow::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn print_help() {
    println!("commands:");
    println!("  fw create|select|copy|delete|load|info|show|check ...");
    println!("  nw list");
    println!("  os load|info|clear");
    println!("  opt enable|disable|show app|usr|url");
    println!("  bdd info|gc");
    println!("  quit");
}

/// Renders a table to stdout or, with `-o`, to a file; a `.csv` suffix
/// selects CSV output.
pub(crate) fn emit_table(
    session: &Session,
    table: &Table,
    args: &CommandArgs,
) -> Result<(), String> {
    let poll = || interrupt::observed();
    let result = match &args.output {
        None => render::write_text(table, &mut std::io::stdout(), &poll),
        Some(path) => {
            let file = File::create(path).map_err(|err| format!("cannot write {path}: {err}"))?;
            let mut out = BufWriter::new(file);
            if path.to_ascii_lowercase().ends_with(".csv") {
                render::write_csv(table, &mut out, session.config.loader.list_delimiter, &poll)
            } else {
                render::write_text(table, &mut out, &poll)
            }
        }
    };
    result.map_err(|err| err.to_string())
}
