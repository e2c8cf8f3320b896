//! The `opt` command family: modeling toggles.

use crate::commands::{CmdResult, Flow};
use crate::shell::Session;

pub fn execute(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let usage = "usage: opt enable|disable app|usr|url, opt show";
    let (sub, rest) = tokens.split_first().ok_or(usage)?;

    match *sub {
        "show" => {
            let options = session.network.model_options();
            println!(
                "application modeling: {}",
                if options.applications { "enabled" } else { "disabled" }
            );
            println!(
                "user modeling:        {}",
                if options.users { "enabled" } else { "disabled" }
            );
            println!(
                "url modeling:         {}",
                if options.urls { "enabled" } else { "disabled" }
            );
            Ok(Flow::Continue)
        }
        "enable" | "disable" => {
            let enabled = *sub == "enable";
            let target = rest.first().ok_or(usage)?;
            let options = session.network.options();
            match *target {
                "app" => options.set_applications(enabled),
                "usr" => options.set_users(enabled),
                "url" => options.set_urls(enabled),
                other => return Err(format!("unknown option '{other}'")),
            }
            Ok(Flow::Continue)
        }
        other => Err(format!("unknown opt command '{other}'")),
    }
}
