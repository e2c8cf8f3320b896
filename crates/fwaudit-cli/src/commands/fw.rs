//! The `fw` command family: firewall management, listings and checks.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use fwaudit_model::{
    Analyzer, Atom, BddExt, Firewall, PacketTester, PolicyComparator, RuleList, Side, Table,
    TestPacket,
};
use fwaudit_store::{load_policy, TokenResolver};

use crate::args::CommandArgs;
use crate::commands::{emit_table, CmdResult, Flow};
use crate::interrupt;
use crate::render::ConsoleTicker;
use crate::shell::Session;

pub fn execute(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (sub, rest) = tokens
        .split_first()
        .ok_or("usage: fw create|select|copy|delete|load|info|show|check ...")?;

    match *sub {
        "create" => create(session, rest),
        "select" => select(session, rest),
        "copy" => copy(session, rest),
        "delete" => delete(session, rest),
        "load" => load(session, rest),
        "info" => info(session, rest),
        "show" => show(session, rest),
        "check" => check(session, rest),
        other => Err(format!("unknown fw command '{other}'")),
    }
}

fn selected_name(session: &Session) -> Result<String, String> {
    session
        .selected
        .clone()
        .ok_or_else(|| "no firewall selected (use fw create/select)".to_string())
}

fn selected_firewall<'s>(session: &'s Session) -> Result<&'s Firewall, String> {
    let name = selected_name(session)?;
    session
        .network
        .firewall(&name)
        .ok_or_else(|| format!("firewall '{name}' not found"))
}

fn create(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    args.expect_words(1, "fw create <name>")?;
    let name = args.word(0).expect("checked");
    session
        .network
        .add_firewall(Firewall::new(name))
        .map_err(|err| err.to_string())?;
    session.selected = Some(name.to_string());
    println!("firewall '{name}' created and selected");
    Ok(Flow::Continue)
}

fn select(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    args.expect_words(1, "fw select <name>")?;
    let name = args.word(0).expect("checked");
    if session.network.firewall(name).is_none() {
        return Err(format!("firewall '{name}' not found"));
    }
    session.selected = Some(name.to_string());
    Ok(Flow::Continue)
}

fn copy(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    args.expect_words(2, "fw copy <source> <destination>")?;
    let source = args.word(0).expect("checked");
    let destination = args.word(1).expect("checked");

    let duplicate = {
        let firewall = session
            .network
            .firewall(source)
            .ok_or_else(|| format!("firewall '{source}' not found"))?;
        Firewall::duplicate(firewall, destination)
    };
    session
        .network
        .add_firewall(duplicate)
        .map_err(|err| err.to_string())?;
    Ok(Flow::Continue)
}

fn delete(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    args.expect_words(1, "fw delete <name>")?;
    let name = args.word(0).expect("checked");
    session
        .network
        .delete_firewall(name)
        .map_err(|err| err.to_string())?;
    if session.selected.as_deref() == Some(name) {
        session.selected = None;
    }
    Ok(Flow::Continue)
}

fn load(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    args.expect_words(1, "fw load <policy.csv>")?;
    let path = args.word(0).expect("checked");
    let name = selected_name(session)?;

    let file = File::open(path).map_err(|err| format!("cannot read {path}: {err}"))?;
    let status = load_policy(
        BufReader::new(file),
        &mut session.network,
        &mut session.fqdn,
        &name,
        &session.config.loader,
        &|| interrupt::observed(),
    )
    .map_err(|err| err.to_string())?;

    let _ = session.fqdn.save();

    println!("{} rule(s) loaded, {} rejected", status.loaded, status.rejected);
    for missing in &status.unresolved {
        println!(
            "  row {}: unresolved {} token '{}'",
            missing.row, missing.field, missing.token
        );
    }
    for empty in &status.empty_fields {
        println!("  row {}: empty or invalid field '{}'", empty.row, empty.field);
    }
    for id in &status.duplicate_ids {
        println!("  duplicate rule id {id}");
    }
    Ok(Flow::Continue)
}

fn info(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let args = CommandArgs::parse(tokens)?;
    let firewall = selected_firewall(session)?;
    emit_table(session, &firewall.info(), &args)?;
    Ok(Flow::Continue)
}

// ── fw show ────────────────────────────────────────────────────────────

fn show(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (what, rest) = tokens
        .split_first()
        .ok_or("usage: fw show rules|rule|addr|svc|app|usr ...")?;
    let args = CommandArgs::parse(rest)?;

    match *what {
        "rules" => show_rules(session, &args),
        "rule" => show_rule(session, &args),
        "addr" => {
            let table = object_table(
                "addresses",
                selected_firewall(session)?.acl().all_addresses(),
            );
            emit_table(session, &table, &args)?;
            Ok(Flow::Continue)
        }
        "svc" => {
            let table =
                object_table("services", selected_firewall(session)?.acl().all_services());
            emit_table(session, &table, &args)?;
            Ok(Flow::Continue)
        }
        "app" => {
            let table = object_table(
                "applications",
                selected_firewall(session)?.acl().all_applications(),
            );
            emit_table(session, &table, &args)?;
            Ok(Flow::Continue)
        }
        "usr" => {
            let table = object_table("users", selected_firewall(session)?.acl().all_users());
            emit_table(session, &table, &args)?;
            Ok(Flow::Continue)
        }
        other => Err(format!("unknown fw show command '{other}'")),
    }
}

fn object_table<T: Atom>(header: &str, items: Vec<Arc<T>>) -> Table {
    let mut table = Table::new(vec![header, "value"]);
    for item in items {
        let row = table.add_row();
        row.cell(0).append(item.name());
        row.cell(1).append(item.value_text());
    }
    table
}

/// Applies the `-z` filter to an ACL view.
fn zone_filtered<'f>(
    session: &Session,
    acl: RuleList<'f>,
    args: &CommandArgs,
) -> Result<RuleList<'f>, String> {
    let Some((src, dst)) = &args.zones else {
        return Ok(acl);
    };
    let src_zone = session
        .network
        .src_zone(src)
        .ok_or_else(|| format!("unknown zone '{src}'"))?;
    let dst_zone = session
        .network
        .dst_zone(dst)
        .ok_or_else(|| format!("unknown zone '{dst}'"))?;
    Ok(acl.filter_zones(&src_zone, &dst_zone, &session.domains))
}

fn show_rules(session: &mut Session, args: &CommandArgs) -> CmdResult {
    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = zone_filtered(session, firewall.acl(), args)?;
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn show_rule(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw show rule <id>")?;
    let id: u32 = args
        .word(0)
        .expect("checked")
        .parse()
        .map_err(|_| "rule id must be a positive integer".to_string())?;

    let firewall = selected_firewall(session)?;
    let rule = firewall
        .get_rule(id)
        .ok_or_else(|| format!("rule {id} not found"))?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    emit_table(session, &rule.create_table(&options), args)?;
    Ok(Flow::Continue)
}

// ── fw check ───────────────────────────────────────────────────────────

fn check(session: &mut Session, tokens: &[&str]) -> CmdResult {
    let (what, rest) = tokens
        .split_first()
        .ok_or("usage: fw check anomaly|symmetry|deny|any|equivalence|addr|svc|app|packet ...")?;
    let args = CommandArgs::parse(rest)?;

    match *what {
        "anomaly" => check_anomaly(session, &args),
        "symmetry" => check_symmetry(session, &args),
        "deny" => check_deny(session, &args),
        "any" => check_any(session, &args),
        "equivalence" => check_equivalence(session, &args),
        "addr" => check_addr(session, &args),
        "svc" => check_svc(session, &args),
        "app" => check_app(session, &args),
        "packet" => check_packet(session, &args),
        other => Err(format!("unknown fw check command '{other}'")),
    }
}

fn check_anomaly(session: &mut Session, args: &CommandArgs) -> CmdResult {
    let firewall = selected_firewall(session)?;
    let acl = zone_filtered(session, firewall.acl(), args)?;
    let show_names = acl.have_names();

    let ticker = ConsoleTicker;
    let progress: Option<&dyn fwaudit_model::ProgressSink> =
        (acl.len() > 20).then_some(&ticker as &dyn fwaudit_model::ProgressSink);

    let analyzer = Analyzer::new(acl);
    let anomalies = analyzer
        .check_anomaly(&session.domains, &|| interrupt::observed(), progress)
        .map_err(|err| err.to_string())?;
    if progress.is_some() {
        println!();
    }

    emit_table(session, &anomalies.create_table(show_names), args)?;
    if anomalies.missing_deny_all {
        println!("warning: the policy does not end with a deny-all rule");
    }
    Ok(Flow::Continue)
}

fn check_symmetry(session: &mut Session, args: &CommandArgs) -> CmdResult {
    let firewall = selected_firewall(session)?;
    let acl = zone_filtered(session, firewall.acl(), args)?;

    let pairs = Analyzer::new(acl)
        .check_symmetry(args.strict, &session.domains, &|| interrupt::observed())
        .map_err(|err| err.to_string())?;

    let mut table = Table::new(vec!["rule", "symmetric rule"]);
    for (first, second) in pairs {
        let row = table.add_row();
        row.cell(0).append(first.id().to_string());
        row.cell(1).append(second.id().to_string());
    }
    emit_table(session, &table, args)?;
    Ok(Flow::Continue)
}

fn check_deny(session: &mut Session, args: &CommandArgs) -> CmdResult {
    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = Analyzer::new(firewall.acl()).check_deny(&session.domains);
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn check_any(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw check any <dst-address>...")?;
    let tokens: Vec<String> = args.words.clone();

    let mut unresolved = Vec::new();
    let mut resolver = TokenResolver {
        network: &mut session.network,
        fqdn: &mut session.fqdn,
    };
    let destinations = resolver.resolve_addresses(Side::Dst, &tokens, &mut unresolved);
    if let Some(token) = unresolved.first() {
        return Err(format!("unknown address '{token}'"));
    }

    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = Analyzer::new(firewall.acl()).check_any(&destinations, &session.domains);
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn check_equivalence(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw check equivalence <other-firewall>")?;
    let other_name = args.word(0).expect("checked");

    let firewall = selected_firewall(session)?;
    let other = session
        .network
        .firewall(other_name)
        .ok_or_else(|| format!("firewall '{other_name}' not found"))?;

    let relation =
        PolicyComparator::compare(&firewall.acl(), &other.acl(), &session.domains);
    println!(
        "allowed traffic: {}, denied traffic: {}",
        relation.allowed, relation.denied
    );
    Ok(Flow::Continue)
}

fn check_addr(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw check addr <address> [-any]")?;
    let token = args.word(0).expect("checked").to_string();

    let mut unresolved = Vec::new();
    let mut resolver = TokenResolver {
        network: &mut session.network,
        fqdn: &mut session.fqdn,
    };
    let src_probe = resolver.resolve_addresses(Side::Src, &[token.clone()], &mut unresolved);
    let dst_probe = resolver.resolve_addresses(Side::Dst, &[token.clone()], &mut unresolved);
    if !unresolved.is_empty() {
        return Err(format!("unknown address '{token}'"));
    }

    let dom = &session.domains;
    let src_bdd = src_probe.make_bdd(dom);
    let dst_bdd = dst_probe.make_bdd(dom);
    let include_any = args.include_any;

    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = firewall.acl().filter(|rule| {
        let predicate = rule.predicate();
        let src_hit = src_bdd.is_subset(&predicate.src_address_bdd(dom))
            && (include_any || !predicate.src_addresses().has_any());
        let dst_hit = dst_bdd.is_subset(&predicate.dst_address_bdd(dom))
            && (include_any || !predicate.dst_addresses().has_any());
        src_hit || dst_hit
    });
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn check_svc(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw check svc <service> [-any]")?;
    let token = args.word(0).expect("checked").to_string();

    let mut unresolved = Vec::new();
    let mut resolver = TokenResolver {
        network: &mut session.network,
        fqdn: &mut session.fqdn,
    };
    let probe = resolver.resolve_services(&[token.clone()], &mut unresolved);
    if !unresolved.is_empty() {
        return Err(format!("unknown service '{token}'"));
    }

    let dom = &session.domains;
    let probe_bdd = probe.make_bdd(dom);
    let include_any = args.include_any;

    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = firewall.acl().filter(|rule| {
        let services = rule.predicate().services();
        probe_bdd.is_subset(&services.make_bdd(dom)) && (include_any || !services.has_any())
    });
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn check_app(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(1, "fw check app <application> [-any]")?;
    let token = args.word(0).expect("checked").to_string();

    let mut unresolved = Vec::new();
    let mut resolver = TokenResolver {
        network: &mut session.network,
        fqdn: &mut session.fqdn,
    };
    let mut probe = resolver.resolve_applications(&[token.clone()], false, &mut unresolved);
    if !unresolved.is_empty() {
        unresolved.clear();
        probe = resolver.resolve_applications(&[token.clone()], true, &mut unresolved);
    }
    if !unresolved.is_empty() {
        return Err(format!("unknown application '{token}'"));
    }

    let dom = &session.domains;
    let probe_bdd = probe.make_bdd(dom);
    let include_any = args.include_any;

    let firewall = selected_firewall(session)?;
    let options =
        firewall.make_output_options(args.with_names, session.network.model_options());
    let rules = firewall.acl().filter(|rule| {
        let applications = rule.predicate().applications();
        probe_bdd.is_subset(&applications.make_bdd(dom))
            && (include_any || !applications.has_any())
    });
    emit_table(session, &rules.create_table(&options), args)?;
    Ok(Flow::Continue)
}

fn check_packet(session: &mut Session, args: &CommandArgs) -> CmdResult {
    args.expect_words(
        5,
        "fw check packet <src-zone> <src-addr> <dst-zone> <dst-addr> <svc> [app] [usr]",
    )?;

    let src_zone_token = args.word(0).expect("checked").to_string();
    let src_addr_token = args.word(1).expect("checked").to_string();
    let dst_zone_token = args.word(2).expect("checked").to_string();
    let dst_addr_token = args.word(3).expect("checked").to_string();
    let svc_token = args.word(4).expect("checked").to_string();
    let app_token = args.word(5).map(str::to_string);
    let usr_token = args.word(6).map(str::to_string);

    let mut unresolved = Vec::new();
    let mut resolver = TokenResolver {
        network: &mut session.network,
        fqdn: &mut session.fqdn,
    };

    let src_zone = (!src_zone_token.eq_ignore_ascii_case("any"))
        .then(|| resolver.network.src_zone(&src_zone_token))
        .flatten();
    if src_zone.is_none() && !src_zone_token.eq_ignore_ascii_case("any") {
        return Err(format!("unknown zone '{src_zone_token}'"));
    }
    let dst_zone = (!dst_zone_token.eq_ignore_ascii_case("any"))
        .then(|| resolver.network.dst_zone(&dst_zone_token))
        .flatten();
    if dst_zone.is_none() && !dst_zone_token.eq_ignore_ascii_case("any") {
        return Err(format!("unknown zone '{dst_zone_token}'"));
    }

    let src_addresses = resolver
        .resolve_addresses(Side::Src, &[src_addr_token.clone()], &mut unresolved)
        .items();
    let dst_addresses = resolver
        .resolve_addresses(Side::Dst, &[dst_addr_token.clone()], &mut unresolved)
        .items();
    let services = resolver
        .resolve_services(&[svc_token.clone()], &mut unresolved)
        .items();

    let applications = match &app_token {
        None => None,
        Some(token) => {
            let group = resolver.resolve_applications(
                &[token.clone()],
                false,
                &mut unresolved,
            );
            Some(group.items())
        }
    };
    let users = match &usr_token {
        None => None,
        Some(token) => Some(
            resolver
                .resolve_users(&[token.clone()])
                .map_err(|err| err.to_string())?
                .items(),
        ),
    };

    if let Some(token) = unresolved.first() {
        return Err(format!("unresolved token '{token}'"));
    }

    let packet = TestPacket {
        src_zone,
        src_addresses,
        dst_zone,
        dst_addresses,
        services,
        applications,
        users,
    };

    let firewall = selected_firewall(session)?;
    let tester = PacketTester::new(firewall.acl());
    let (accepted, matched) = tester.is_packet_allowed(&packet, &session.domains);

    match matched {
        Some(rule) => println!(
            "packet is {} by rule {}",
            if accepted { "accepted" } else { "denied" },
            rule.id()
        ),
        None => println!("packet is denied (no matching rule)"),
    }
    Ok(Flow::Continue)
}
