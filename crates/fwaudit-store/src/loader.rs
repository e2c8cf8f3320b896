//! CSV policy loader.
//!
//! One row per rule. Compound fields (zones, addresses, services,
//! applications, users, urls) hold several values separated by the
//! configured list delimiter. A bad row never aborts the load: it is
//! recorded in the returned status and the loader moves on.
//!
//! Expected columns: `id`, `name`, `status`, `action`, `src.zone`,
//! `dst.zone`, `src.addr`, `src.negate`, `dst.addr`, `dst.negate`,
//! `svc`, `app`, `usr`, `url`. Only `id`, `action`, `src.addr`,
//! `dst.addr` and `svc` must be non-empty; every other field falls back
//! to "any" (or no negation).

use std::io::Read;
use std::sync::Arc;

use fwaudit_model::{
    Application, Destinations, Group, ModelError, Predicate, Rule, RuleAction, RuleStatus, Side,
    Sources, Url, User,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::error::{StoreError, StoreResult};
use crate::fqdn::FqdnResolver;
use crate::network::Network;
use crate::resolver::TokenResolver;

/// Service sentinel selecting the applications' default services.
pub const APPLICATION_DEFAULT: &str = "application-default";

/// A token the object store could not resolve.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedToken {
    pub row: u64,
    pub field: &'static str,
    pub token: String,
}

/// A mandatory field left empty.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyField {
    pub row: u64,
    pub field: &'static str,
}

/// What a load did and what it had to skip.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoaderStatus {
    pub loaded: usize,
    pub rejected: usize,
    pub unresolved: Vec<UnresolvedToken>,
    pub empty_fields: Vec<EmptyField>,
    pub duplicate_ids: Vec<u32>,
}

impl LoaderStatus {
    pub fn is_clean(&self) -> bool {
        self.rejected == 0
            && self.unresolved.is_empty()
            && self.empty_fields.is_empty()
            && self.duplicate_ids.is_empty()
    }
}

/// Loads a policy CSV stream into the named firewall.
pub fn load_policy<R: Read>(
    reader: R,
    network: &mut Network,
    fqdn: &mut FqdnResolver,
    firewall_name: &str,
    config: &LoaderConfig,
    interrupt: &dyn Fn() -> bool,
) -> StoreResult<LoaderStatus> {
    if network.firewall(firewall_name).is_none() {
        return Err(StoreError::Model(ModelError::FirewallNotFound {
            name: firewall_name.to_string(),
        }));
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let columns = Columns {
        id: column("id"),
        name: column("name"),
        status: column("status"),
        action: column("action"),
        src_zone: column("src.zone"),
        dst_zone: column("dst.zone"),
        src_addr: column("src.addr"),
        src_negate: column("src.negate"),
        dst_addr: column("dst.addr"),
        dst_negate: column("dst.negate"),
        svc: column("svc"),
        app: column("app"),
        usr: column("usr"),
        url: column("url"),
    };

    let mut status = LoaderStatus::default();
    let mut rules: Vec<Rule> = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        if interrupt() {
            return Err(StoreError::Model(ModelError::Interrupted));
        }
        let row = index as u64 + 2; // header is row 1
        let record = record?;

        match build_rule(network, fqdn, &columns, &record, row, config, &mut status) {
            Some(rule) => rules.push(rule),
            None => status.rejected += 1,
        }
    }

    let firewall = network
        .firewall_mut(firewall_name)
        .expect("checked before the read loop");
    for rule in rules {
        let id = rule.id();
        match firewall.add_rule(rule) {
            Ok(()) => status.loaded += 1,
            Err(ModelError::DuplicateRuleId { .. }) => {
                status.duplicate_ids.push(id);
                status.rejected += 1;
            }
            Err(err) => return Err(StoreError::Model(err)),
        }
    }

    if config.implicit_deny_all {
        let id = firewall.max_rule_id() + 1;
        firewall
            .add_rule(Rule::new(
                id,
                "",
                RuleStatus::Enabled,
                RuleAction::Deny,
                Predicate::any(),
            ))
            .map_err(StoreError::Model)?;
        debug!(rule = id, "implicit deny-all appended");
    }

    info!(
        firewall = firewall_name,
        loaded = status.loaded,
        rejected = status.rejected,
        "policy loaded"
    );
    Ok(status)
}

struct Columns {
    id: Option<usize>,
    name: Option<usize>,
    status: Option<usize>,
    action: Option<usize>,
    src_zone: Option<usize>,
    dst_zone: Option<usize>,
    src_addr: Option<usize>,
    src_negate: Option<usize>,
    dst_addr: Option<usize>,
    dst_negate: Option<usize>,
    svc: Option<usize>,
    app: Option<usize>,
    usr: Option<usize>,
    url: Option<usize>,
}

fn field<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn split_list(text: &str, delimiter: char) -> Vec<String> {
    text.split(delimiter)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn parse_bool(text: &str) -> bool {
    text.eq_ignore_ascii_case("yes")
        || text.eq_ignore_ascii_case("true")
        || text == "1"
}

#[allow(clippy::too_many_arguments)]
fn build_rule(
    network: &mut Network,
    fqdn: &mut FqdnResolver,
    columns: &Columns,
    record: &csv::StringRecord,
    row: u64,
    config: &LoaderConfig,
    status: &mut LoaderStatus,
) -> Option<Rule> {
    let delimiter = config.list_delimiter;

    // Mandatory scalar fields first.
    let id_text = field(record, columns.id);
    let Ok(id) = id_text.parse::<u32>() else {
        status.empty_fields.push(EmptyField { row, field: "id" });
        return None;
    };
    if id == 0 {
        status.empty_fields.push(EmptyField { row, field: "id" });
        return None;
    }

    let action_text = field(record, columns.action);
    let action = if action_text.eq_ignore_ascii_case("allow")
        || action_text.eq_ignore_ascii_case("accept")
    {
        RuleAction::Allow
    } else if action_text.eq_ignore_ascii_case("deny") || action_text.eq_ignore_ascii_case("drop")
    {
        RuleAction::Deny
    } else {
        status.empty_fields.push(EmptyField { row, field: "action" });
        return None;
    };

    let status_text = field(record, columns.status);
    let rule_status = if status_text.is_empty() || status_text.eq_ignore_ascii_case("enabled") {
        RuleStatus::Enabled
    } else {
        RuleStatus::Disabled
    };

    let src_addr_tokens = split_list(field(record, columns.src_addr), delimiter);
    if src_addr_tokens.is_empty() {
        status.empty_fields.push(EmptyField { row, field: "src.addr" });
        return None;
    }
    let dst_addr_tokens = split_list(field(record, columns.dst_addr), delimiter);
    if dst_addr_tokens.is_empty() {
        status.empty_fields.push(EmptyField { row, field: "dst.addr" });
        return None;
    }
    let svc_tokens = split_list(field(record, columns.svc), delimiter);
    if svc_tokens.is_empty() {
        status.empty_fields.push(EmptyField { row, field: "svc" });
        return None;
    }

    let unresolved_before = status.unresolved.len();
    let mut resolver = TokenResolver {
        network: &mut *network,
        fqdn: &mut *fqdn,
    };

    let src_zone_tokens = or_any(split_list(field(record, columns.src_zone), delimiter));
    let dst_zone_tokens = or_any(split_list(field(record, columns.dst_zone), delimiter));
    let src_zones = match resolver.resolve_src_zones(&src_zone_tokens) {
        Ok(zones) => zones,
        Err(_) => {
            push_unresolved(status, row, "src.zone", &src_zone_tokens);
            return None;
        }
    };
    let dst_zones = match resolver.resolve_dst_zones(&dst_zone_tokens) {
        Ok(zones) => zones,
        Err(_) => {
            push_unresolved(status, row, "dst.zone", &dst_zone_tokens);
            return None;
        }
    };

    let mut misses = Vec::new();
    let src_addresses = resolver.resolve_addresses(Side::Src, &src_addr_tokens, &mut misses);
    record_misses(status, row, "src.addr", &mut misses);
    let dst_addresses = resolver.resolve_addresses(Side::Dst, &dst_addr_tokens, &mut misses);
    record_misses(status, row, "dst.addr", &mut misses);

    // application-default replaces the service list entirely.
    let app_default = svc_tokens.len() == 1 && svc_tokens[0].eq_ignore_ascii_case(APPLICATION_DEFAULT);

    let app_tokens = split_list(field(record, columns.app), delimiter);
    let applications = if app_tokens.is_empty() {
        Group::with_item("", Arc::new(Application::any()))
    } else {
        resolver.resolve_applications(&app_tokens, app_default, &mut misses)
    };
    record_misses(status, row, "app", &mut misses);

    let services = if app_default {
        applications.default_services()
    } else {
        resolver.resolve_services(&svc_tokens, &mut misses)
    };
    record_misses(status, row, "svc", &mut misses);

    let usr_tokens = split_list(field(record, columns.usr), delimiter);
    let users = if usr_tokens.is_empty() {
        Ok(Group::with_item("", Arc::new(User::any())))
    } else {
        resolver.resolve_users(&usr_tokens)
    };
    let Ok(users) = users else {
        push_unresolved(status, row, "usr", &usr_tokens);
        return None;
    };

    let url_tokens = split_list(field(record, columns.url), delimiter);
    let urls = if url_tokens.is_empty() {
        Group::with_item("", Arc::new(Url::any()))
    } else {
        match resolver.resolve_urls(&url_tokens, &mut misses) {
            Ok(urls) => urls,
            Err(_) => {
                push_unresolved(status, row, "url", &url_tokens);
                return None;
            }
        }
    };
    record_misses(status, row, "url", &mut misses);

    if status.unresolved.len() > unresolved_before {
        return None;
    }

    let predicate = Predicate::new(
        Sources {
            zones: src_zones,
            addresses: src_addresses,
            negate: parse_bool(field(record, columns.src_negate)),
        },
        Destinations {
            zones: dst_zones,
            addresses: dst_addresses,
            negate: parse_bool(field(record, columns.dst_negate)),
        },
        services,
        app_default,
        applications,
        users,
        urls,
        Arc::clone(network.options()),
    );

    Some(Rule::new(
        id,
        field(record, columns.name),
        rule_status,
        action,
        predicate,
    ))
}

fn or_any(tokens: Vec<String>) -> Vec<String> {
    if tokens.is_empty() {
        vec!["any".to_string()]
    } else {
        tokens
    }
}

fn push_unresolved(status: &mut LoaderStatus, row: u64, field: &'static str, tokens: &[String]) {
    for token in tokens {
        status.unresolved.push(UnresolvedToken {
            row,
            field,
            token: token.clone(),
        });
    }
}

fn record_misses(
    status: &mut LoaderStatus,
    row: u64,
    field: &'static str,
    misses: &mut Vec<String>,
) {
    for token in misses.drain(..) {
        status.unresolved.push(UnresolvedToken { row, field, token });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwaudit_model::{Analyzer, Domains, Firewall, IpModel, ModelOptions};

    fn load(csv_text: &str, config: &LoaderConfig) -> (Network, LoaderStatus) {
        let mut network = Network::new(IpModel::Dual, ModelOptions::none());
        network.add_firewall(Firewall::new("edge")).unwrap();
        let mut fqdn = FqdnResolver::disabled();
        let status = load_policy(
            csv_text.as_bytes(),
            &mut network,
            &mut fqdn,
            "edge",
            config,
            &|| false,
        )
        .unwrap();
        (network, status)
    }

    const HEADER: &str =
        "id,name,status,action,src.zone,dst.zone,src.addr,src.negate,dst.addr,dst.negate,svc,app,usr,url\n";

    #[test]
    fn loads_well_formed_rows() {
        let text = format!(
            "{HEADER}\
             1,web-in,enabled,allow,outside,dmz,any,,192.168.1.0/24,,tcp/80;tcp/443,,,\n\
             2,,enabled,deny,any,any,any,,any,,any,,,\n"
        );
        let (network, status) = load(&text, &LoaderConfig::default());
        assert!(status.is_clean(), "status: {status:?}");
        assert_eq!(status.loaded, 2);

        let firewall = network.firewall("edge").unwrap();
        assert_eq!(firewall.acl().id_list(), vec![1, 2]);
        let rule = firewall.get_rule(1).unwrap();
        assert_eq!(rule.action(), RuleAction::Allow);
        assert_eq!(rule.predicate().services().items().len(), 2);

        let dom = Domains::new();
        assert!(firewall.get_rule(2).unwrap().is_deny_all(&dom));
    }

    #[test]
    fn rejects_rows_with_bad_ids_or_unknown_tokens() {
        let text = format!(
            "{HEADER}\
             0,,enabled,allow,any,any,any,,any,,any,,,\n\
             7,,enabled,allow,any,any,no-such-object,,any,,any,,,\n\
             8,,enabled,allow,any,any,any,,any,,any,,,\n"
        );
        let (network, status) = load(&text, &LoaderConfig::default());
        assert_eq!(status.loaded, 1);
        assert_eq!(status.rejected, 2);
        assert_eq!(status.empty_fields.len(), 1);
        assert_eq!(status.unresolved.len(), 1);
        assert_eq!(status.unresolved[0].token, "no-such-object");
        assert_eq!(network.firewall("edge").unwrap().acl().id_list(), vec![8]);
    }

    #[test]
    fn duplicate_ids_reject_the_later_row() {
        let text = format!(
            "{HEADER}\
             5,,enabled,allow,any,any,10.0.0.1,,any,,any,,,\n\
             5,,enabled,deny,any,any,10.0.0.2,,any,,any,,,\n"
        );
        let (network, status) = load(&text, &LoaderConfig::default());
        assert_eq!(status.loaded, 1);
        assert_eq!(status.duplicate_ids, vec![5]);
        assert_eq!(
            network.firewall("edge").unwrap().get_rule(5).unwrap().action(),
            RuleAction::Allow
        );
    }

    #[test]
    fn implicit_deny_all_closes_the_policy() {
        let text = format!("{HEADER}1,,enabled,allow,any,any,10.0.0.0/8,,any,,tcp/22,,,\n");
        let config = LoaderConfig {
            implicit_deny_all: true,
            ..LoaderConfig::default()
        };
        let (network, status) = load(&text, &config);
        assert_eq!(status.loaded, 1);

        let firewall = network.firewall("edge").unwrap();
        assert_eq!(firewall.acl().id_list(), vec![1, 2]);

        let dom = Domains::new();
        let anomalies = Analyzer::new(firewall.acl())
            .check_anomaly(&dom, &|| false, None)
            .unwrap();
        assert!(!anomalies.missing_deny_all);
    }

    #[test]
    fn application_default_couples_services_to_applications() {
        let mut network = Network::new(IpModel::Dual, ModelOptions::all());
        network.add_firewall(Firewall::new("edge")).unwrap();
        network
            .register_application("web-browsing", &["tcp/80".to_string()], true)
            .unwrap();

        let text = format!(
            "{HEADER}1,,enabled,allow,any,any,any,,any,,application-default,web-browsing,,\n"
        );
        let mut fqdn = FqdnResolver::disabled();
        let status = load_policy(
            text.as_bytes(),
            &mut network,
            &mut fqdn,
            "edge",
            &LoaderConfig::default(),
            &|| false,
        )
        .unwrap();
        assert!(status.is_clean(), "status: {status:?}");

        let firewall = network.firewall("edge").unwrap();
        let rule = firewall.get_rule(1).unwrap();
        assert!(rule.is_default_app_svc());

        // The admitted traffic is exactly the application's default port.
        let dom = Domains::new();
        let condition = rule.predicate().make_bdd(&dom);
        let http = fwaudit_model::Service::tcp("", 80, 80);
        let ssh = fwaudit_model::Service::tcp("", 22, 22);
        use fwaudit_model::{Atom, BddExt};
        assert!(!condition.is_disjoint(&http.make_bdd(&dom)));
        assert!(condition.is_disjoint(&ssh.make_bdd(&dom)));
    }

    #[test]
    fn missing_firewall_is_an_error() {
        let mut network = Network::new(IpModel::Dual, ModelOptions::none());
        let mut fqdn = FqdnResolver::disabled();
        let err = load_policy(
            HEADER.as_bytes(),
            &mut network,
            &mut fqdn,
            "nope",
            &LoaderConfig::default(),
            &|| false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Model(ModelError::FirewallNotFound { .. })
        ));
    }
}
