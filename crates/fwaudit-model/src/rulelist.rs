//! Ordered, non-owning views over rules.
//!
//! Every combinator is pure: it walks the receiver in order and returns a
//! new list of references, so filters compose and never disturb the
//! firewall's ordering. The borrow ties each list to the owning firewall.

use std::collections::HashSet;
use std::sync::Arc;

use crate::address::Address;
use crate::application::Application;
use crate::atom::{compare_names, Atom};
use crate::domain::Domains;
use crate::engine::BddExt;
use crate::group::Group;
use crate::rule::{OutputOptions, Rule, RuleAction, RuleStatus};
use crate::service::Service;
use crate::table::Table;
use crate::url::Url;
use crate::user::User;
use crate::zone::Zone;

/// Counts of allow and deny rules in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub allowed: usize,
    pub denied: usize,
}

impl std::fmt::Display for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.allowed, self.denied)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleList<'a> {
    rules: Vec<&'a Rule>,
}

impl<'a> RuleList<'a> {
    pub fn new() -> Self {
        RuleList { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: &'a Rule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Rule> + '_ {
        self.rules.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Rule> {
        self.rules.get(index).copied()
    }

    pub fn last(&self) -> Option<&'a Rule> {
        self.rules.last().copied()
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules.iter().any(|r| std::ptr::eq(*r, rule))
    }

    /// True if the given rule is the last of this list.
    pub fn is_last(&self, rule: &Rule) -> bool {
        self.last().is_some_and(|r| std::ptr::eq(r, rule))
    }

    pub fn filter(&self, keep: impl Fn(&Rule) -> bool) -> RuleList<'a> {
        RuleList {
            rules: self.rules.iter().copied().filter(|r| keep(r)).collect(),
        }
    }

    pub fn filter_action(&self, action: RuleAction) -> RuleList<'a> {
        self.filter(|rule| rule.action() == action)
    }

    pub fn filter_status(&self, status: RuleStatus) -> RuleList<'a> {
        self.filter(|rule| rule.status() == status)
    }

    /// Rules whose zone pair covers the given source and destination zone.
    pub fn filter_zones(&self, src: &Zone, dst: &Zone, dom: &Domains) -> RuleList<'a> {
        let src_bdd = src.make_bdd(dom);
        let dst_bdd = dst.make_bdd(dom);
        self.filter(|rule| {
            src_bdd.is_subset(&rule.predicate().src_zones().make_bdd(dom))
                && dst_bdd.is_subset(&rule.predicate().dst_zones().make_bdd(dom))
        })
    }

    pub fn filter_src_address(&self, address: &Arc<Address>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().src_addresses().contains(address))
    }

    pub fn filter_dst_address(&self, address: &Arc<Address>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().dst_addresses().contains(address))
    }

    pub fn filter_service(&self, service: &Arc<Service>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().services().contains(service))
    }

    pub fn filter_application(&self, application: &Arc<Application>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().applications().contains(application))
    }

    pub fn filter_user(&self, user: &Arc<User>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().users().contains(user))
    }

    pub fn filter_url(&self, url: &Arc<Url>) -> RuleList<'a> {
        self.filter(|rule| rule.predicate().urls().contains(url))
    }

    /// Rules that allow every service in `services`.
    pub fn filter_services(&self, services: &Group<Service>, dom: &Domains) -> RuleList<'a> {
        let probe = services.make_bdd(dom);
        self.filter(|rule| probe.is_subset(&rule.predicate().services().make_bdd(dom)))
    }

    /// Rules that allow all given applications, and all given services when
    /// the service group is not empty.
    ///
    /// An application-default rule has no service set of its own, so each
    /// probed application is re-paired with the probed services and that
    /// pair must be inside the rule's application condition.
    pub fn filter_applications(
        &self,
        applications: &Group<Application>,
        services: &Group<Service>,
        dom: &Domains,
    ) -> RuleList<'a> {
        if services.is_empty() {
            let probe = applications.make_bdd(dom);
            return self.filter(|rule| {
                probe.is_subset(&rule.predicate().applications().make_bdd(dom))
            });
        }

        let app_probe = applications.make_bdd(dom);
        let svc_probe = services.make_bdd(dom);
        self.filter(|rule| {
            let predicate = rule.predicate();
            if rule.is_default_app_svc() {
                let rule_apps = predicate.applications().make_bdd(dom);
                applications.items().iter().all(|application| {
                    let paired = application.with_services(services.clone());
                    paired.make_bdd(dom).is_subset(&rule_apps)
                })
            } else {
                app_probe.is_subset(&predicate.applications().make_bdd(dom))
                    && svc_probe.is_subset(&predicate.services().make_bdd(dom))
            }
        })
    }

    /// Rules before the sentinel (exclusive) satisfying the filter.
    pub fn filter_before(
        &self,
        sentinel: &Rule,
        keep: impl Fn(&Rule) -> bool,
    ) -> RuleList<'a> {
        let mut rules = Vec::new();
        for rule in &self.rules {
            if std::ptr::eq(*rule, sentinel) {
                break;
            }
            if keep(rule) {
                rules.push(*rule);
            }
        }
        RuleList { rules }
    }

    pub fn id_list(&self) -> Vec<u32> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn have_names(&self) -> bool {
        self.rules.iter().any(|rule| !rule.name().is_empty())
    }

    pub fn have_negate(&self) -> bool {
        self.rules.iter().any(|rule| {
            rule.predicate().negate_src_addresses() || rule.predicate().negate_dst_addresses()
        })
    }

    pub fn counters(&self) -> Counters {
        let allowed = self
            .rules
            .iter()
            .filter(|rule| rule.action() == RuleAction::Allow)
            .count();
        Counters {
            allowed,
            denied: self.rules.len() - allowed,
        }
    }

    pub fn src_zone_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        for rule in &self.rules {
            for zone in rule.predicate().src_zones().items() {
                if seen.insert(zone.name().to_ascii_lowercase()) {
                    names.push(zone.name().to_string());
                }
            }
        }
        names
    }

    pub fn dst_zone_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        for rule in &self.rules {
            for zone in rule.predicate().dst_zones().items() {
                if seen.insert(zone.name().to_ascii_lowercase()) {
                    names.push(zone.name().to_string());
                }
            }
        }
        names
    }

    pub fn zone_names(&self) -> Vec<String> {
        let mut names = self.src_zone_names();
        let mut seen: HashSet<String> =
            names.iter().map(|n| n.to_ascii_lowercase()).collect();
        for name in self.dst_zone_names() {
            if seen.insert(name.to_ascii_lowercase()) {
                names.push(name);
            }
        }
        names
    }

    fn collect_sorted<T: Atom>(
        &self,
        mut pick: impl FnMut(&Rule, &mut dyn FnMut(&Arc<T>)),
    ) -> Vec<Arc<T>> {
        let mut seen = HashSet::new();
        let mut items: Vec<Arc<T>> = Vec::new();
        for rule in &self.rules {
            pick(rule, &mut |item| {
                if seen.insert(Arc::as_ptr(item) as usize) {
                    items.push(Arc::clone(item));
                }
            });
        }
        items.sort_by(|a, b| compare_names(a.name(), b.name()));
        items
    }

    pub fn all_src_zones(&self) -> Vec<Arc<Zone>> {
        self.collect_sorted(|rule, sink| rule.predicate().src_zones().for_each(sink))
    }

    pub fn all_dst_zones(&self) -> Vec<Arc<Zone>> {
        self.collect_sorted(|rule, sink| rule.predicate().dst_zones().for_each(sink))
    }

    pub fn all_addresses(&self) -> Vec<Arc<Address>> {
        self.collect_sorted(|rule, sink| {
            rule.predicate().src_addresses().for_each(sink);
            rule.predicate().dst_addresses().for_each(sink);
        })
    }

    pub fn all_services(&self) -> Vec<Arc<Service>> {
        self.collect_sorted(|rule, sink| rule.predicate().services().for_each(sink))
    }

    pub fn all_applications(&self) -> Vec<Arc<Application>> {
        self.collect_sorted(|rule, sink| rule.predicate().applications().for_each(sink))
    }

    pub fn all_users(&self) -> Vec<Arc<User>> {
        self.collect_sorted(|rule, sink| rule.predicate().users().for_each(sink))
    }

    pub fn all_urls(&self) -> Vec<Arc<Url>> {
        self.collect_sorted(|rule, sink| rule.predicate().urls().for_each(sink))
    }

    /// Tabulates the list, one row per rule, columns per the option set.
    pub fn create_table(&self, options: &OutputOptions) -> Table {
        let mut headers: Vec<String> = Vec::new();
        headers.push("id".into());
        if options.rule_name {
            headers.push("name".into());
        }
        headers.push("action".into());
        headers.push("src.zone".into());
        headers.push("dst.zone".into());
        if options.negate_address {
            headers.push("src.negate".into());
        }
        if options.address_name {
            headers.push("src.addr".into());
        }
        headers.push("src.ip".into());
        if options.negate_address {
            headers.push("dst.negate".into());
        }
        if options.address_name {
            headers.push("dst.addr".into());
        }
        headers.push("dst.ip".into());
        if options.service_name {
            headers.push("svc name".into());
        }
        headers.push("svc".into());
        if options.application_name {
            headers.push("app".into());
        }
        if options.user_name {
            headers.push("usr".into());
        }
        if options.url {
            headers.push("url".into());
        }

        let mut table = Table::new(headers);
        for rule in &self.rules {
            rule.write_to_row(table.add_row(), options);
        }
        table
    }
}

impl<'a> FromIterator<&'a Rule> for RuleList<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Rule>>(iter: I) -> Self {
        RuleList {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &RuleList<'a> {
    type Item = &'a Rule;
    type IntoIter = std::vec::IntoIter<&'a Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.clone().into_iter()
    }
}
