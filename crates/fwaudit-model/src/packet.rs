//! Concrete packet tracing against an ACL.

use std::sync::Arc;

use crate::address::Address;
use crate::application::Application;
use crate::domain::{Domains, Side};
use crate::engine::BddExt;
use crate::group::Group;
use crate::options::{BddScope, OptionsCell};
use crate::predicate::{Destinations, Predicate, Sources};
use crate::rule::{Rule, RuleAction};
use crate::rulelist::RuleList;
use crate::service::Service;
use crate::url::Url;
use crate::user::User;
use crate::zone::Zone;

/// The fields of one test packet. Leaving a field out means "anything":
/// the corresponding predicate factor is not compiled at all, so a probe
/// without zones also matches rules the probe says nothing about.
#[derive(Default)]
pub struct TestPacket {
    pub src_zone: Option<Arc<Zone>>,
    pub src_addresses: Vec<Arc<Address>>,
    pub dst_zone: Option<Arc<Zone>>,
    pub dst_addresses: Vec<Arc<Address>>,
    pub services: Vec<Arc<Service>>,
    pub applications: Option<Vec<Arc<Application>>>,
    pub users: Option<Vec<Arc<User>>>,
}

pub struct PacketTester<'a> {
    acl: RuleList<'a>,
}

impl<'a> PacketTester<'a> {
    pub fn new(acl: RuleList<'a>) -> Self {
        PacketTester { acl }
    }

    /// Walks the ACL in order; the first rule whose condition covers the
    /// whole probe decides the verdict. No match is the implicit deny.
    pub fn is_packet_allowed(
        &self,
        packet: &TestPacket,
        dom: &Domains,
    ) -> (bool, Option<&'a Rule>) {
        let scope = BddScope {
            source_zone: packet.src_zone.is_some(),
            destination_zone: packet.dst_zone.is_some(),
            application: packet.applications.is_some(),
            user: packet.users.is_some(),
            url: false,
        };

        let mut src_zones = Group::new("");
        src_zones.add_item(
            packet
                .src_zone
                .clone()
                .unwrap_or_else(|| Arc::new(Zone::any(Side::Src))),
        );
        let mut src_addresses = Group::new("");
        for address in &packet.src_addresses {
            src_addresses.add_item(Arc::clone(address));
        }

        let mut dst_zones = Group::new("");
        dst_zones.add_item(
            packet
                .dst_zone
                .clone()
                .unwrap_or_else(|| Arc::new(Zone::any(Side::Dst))),
        );
        let mut dst_addresses = Group::new("");
        for address in &packet.dst_addresses {
            dst_addresses.add_item(Arc::clone(address));
        }

        let mut services = Group::new("");
        for service in &packet.services {
            services.add_item(Arc::clone(service));
        }

        let mut applications = Group::new("");
        match &packet.applications {
            Some(items) => {
                for application in items {
                    applications.add_item(Arc::clone(application));
                }
            }
            None => applications.add_item(Arc::new(Application::any())),
        }

        let mut users = Group::new("");
        match &packet.users {
            Some(items) => {
                for user in items {
                    users.add_item(Arc::clone(user));
                }
            }
            None => users.add_item(Arc::new(User::any())),
        }

        let probe = Predicate::new(
            Sources {
                zones: src_zones,
                addresses: src_addresses,
                negate: false,
            },
            Destinations {
                zones: dst_zones,
                addresses: dst_addresses,
                negate: false,
            },
            services,
            false,
            applications,
            users,
            Group::with_item("", Arc::new(Url::any())),
            OptionsCell::empty(),
        );

        let probe_bdd = probe.make_bdd_scoped(dom, scope);

        for rule in self.acl.iter() {
            let rule_bdd = rule.predicate().make_bdd_scoped(dom, scope);
            if probe_bdd.is_subset(&rule_bdd) {
                return (rule.action() == RuleAction::Allow, Some(rule));
            }
        }

        (false, None)
    }
}
