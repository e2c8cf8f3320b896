//! The condition a single rule imposes on a packet.

use std::sync::Arc;

use biodivine_lib_bdd::Bdd;

use crate::address::Address;
use crate::application::Application;
use crate::domain::{Domains, Side};
use crate::engine::BddExt;
use crate::group::Group;
use crate::options::{BddScope, OptionsCell, SharedOptions};
use crate::service::Service;
use crate::url::Url;
use crate::user::User;
use crate::zone::Zone;

/// The source half of a rule condition.
pub struct Sources {
    pub zones: Group<Zone>,
    pub addresses: Group<Address>,
    pub negate: bool,
}

/// The destination half of a rule condition.
pub struct Destinations {
    pub zones: Group<Zone>,
    pub addresses: Group<Address>,
    pub negate: bool,
}

/// Conjunction of the seven group conditions, with optional complement on
/// either address group.
///
/// When `app_default` is set the rule admits only the services its
/// applications intrinsically use: the service factor is dropped from the
/// full compilation (the application factor already carries the default
/// services) and the stored service group holds those defaults for
/// display and filtering.
#[derive(Debug, Clone)]
pub struct Predicate {
    src_zones: Group<Zone>,
    dst_zones: Group<Zone>,
    src_addresses: Group<Address>,
    negate_src: bool,
    dst_addresses: Group<Address>,
    negate_dst: bool,
    services: Group<Service>,
    app_default: bool,
    applications: Group<Application>,
    users: Group<User>,
    urls: Group<Url>,
    options: SharedOptions,
}

impl Predicate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sources: Sources,
        destinations: Destinations,
        services: Group<Service>,
        app_default: bool,
        applications: Group<Application>,
        users: Group<User>,
        urls: Group<Url>,
        options: SharedOptions,
    ) -> Self {
        Predicate {
            src_zones: sources.zones,
            dst_zones: destinations.zones,
            src_addresses: sources.addresses,
            negate_src: sources.negate,
            dst_addresses: destinations.addresses,
            negate_dst: destinations.negate,
            services,
            app_default,
            applications,
            users,
            urls,
            options,
        }
    }

    /// The predicate matching every packet.
    pub fn any() -> Self {
        Predicate {
            src_zones: Group::with_item("", Arc::new(Zone::any(Side::Src))),
            dst_zones: Group::with_item("", Arc::new(Zone::any(Side::Dst))),
            src_addresses: Group::with_item("", Arc::new(Address::any(Side::Src))),
            negate_src: false,
            dst_addresses: Group::with_item("", Arc::new(Address::any(Side::Dst))),
            negate_dst: false,
            services: Group::with_item("", Arc::new(Service::any())),
            app_default: false,
            applications: Group::with_item("", Arc::new(Application::any())),
            users: Group::with_item("", Arc::new(User::any())),
            urls: Group::with_item("", Arc::new(Url::any())),
            options: OptionsCell::empty(),
        }
    }

    pub fn src_zones(&self) -> &Group<Zone> {
        &self.src_zones
    }

    pub fn dst_zones(&self) -> &Group<Zone> {
        &self.dst_zones
    }

    pub fn src_addresses(&self) -> &Group<Address> {
        &self.src_addresses
    }

    pub fn negate_src_addresses(&self) -> bool {
        self.negate_src
    }

    pub fn dst_addresses(&self) -> &Group<Address> {
        &self.dst_addresses
    }

    pub fn negate_dst_addresses(&self) -> bool {
        self.negate_dst
    }

    pub fn services(&self) -> &Group<Service> {
        &self.services
    }

    /// True when the rule uses application-default services.
    pub fn is_app_default(&self) -> bool {
        self.app_default
    }

    pub fn applications(&self) -> &Group<Application> {
        &self.applications
    }

    pub fn users(&self) -> &Group<User> {
        &self.users
    }

    pub fn urls(&self) -> &Group<Url> {
        &self.urls
    }

    /// The source address condition with its complement applied.
    pub fn src_address_bdd(&self, dom: &Domains) -> Bdd {
        self.src_addresses.make_bdd(dom).negate_if(self.negate_src)
    }

    /// The destination address condition with its complement applied.
    pub fn dst_address_bdd(&self, dom: &Domains) -> Bdd {
        self.dst_addresses.make_bdd(dom).negate_if(self.negate_dst)
    }

    /// Compiles the full rule condition.
    pub fn make_bdd(&self, dom: &Domains) -> Bdd {
        let mut condition = self.src_zones.make_bdd(dom);
        condition = condition.and(&self.dst_zones.make_bdd(dom));
        condition = condition.and(&self.src_address_bdd(dom));
        condition = condition.and(&self.dst_address_bdd(dom));
        if !self.app_default {
            condition = condition.and(&self.services.make_bdd(dom));
        }
        condition = condition.and(&self.applications.make_bdd(dom));
        condition = condition.and(&self.users.make_bdd(dom));
        condition.and(&self.urls.make_bdd(dom))
    }

    /// Compiles only the factors selected by `scope`. Addresses are always
    /// included. When the application factor is omitted the raw services
    /// stand in (or the application-default services where applicable), so
    /// a scoped condition still constrains the transport.
    pub fn make_bdd_scoped(&self, dom: &Domains, scope: BddScope) -> Bdd {
        let mut condition = self.src_address_bdd(dom);
        condition = condition.and(&self.dst_address_bdd(dom));

        if scope.source_zone {
            condition = condition.and(&self.src_zones.make_bdd(dom));
        }
        if scope.destination_zone {
            condition = condition.and(&self.dst_zones.make_bdd(dom));
        }
        if scope.application {
            if !self.app_default {
                condition = condition.and(&self.services.make_bdd(dom));
            }
            condition = condition.and(&self.applications.make_bdd(dom));
        } else if self.app_default {
            condition = condition.and(&self.applications.default_services().make_bdd(dom));
        } else {
            condition = condition.and(&self.services.make_bdd(dom));
        }
        if scope.user {
            condition = condition.and(&self.users.make_bdd(dom));
        }
        if scope.url {
            condition = condition.and(&self.urls.make_bdd(dom));
        }

        condition
    }

    pub fn is_any(&self, dom: &Domains) -> bool {
        self.make_bdd(dom).is_true()
    }

    pub fn equal(&self, other: &Predicate, dom: &Domains) -> bool {
        self.make_bdd(dom) == other.make_bdd(dom)
    }

    /// Mirror test between two rule conditions.
    ///
    /// Source and destination live in disjoint domains, so the other
    /// predicate's fields are first rebuilt on the opposite side (the
    /// crossover); only then are the per-field conditions compared, with
    /// equality in strict mode and inclusion otherwise.
    pub fn is_symmetrical(&self, other: &Predicate, strict: bool, dom: &Domains) -> bool {
        let mut sym_src_zones = Group::new("");
        for zone in other.dst_zones.items() {
            let range = zone.range();
            sym_src_zones.add_item(Arc::new(Zone::new(
                "",
                Side::Src,
                range.lb() as u16,
                range.ub() as u16,
            )));
        }

        let mut sym_dst_zones = Group::new("");
        for zone in other.src_zones.items() {
            let range = zone.range();
            sym_dst_zones.add_item(Arc::new(Zone::new(
                "",
                Side::Dst,
                range.lb() as u16,
                range.ub() as u16,
            )));
        }

        let mut sym_src_addresses = Group::new("");
        for address in other.dst_addresses.items() {
            sym_src_addresses.add_item(Arc::new(address.flipped(Side::Src)));
        }
        let sym_src_addr_bdd = sym_src_addresses
            .make_bdd(dom)
            .negate_if(other.negate_src);

        let mut sym_dst_addresses = Group::new("");
        for address in other.src_addresses.items() {
            sym_dst_addresses.add_item(Arc::new(address.flipped(Side::Dst)));
        }
        let sym_dst_addr_bdd = sym_dst_addresses
            .make_bdd(dom)
            .negate_if(other.negate_dst);

        let src_addr_bdd = self.src_address_bdd(dom);
        let dst_addr_bdd = self.dst_address_bdd(dom);

        let mut symmetrical = if strict {
            sym_src_zones.equal(&self.src_zones, dom)
                && sym_dst_zones.equal(&self.dst_zones, dom)
                && sym_src_addr_bdd == src_addr_bdd
                && sym_dst_addr_bdd == dst_addr_bdd
                && other.services.equal(&self.services, dom)
        } else {
            sym_src_zones.is_subset(&self.src_zones, dom)
                && sym_dst_zones.is_subset(&self.dst_zones, dom)
                && sym_src_addr_bdd.is_subset(&src_addr_bdd)
                && sym_dst_addr_bdd.is_subset(&dst_addr_bdd)
                && other.services.is_subset(&self.services, dom)
        };

        let options = self.options.get();
        if symmetrical && options.applications {
            symmetrical = self.applications.equal(&other.applications, dom);
        }
        if symmetrical && options.users {
            symmetrical = self.users.equal(&other.users, dom);
        }

        symmetrical
    }
}
