//! The network: firewalls, object catalogs and id allocation.
//!
//! One network owns every firewall and the shared object definitions their
//! rules reference. Zone, application, user and URL ids are allocated here,
//! bounded by the width of the backing packet-space domain. Applications
//! come in two flavors keyed by `use_app_svc` (bound to their default
//! services, or open on any port); the two flavors live in separate
//! catalogs exactly because the same name compiles differently.

use std::collections::BTreeMap;
use std::sync::Arc;

use fwaudit_model::{
    Address, Application, DomainKind, Firewall, Group, IpModel, ModelError, ModelOptions,
    OptionsCell, Service, SharedOptions, Side, Table, Url, User, Zone,
};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{StoreError, StoreResult};

pub struct Network {
    options: SharedOptions,
    ip_model: IpModel,

    firewalls: BTreeMap<String, Firewall>,

    // Zone names; a zone id is the index+1 of its name here.
    zones: Vec<String>,

    src_zones: Catalog<Zone>,
    dst_zones: Catalog<Zone>,

    src_addresses: Catalog<Address>,
    src_address_groups: Catalog<Group<Address>>,
    dst_addresses: Catalog<Address>,
    dst_address_groups: Catalog<Group<Address>>,

    services: Catalog<Service>,
    service_groups: Catalog<Group<Service>>,

    // Indexed by use_app_svc.
    applications: [Catalog<Application>; 2],
    application_groups: [Catalog<Group<Application>>; 2],
    app_services: Catalog<Service>,

    users: Catalog<User>,
    user_groups: Catalog<Group<User>>,

    urls: Catalog<Url>,
    url_groups: Catalog<Group<Url>>,

    // One id per application name, shared by both flavors.
    app_ids: BTreeMap<String, u16>,

    next_app_id: u32,
    next_user_id: u32,
    next_url_id: u32,
}

impl Network {
    pub fn new(ip_model: IpModel, model_options: ModelOptions) -> Self {
        let mut network = Network {
            options: OptionsCell::new(model_options),
            ip_model,
            firewalls: BTreeMap::new(),
            zones: Vec::new(),
            src_zones: Catalog::new(),
            dst_zones: Catalog::new(),
            src_addresses: Catalog::new(),
            src_address_groups: Catalog::new(),
            dst_addresses: Catalog::new(),
            dst_address_groups: Catalog::new(),
            services: Catalog::new(),
            service_groups: Catalog::new(),
            applications: [Catalog::new(), Catalog::new()],
            application_groups: [Catalog::new(), Catalog::new()],
            app_services: Catalog::new(),
            users: Catalog::new(),
            user_groups: Catalog::new(),
            urls: Catalog::new(),
            url_groups: Catalog::new(),
            app_ids: BTreeMap::new(),
            next_app_id: 1,
            next_user_id: 1,
            next_url_id: 1,
        };
        network.seed_any_objects();
        network
    }

    /// Every catalog answers "any" with its sentinel.
    fn seed_any_objects(&mut self) {
        self.src_zones
            .insert("any", Arc::new(Zone::any(Side::Src)))
            .expect("fresh catalog");
        self.dst_zones
            .insert("any", Arc::new(Zone::any(Side::Dst)))
            .expect("fresh catalog");
        self.src_addresses
            .insert("any", Arc::new(Address::any(Side::Src)))
            .expect("fresh catalog");
        self.dst_addresses
            .insert("any", Arc::new(Address::any(Side::Dst)))
            .expect("fresh catalog");
        self.services
            .insert("any", Arc::new(Service::any()))
            .expect("fresh catalog");
        let any_app = Arc::new(Application::any());
        self.applications[0]
            .insert("any", Arc::clone(&any_app))
            .expect("fresh catalog");
        self.applications[1]
            .insert("any", any_app)
            .expect("fresh catalog");
        self.users
            .insert("any", Arc::new(User::any()))
            .expect("fresh catalog");
        self.urls
            .insert("any", Arc::new(Url::any()))
            .expect("fresh catalog");
    }

    pub fn options(&self) -> &SharedOptions {
        &self.options
    }

    pub fn model_options(&self) -> ModelOptions {
        self.options.get()
    }

    pub fn ip_model(&self) -> IpModel {
        self.ip_model
    }

    // ── Firewalls ──────────────────────────────────────────────────────

    pub fn add_firewall(&mut self, firewall: Firewall) -> StoreResult<()> {
        let key = firewall.name().to_ascii_lowercase();
        if self.firewalls.contains_key(&key) {
            return Err(StoreError::DuplicateObject {
                name: firewall.name().to_string(),
            });
        }
        debug!(firewall = firewall.name(), "firewall added");
        self.firewalls.insert(key, firewall);
        Ok(())
    }

    pub fn firewall(&self, name: &str) -> Option<&Firewall> {
        self.firewalls.get(&name.to_ascii_lowercase())
    }

    pub fn firewall_mut(&mut self, name: &str) -> Option<&mut Firewall> {
        self.firewalls.get_mut(&name.to_ascii_lowercase())
    }

    pub fn delete_firewall(&mut self, name: &str) -> StoreResult<()> {
        self.firewalls
            .remove(&name.to_ascii_lowercase())
            .map(|_| ())
            .ok_or_else(|| {
                StoreError::Model(ModelError::FirewallNotFound {
                    name: name.to_string(),
                })
            })
    }

    pub fn firewalls(&self) -> impl Iterator<Item = &Firewall> {
        self.firewalls.values()
    }

    /// One row per firewall with its rule counters.
    pub fn info(&self) -> Table {
        let mut table = Table::new(vec!["firewall", "rules", "allow/deny"]);
        for firewall in self.firewalls.values() {
            let row = table.add_row();
            row.cell(0).append(firewall.name());
            row.cell(1).append(firewall.len().to_string());
            row.cell(2).append(firewall.acl().counters().to_string());
        }
        table
    }

    /// Catalog sizes, for `os info`.
    pub fn object_info(&self) -> Table {
        let mut table = Table::new(vec!["catalog", "objects"]);
        let mut add = |label: &str, count: usize| {
            let row = table.add_row();
            row.cell(0).append(label);
            row.cell(1).append(count.to_string());
        };
        add("zones", self.zones.len());
        add("src addresses", self.src_addresses.len());
        add("src address groups", self.src_address_groups.len());
        add("dst addresses", self.dst_addresses.len());
        add("dst address groups", self.dst_address_groups.len());
        add("services", self.services.len());
        add("service groups", self.service_groups.len());
        add(
            "applications",
            self.applications[0].len() + self.applications[1].len(),
        );
        add(
            "application groups",
            self.application_groups[0].len() + self.application_groups[1].len(),
        );
        add("users", self.users.len());
        add("user groups", self.user_groups.len());
        add("urls", self.urls.len());
        add("url groups", self.url_groups.len());
        table
    }

    // ── Zones ──────────────────────────────────────────────────────────

    fn zone_id(&mut self, name: &str) -> StoreResult<u16> {
        let key = name.to_ascii_lowercase();
        if let Some(index) = self.zones.iter().position(|z| *z == key) {
            return Ok((index + 1) as u16);
        }
        let id = self.zones.len() as u128 + 1;
        if id > DomainKind::SrcZone.max() {
            return Err(StoreError::Model(ModelError::DomainOverflow {
                domain: "zone",
                id,
            }));
        }
        self.zones.push(key);
        Ok(id as u16)
    }

    pub fn register_src_zone(&mut self, name: &str) -> StoreResult<Arc<Zone>> {
        if let Some(zone) = self.src_zones.get(name) {
            return Ok(zone);
        }
        let id = self.zone_id(name)?;
        self.src_zones
            .insert(name, Arc::new(Zone::with_id(name, Side::Src, id)))
    }

    pub fn register_dst_zone(&mut self, name: &str) -> StoreResult<Arc<Zone>> {
        if let Some(zone) = self.dst_zones.get(name) {
            return Ok(zone);
        }
        let id = self.zone_id(name)?;
        self.dst_zones
            .insert(name, Arc::new(Zone::with_id(name, Side::Dst, id)))
    }

    pub fn src_zone(&self, name: &str) -> Option<Arc<Zone>> {
        self.src_zones.get(name)
    }

    pub fn dst_zone(&self, name: &str) -> Option<Arc<Zone>> {
        self.dst_zones.get(name)
    }

    // ── Addresses ──────────────────────────────────────────────────────

    pub fn register_src_address(&mut self, name: &str, literal: &str) -> StoreResult<Arc<Address>> {
        let address = Address::parse(name, Side::Src, literal, false).map_err(StoreError::Model)?;
        self.src_addresses.insert(name, Arc::new(address))
    }

    pub fn register_dst_address(&mut self, name: &str, literal: &str) -> StoreResult<Arc<Address>> {
        let address = Address::parse(name, Side::Dst, literal, false).map_err(StoreError::Model)?;
        self.dst_addresses.insert(name, Arc::new(address))
    }

    /// A named object spanning several literals becomes a group of
    /// anonymous members.
    pub fn register_src_multi_address(
        &mut self,
        name: &str,
        literals: &[String],
    ) -> StoreResult<Arc<Group<Address>>> {
        let mut group = Group::new(name);
        for literal in literals {
            let address = Address::parse("", Side::Src, literal, false).map_err(StoreError::Model)?;
            group.add_item(Arc::new(address));
        }
        self.src_address_groups.insert(name, Arc::new(group))
    }

    pub fn register_dst_multi_address(
        &mut self,
        name: &str,
        literals: &[String],
    ) -> StoreResult<Arc<Group<Address>>> {
        let mut group = Group::new(name);
        for literal in literals {
            let address = Address::parse("", Side::Dst, literal, false).map_err(StoreError::Model)?;
            group.add_item(Arc::new(address));
        }
        self.dst_address_groups.insert(name, Arc::new(group))
    }

    pub fn register_src_address_group(
        &mut self,
        name: &str,
        members: &[String],
    ) -> StoreResult<Arc<Group<Address>>> {
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(address) = self.src_addresses.get(member) {
                group.add_item(address);
            } else if let Some(sub) = self.src_address_groups.get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.src_address_groups.insert(name, Arc::new(group))
    }

    pub fn register_dst_address_group(
        &mut self,
        name: &str,
        members: &[String],
    ) -> StoreResult<Arc<Group<Address>>> {
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(address) = self.dst_addresses.get(member) {
                group.add_item(address);
            } else if let Some(sub) = self.dst_address_groups.get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.dst_address_groups.insert(name, Arc::new(group))
    }

    pub fn src_address(&self, name: &str) -> Option<Arc<Address>> {
        self.src_addresses.get(name)
    }

    pub fn dst_address(&self, name: &str) -> Option<Arc<Address>> {
        self.dst_addresses.get(name)
    }

    pub fn src_address_group(&self, name: &str) -> Option<Arc<Group<Address>>> {
        self.src_address_groups.get(name)
    }

    pub fn dst_address_group(&self, name: &str) -> Option<Arc<Group<Address>>> {
        self.dst_address_groups.get(name)
    }

    // ── Services ───────────────────────────────────────────────────────

    pub fn register_service(&mut self, name: &str, literal: &str) -> StoreResult<Arc<Service>> {
        let service = Service::parse(name, literal).map_err(StoreError::Model)?;
        self.services.insert(name, Arc::new(service))
    }

    pub fn register_multi_service(
        &mut self,
        name: &str,
        literals: &[String],
    ) -> StoreResult<Arc<Group<Service>>> {
        let mut group = Group::new(name);
        for literal in literals {
            let service = Service::parse("", literal).map_err(StoreError::Model)?;
            group.add_item(Arc::new(service));
        }
        self.service_groups.insert(name, Arc::new(group))
    }

    pub fn register_service_group(
        &mut self,
        name: &str,
        members: &[String],
    ) -> StoreResult<Arc<Group<Service>>> {
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(service) = self.services.get(member) {
                group.add_item(service);
            } else if let Some(sub) = self.service_groups.get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.service_groups.insert(name, Arc::new(group))
    }

    pub fn service(&self, name: &str) -> Option<Arc<Service>> {
        self.services.get(name)
    }

    pub fn service_group(&self, name: &str) -> Option<Arc<Group<Service>>> {
        self.service_groups.get(name)
    }

    // ── Applications ───────────────────────────────────────────────────

    /// A default service shared by applications is registered once under
    /// its literal.
    fn app_service(&mut self, literal: &str) -> StoreResult<Arc<Service>> {
        if let Some(service) = self.app_services.get(literal) {
            return Ok(service);
        }
        let service = Service::parse(literal, literal).map_err(StoreError::Model)?;
        self.app_services.insert(literal, Arc::new(service))
    }

    pub fn register_application(
        &mut self,
        name: &str,
        service_literals: &[String],
        use_app_svc: bool,
    ) -> StoreResult<Arc<Application>> {
        let key = name.to_ascii_lowercase();
        let id = match self.app_ids.get(&key) {
            Some(id) => *id,
            None => {
                let id = self.next_app_id as u128;
                if id > DomainKind::Application.max() {
                    return Err(StoreError::Model(ModelError::DomainOverflow {
                        domain: "application",
                        id,
                    }));
                }
                self.next_app_id += 1;
                self.app_ids.insert(key, id as u16);
                id as u16
            }
        };

        let mut services = Group::new(format!("{name}-svc"));
        for literal in service_literals {
            services.add_item(self.app_service(literal)?);
        }

        let application = Arc::new(Application::new(
            name,
            id,
            services,
            Arc::clone(&self.options),
            use_app_svc,
        ));
        self.applications[use_app_svc as usize].insert(name, application)
    }

    pub fn register_application_group(
        &mut self,
        name: &str,
        members: &[String],
        use_app_svc: bool,
    ) -> StoreResult<Arc<Group<Application>>> {
        let flavor = use_app_svc as usize;
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(application) = self.applications[flavor].get(member) {
                group.add_item(application);
            } else if let Some(sub) = self.application_groups[flavor].get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.application_groups[flavor].insert(name, Arc::new(group))
    }

    pub fn application(&self, name: &str, use_app_svc: bool) -> Option<Arc<Application>> {
        self.applications[use_app_svc as usize].get(name)
    }

    pub fn application_group(
        &self,
        name: &str,
        use_app_svc: bool,
    ) -> Option<Arc<Group<Application>>> {
        self.application_groups[use_app_svc as usize].get(name)
    }

    // ── Users ──────────────────────────────────────────────────────────

    pub fn register_user(&mut self, name: &str) -> StoreResult<Arc<User>> {
        let id = self.next_user_id as u128;
        if id > DomainKind::User.max() {
            return Err(StoreError::Model(ModelError::DomainOverflow {
                domain: "user",
                id,
            }));
        }
        let user = self
            .users
            .insert(name, Arc::new(User::new(name, id as u16, Arc::clone(&self.options))))?;
        self.next_user_id += 1;
        Ok(user)
    }

    pub fn register_user_group(
        &mut self,
        name: &str,
        members: &[String],
    ) -> StoreResult<Arc<Group<User>>> {
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(user) = self.users.get(member) {
                group.add_item(user);
            } else if let Some(sub) = self.user_groups.get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.user_groups.insert(name, Arc::new(group))
    }

    pub fn user(&self, name: &str) -> Option<Arc<User>> {
        self.users.get(name)
    }

    pub fn user_group(&self, name: &str) -> Option<Arc<Group<User>>> {
        self.user_groups.get(name)
    }

    // ── Urls ───────────────────────────────────────────────────────────

    pub fn register_url(&mut self, name: &str) -> StoreResult<Arc<Url>> {
        let id = self.next_url_id as u128;
        if id > DomainKind::Url.max() {
            return Err(StoreError::Model(ModelError::DomainOverflow {
                domain: "url",
                id,
            }));
        }
        let url = self
            .urls
            .insert(name, Arc::new(Url::new(name, id as u16, Arc::clone(&self.options))))?;
        self.next_url_id += 1;
        Ok(url)
    }

    pub fn register_url_group(
        &mut self,
        name: &str,
        members: &[String],
    ) -> StoreResult<Arc<Group<Url>>> {
        let mut group = Group::new(name);
        for member in members {
            if member.eq_ignore_ascii_case(name) {
                return Err(StoreError::Model(ModelError::CycleInGroup {
                    name: name.to_string(),
                }));
            }
            if let Some(url) = self.urls.get(member) {
                group.add_item(url);
            } else if let Some(sub) = self.url_groups.get(member) {
                group.add_group(sub).map_err(StoreError::Model)?;
            } else {
                return Err(StoreError::UnknownObject {
                    name: member.clone(),
                });
            }
        }
        self.url_groups.insert(name, Arc::new(group))
    }

    pub fn url(&self, name: &str) -> Option<Arc<Url>> {
        self.urls.get(name)
    }

    pub fn url_group(&self, name: &str) -> Option<Arc<Group<Url>>> {
        self.url_groups.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwaudit_model::Atom;

    fn network() -> Network {
        Network::new(IpModel::Dual, ModelOptions::none())
    }

    #[test]
    fn zone_ids_are_shared_between_sides() {
        let mut nw = network();
        let src = nw.register_src_zone("dmz").unwrap();
        let dst = nw.register_dst_zone("dmz").unwrap();
        assert_eq!(src.range().lb(), dst.range().lb());

        let other = nw.register_src_zone("inside").unwrap();
        assert_ne!(src.range().lb(), other.range().lb());
    }

    #[test]
    fn any_objects_are_preseeded() {
        let nw = network();
        assert!(nw.src_zone("any").unwrap().is_any());
        assert!(nw.dst_address("any").unwrap().is_any());
        assert!(nw.service("ANY").unwrap().is_any());
        assert!(nw.application("any", true).unwrap().is_any());
        assert!(nw.user("any").unwrap().is_any());
        assert!(nw.url("any").unwrap().is_any());
    }

    #[test]
    fn address_groups_resolve_members_from_the_catalog() {
        let mut nw = network();
        nw.register_src_address("web1", "10.0.0.1").unwrap();
        nw.register_src_address("web2", "10.0.0.2").unwrap();
        let group = nw
            .register_src_address_group("web", &["web1".into(), "web2".into()])
            .unwrap();
        assert_eq!(group.items().len(), 2);

        let err = nw
            .register_src_address_group("bad", &["missing".into()])
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownObject { .. }));
    }

    #[test]
    fn self_referencing_group_is_a_cycle() {
        let mut nw = network();
        let err = nw
            .register_service_group("loop", &["loop".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Model(ModelError::CycleInGroup { .. })
        ));
    }

    #[test]
    fn application_flavors_are_distinct() {
        let mut nw = network();
        nw.register_application("web-browsing", &["tcp/80".into()], true)
            .unwrap();
        assert!(nw.application("web-browsing", true).is_some());
        assert!(nw.application("web-browsing", false).is_none());
    }

    #[test]
    fn duplicate_firewall_names_are_rejected() {
        let mut nw = network();
        nw.add_firewall(Firewall::new("edge")).unwrap();
        assert!(matches!(
            nw.add_firewall(Firewall::new("Edge")),
            Err(StoreError::DuplicateObject { .. })
        ));
    }
}
