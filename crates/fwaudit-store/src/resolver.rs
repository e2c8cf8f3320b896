//! Object-file application and rule-token resolution.

use std::sync::Arc;

use fwaudit_model::{Address, Application, Group, Service, Side, Url, User, Zone};
use tracing::{debug, warn};

use crate::config::ObjectFile;
use crate::error::{StoreError, StoreResult};
use crate::fqdn::FqdnResolver;
use crate::network::Network;

/// Applies an object definition file to the network.
///
/// Plain objects register in one pass. Pools may reference other pools in
/// any order, so they are retried until a pass makes no progress; whatever
/// is left then is a reference cycle (or a truly unknown name), surfaced
/// with the entry's name.
pub fn apply_object_file(file: &ObjectFile, network: &mut Network) -> StoreResult<()> {
    // Plain values first.
    for def in &file.address {
        if let Some(value) = &def.value {
            network.register_src_address(&def.name, value)?;
            network.register_dst_address(&def.name, value)?;
        } else if def.members.is_none() {
            return Err(StoreError::UnknownObject {
                name: def.name.clone(),
            });
        }
    }
    for def in &file.service {
        if let Some(value) = &def.value {
            network.register_service(&def.name, value)?;
        } else if def.members.is_none() {
            return Err(StoreError::UnknownObject {
                name: def.name.clone(),
            });
        }
    }
    for def in &file.application {
        if def.members.is_none() {
            network.register_application(&def.name, &def.services, def.use_app_svc)?;
            if def.use_app_svc {
                // The open-port flavor is registered alongside so both
                // spellings of the application resolve.
                network.register_application(&def.name, &def.services, false)?;
            }
        }
    }
    for def in &file.user {
        if def.members.is_none() {
            network.register_user(&def.name)?;
        }
    }
    for def in &file.url {
        if def.members.is_none() {
            network.register_url(&def.name)?;
        }
    }

    // Pools, until the set stops shrinking.
    #[derive(Clone, Copy, PartialEq)]
    enum PoolKind {
        Address,
        Service,
        Application,
        User,
        Url,
    }

    let mut pending: Vec<(PoolKind, &str, &[String], bool)> = Vec::new();
    for def in &file.address {
        if let Some(members) = &def.members {
            pending.push((PoolKind::Address, &def.name, members, false));
        }
    }
    for def in &file.service {
        if let Some(members) = &def.members {
            pending.push((PoolKind::Service, &def.name, members, false));
        }
    }
    for def in &file.application {
        if let Some(members) = &def.members {
            pending.push((PoolKind::Application, &def.name, members, def.use_app_svc));
        }
    }
    for def in &file.user {
        if let Some(members) = &def.members {
            pending.push((PoolKind::User, &def.name, members, false));
        }
    }
    for def in &file.url {
        if let Some(members) = &def.members {
            pending.push((PoolKind::Url, &def.name, members, false));
        }
    }

    while !pending.is_empty() {
        let before = pending.len();
        let mut still_pending = Vec::new();

        for (kind, name, members, use_app_svc) in pending {
            let result = match kind {
                PoolKind::Address => network
                    .register_src_address_group(name, members)
                    .and_then(|_| network.register_dst_address_group(name, members))
                    .map(|_| ()),
                PoolKind::Service => network.register_service_group(name, members).map(|_| ()),
                PoolKind::Application => network
                    .register_application_group(name, members, use_app_svc)
                    .map(|_| ()),
                PoolKind::User => network.register_user_group(name, members).map(|_| ()),
                PoolKind::Url => network.register_url_group(name, members).map(|_| ()),
            };
            match result {
                Ok(()) => {}
                Err(StoreError::UnknownObject { .. }) => {
                    still_pending.push((kind, name, members, use_app_svc));
                }
                Err(err) => return Err(err),
            }
        }

        if still_pending.len() == before {
            let name = still_pending[0].1.to_string();
            warn!(pool = %name, "pool resolution stuck");
            return Err(StoreError::Model(fwaudit_model::ModelError::CycleInGroup {
                name,
            }));
        }
        pending = still_pending;
    }

    debug!("object file applied");
    Ok(())
}

/// Resolves rule-row tokens into groups, collecting what stays unknown.
pub struct TokenResolver<'n> {
    pub network: &'n mut Network,
    pub fqdn: &'n mut FqdnResolver,
}

impl TokenResolver<'_> {
    pub fn resolve_src_zones(&mut self, tokens: &[String]) -> StoreResult<Group<Zone>> {
        let mut group = Group::new("");
        for token in tokens {
            group.add_item(self.network.register_src_zone(token)?);
        }
        Ok(group)
    }

    pub fn resolve_dst_zones(&mut self, tokens: &[String]) -> StoreResult<Group<Zone>> {
        let mut group = Group::new("");
        for token in tokens {
            group.add_item(self.network.register_dst_zone(token)?);
        }
        Ok(group)
    }

    /// Names, pool names, literals and fqdn tokens, in that order of
    /// preference. Unknown tokens land in `unresolved`.
    pub fn resolve_addresses(
        &mut self,
        side: Side,
        tokens: &[String],
        unresolved: &mut Vec<String>,
    ) -> Group<Address> {
        let mut group = Group::new("");
        for token in tokens {
            if let Some(address) = self.lookup_address(side, token) {
                group.add_item(address);
                continue;
            }
            if let Some(sub) = self.lookup_address_group(side, token) {
                // Catalog groups are cycle-checked at registration.
                group.add_group(sub).expect("catalog groups are acyclic");
                continue;
            }
            if let Ok(address) = Address::parse(token, side, token, false) {
                group.add_item(self.cache_address(side, token, address));
                continue;
            }
            if let Some(literals) = self.fqdn.resolve(token) {
                let mut valid = true;
                let mut atoms = Vec::new();
                for literal in &literals {
                    match Address::parse(token, side, literal, false) {
                        Ok(address) => atoms.push(address),
                        Err(_) => valid = false,
                    }
                }
                if valid && !atoms.is_empty() {
                    for address in atoms {
                        group.add_item(Arc::new(address));
                    }
                    continue;
                }
            }
            unresolved.push(token.clone());
        }
        group
    }

    fn lookup_address(&self, side: Side, name: &str) -> Option<Arc<Address>> {
        match side {
            Side::Src => self.network.src_address(name),
            Side::Dst => self.network.dst_address(name),
        }
    }

    fn lookup_address_group(&self, side: Side, name: &str) -> Option<Arc<Group<Address>>> {
        match side {
            Side::Src => self.network.src_address_group(name),
            Side::Dst => self.network.dst_address_group(name),
        }
    }

    fn cache_address(&mut self, side: Side, token: &str, address: Address) -> Arc<Address> {
        let result = match side {
            Side::Src => self.network.register_src_address(token, token),
            Side::Dst => self.network.register_dst_address(token, token),
        };
        match result {
            Ok(address) => address,
            // Cannot happen: the token missed the catalog just above.
            Err(_) => Arc::new(address),
        }
    }

    pub fn resolve_services(
        &mut self,
        tokens: &[String],
        unresolved: &mut Vec<String>,
    ) -> Group<Service> {
        let mut group = Group::new("");
        for token in tokens {
            if let Some(service) = self.network.service(token) {
                group.add_item(service);
                continue;
            }
            if let Some(sub) = self.network.service_group(token) {
                group.add_group(sub).expect("catalog groups are acyclic");
                continue;
            }
            match self.network.register_service(token, token) {
                Ok(service) => group.add_item(service),
                Err(_) => unresolved.push(token.clone()),
            }
        }
        group
    }

    pub fn resolve_applications(
        &mut self,
        tokens: &[String],
        use_app_svc: bool,
        unresolved: &mut Vec<String>,
    ) -> Group<Application> {
        let mut group = Group::new("");
        for token in tokens {
            if let Some(application) = self.network.application(token, use_app_svc) {
                group.add_item(application);
                continue;
            }
            if let Some(sub) = self.network.application_group(token, use_app_svc) {
                group.add_group(sub).expect("catalog groups are acyclic");
                continue;
            }
            unresolved.push(token.clone());
        }
        group
    }

    /// Users carry no structure; an unknown token becomes a fresh user.
    pub fn resolve_users(&mut self, tokens: &[String]) -> StoreResult<Group<User>> {
        let mut group = Group::new("");
        for token in tokens {
            if let Some(user) = self.network.user(token) {
                group.add_item(user);
            } else if let Some(sub) = self.network.user_group(token) {
                group.add_group(sub).expect("catalog groups are acyclic");
            } else {
                group.add_item(self.network.register_user(token)?);
            }
        }
        Ok(group)
    }

    pub fn resolve_urls(
        &mut self,
        tokens: &[String],
        unresolved: &mut Vec<String>,
    ) -> StoreResult<Group<Url>> {
        let mut group = Group::new("");
        for token in tokens {
            if let Some(url) = self.network.url(token) {
                group.add_item(url);
            } else if let Some(sub) = self.network.url_group(token) {
                group.add_group(sub).expect("catalog groups are acyclic");
            } else if fwaudit_model::url::is_url(token) {
                group.add_item(self.network.register_url(token)?);
            } else {
                unresolved.push(token.clone());
            }
        }
        Ok(group)
    }
}
