//! Shared builders for the end-to-end scenarios.
#![allow(dead_code)]

use std::sync::Arc;

use fwaudit_model::{
    Address, Application, Destinations, Group, OptionsCell, Predicate, Rule, RuleAction,
    RuleStatus, Service, Side, Sources, Url, User, Zone,
};

pub fn src_zone(name: &str, id: u16) -> Arc<Zone> {
    Arc::new(Zone::with_id(name, Side::Src, id))
}

pub fn dst_zone(name: &str, id: u16) -> Arc<Zone> {
    Arc::new(Zone::with_id(name, Side::Dst, id))
}

pub fn src_addr(token: &str) -> Arc<Address> {
    Arc::new(Address::parse("", Side::Src, token, false).unwrap())
}

pub fn dst_addr(token: &str) -> Arc<Address> {
    Arc::new(Address::parse("", Side::Dst, token, false).unwrap())
}

pub fn service(token: &str) -> Arc<Service> {
    Arc::new(Service::parse("", token).unwrap())
}

pub fn predicate(src: &str, dst: &str, svc: &str) -> Predicate {
    predicate_zoned(None, src, None, dst, svc)
}

pub fn predicate_zoned(
    src_zone_atom: Option<Arc<Zone>>,
    src: &str,
    dst_zone_atom: Option<Arc<Zone>>,
    dst: &str,
    svc: &str,
) -> Predicate {
    Predicate::new(
        Sources {
            zones: Group::with_item(
                "",
                src_zone_atom.unwrap_or_else(|| Arc::new(Zone::any(Side::Src))),
            ),
            addresses: Group::with_item("", src_addr(src)),
            negate: false,
        },
        Destinations {
            zones: Group::with_item(
                "",
                dst_zone_atom.unwrap_or_else(|| Arc::new(Zone::any(Side::Dst))),
            ),
            addresses: Group::with_item("", dst_addr(dst)),
            negate: false,
        },
        Group::with_item("", service(svc)),
        false,
        Group::with_item("", Arc::new(Application::any())),
        Group::with_item("", Arc::new(User::any())),
        Group::with_item("", Arc::new(Url::any())),
        OptionsCell::empty(),
    )
}

pub fn rule(id: u32, action: RuleAction, src: &str, dst: &str, svc: &str) -> Rule {
    Rule::new(
        id,
        "",
        RuleStatus::Enabled,
        action,
        predicate(src, dst, svc),
    )
}
