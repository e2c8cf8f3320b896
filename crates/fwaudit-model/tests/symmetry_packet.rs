//! Symmetry detection and concrete packet tracing.

mod common;

use common::{dst_addr, dst_zone, predicate_zoned, rule, service, src_addr, src_zone};
use fwaudit_model::{
    Analyzer, Domains, Firewall, PacketTester, Rule, RuleAction, RuleStatus, TestPacket,
};

fn zoned_rule(
    id: u32,
    action: RuleAction,
    sz: (&str, u16),
    src: &str,
    dz: (&str, u16),
    dst: &str,
    svc: &str,
) -> Rule {
    Rule::new(
        id,
        "",
        RuleStatus::Enabled,
        action,
        predicate_zoned(
            Some(src_zone(sz.0, sz.1)),
            src,
            Some(dst_zone(dz.0, dz.1)),
            dst,
            svc,
        ),
    )
}

#[test]
fn mirrored_rules_are_reported_once_in_acl_order() {
    let mut fw = Firewall::new("sym");
    fw.add_rule(zoned_rule(
        1,
        RuleAction::Allow,
        ("Z1", 1),
        "10.0.0.1",
        ("Z2", 2),
        "10.0.0.2",
        "tcp/22",
    ))
    .unwrap();
    fw.add_rule(zoned_rule(
        2,
        RuleAction::Allow,
        ("Z2", 2),
        "10.0.0.2",
        ("Z1", 1),
        "10.0.0.1",
        "tcp/22",
    ))
    .unwrap();

    let dom = Domains::new();
    let pairs = Analyzer::new(fw.acl())
        .check_symmetry(true, &dom, &|| false)
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0.id(), 1);
    assert_eq!(pairs[0].1.id(), 2);
}

#[test]
fn strict_symmetry_requires_equal_mirrors() {
    let mut fw = Firewall::new("sym-strict");
    fw.add_rule(zoned_rule(
        1,
        RuleAction::Allow,
        ("Z1", 1),
        "10.0.0.0/24",
        ("Z2", 2),
        "10.1.0.0/24",
        "tcp/22",
    ))
    .unwrap();
    // The way back covers only one host of each side.
    fw.add_rule(zoned_rule(
        2,
        RuleAction::Allow,
        ("Z2", 2),
        "10.1.0.7",
        ("Z1", 1),
        "10.0.0.7",
        "tcp/22",
    ))
    .unwrap();

    let dom = Domains::new();
    let analyzer = Analyzer::new(fw.acl());

    assert!(analyzer.check_symmetry(true, &dom, &|| false).unwrap().is_empty());
    let loose = analyzer.check_symmetry(false, &dom, &|| false).unwrap();
    assert_eq!(loose.len(), 1);
}

#[test]
fn differing_actions_never_pair() {
    let mut fw = Firewall::new("sym-action");
    fw.add_rule(zoned_rule(
        1,
        RuleAction::Allow,
        ("Z1", 1),
        "10.0.0.1",
        ("Z2", 2),
        "10.0.0.2",
        "tcp/22",
    ))
    .unwrap();
    fw.add_rule(zoned_rule(
        2,
        RuleAction::Deny,
        ("Z2", 2),
        "10.0.0.2",
        ("Z1", 1),
        "10.0.0.1",
        "tcp/22",
    ))
    .unwrap();

    let dom = Domains::new();
    let pairs = Analyzer::new(fw.acl())
        .check_symmetry(true, &dom, &|| false)
        .unwrap();
    assert!(pairs.is_empty());
}

#[test]
fn symmetry_is_cancellable() {
    let mut fw = Firewall::new("sym-int");
    fw.add_rule(rule(1, RuleAction::Allow, "any", "any", "any"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Allow, "any", "any", "any"))
        .unwrap();

    let dom = Domains::new();
    let err = Analyzer::new(fw.acl())
        .check_symmetry(true, &dom, &|| true)
        .unwrap_err();
    assert!(matches!(err, fwaudit_model::ModelError::Interrupted));
}

#[test]
fn traced_packet_hits_the_first_covering_rule() {
    let mut fw = Firewall::new("trace");
    fw.add_rule(rule(1, RuleAction::Deny, "10.1.1.0/25", "any", "any"))
        .unwrap();
    fw.add_rule(rule(
        2,
        RuleAction::Allow,
        "10.1.1.0/25",
        "192.168.1.0/24",
        "tcp/80",
    ))
    .unwrap();

    let dom = Domains::new();
    let tester = PacketTester::new(fw.acl());

    let packet = TestPacket {
        src_addresses: vec![src_addr("10.1.1.8")],
        dst_addresses: vec![dst_addr("192.168.1.50")],
        services: vec![service("tcp/80")],
        ..TestPacket::default()
    };

    let (accepted, matched) = tester.is_packet_allowed(&packet, &dom);
    assert!(!accepted);
    assert_eq!(matched.map(Rule::id), Some(1));
}

#[test]
fn unmatched_packet_is_implicitly_denied() {
    let mut fw = Firewall::new("trace-miss");
    fw.add_rule(rule(
        1,
        RuleAction::Allow,
        "10.1.1.0/25",
        "192.168.1.0/24",
        "tcp/80",
    ))
    .unwrap();

    let dom = Domains::new();
    let tester = PacketTester::new(fw.acl());

    let packet = TestPacket {
        src_addresses: vec![src_addr("172.16.0.1")],
        dst_addresses: vec![dst_addr("192.168.1.50")],
        services: vec![service("tcp/80")],
        ..TestPacket::default()
    };

    let (accepted, matched) = tester.is_packet_allowed(&packet, &dom);
    assert!(!accepted);
    assert!(matched.is_none());
}

#[test]
fn packet_match_ignores_zones_the_probe_left_out() {
    let mut fw = Firewall::new("trace-zones");
    fw.add_rule(zoned_rule(
        1,
        RuleAction::Allow,
        ("inside", 1),
        "10.0.0.0/8",
        ("outside", 2),
        "any",
        "tcp/443",
    ))
    .unwrap();

    let dom = Domains::new();
    let tester = PacketTester::new(fw.acl());

    // No zones supplied: the probe must still match the zoned rule.
    let packet = TestPacket {
        src_addresses: vec![src_addr("10.2.3.4")],
        dst_addresses: vec![dst_addr("8.8.8.8")],
        services: vec![service("tcp/443")],
        ..TestPacket::default()
    };
    let (accepted, matched) = tester.is_packet_allowed(&packet, &dom);
    assert!(accepted);
    assert_eq!(matched.map(Rule::id), Some(1));

    // The wrong zone must not match.
    let packet = TestPacket {
        src_zone: Some(src_zone("elsewhere", 9)),
        src_addresses: vec![src_addr("10.2.3.4")],
        dst_addresses: vec![dst_addr("8.8.8.8")],
        services: vec![service("tcp/443")],
        ..TestPacket::default()
    };
    let (accepted, matched) = tester.is_packet_allowed(&packet, &dom);
    assert!(!accepted);
    assert!(matched.is_none());
}
