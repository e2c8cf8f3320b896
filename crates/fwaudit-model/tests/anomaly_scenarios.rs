//! Anomaly classification against small, hand-checked ACLs.

mod common;

use common::{predicate, rule};
use fwaudit_model::{
    Analyzer, AnomalyDetails, AnomalyLevel, AnomalyScope, BddExt, Domains, Firewall, Rule,
    RuleAction, RuleStatus,
};

fn never() -> impl Fn() -> bool {
    || false
}

fn analyze(fw: &Firewall) -> (Domains, fwaudit_model::RuleAnomalies<'_>) {
    let dom = Domains::new();
    let anomalies = Analyzer::new(fw.acl())
        .check_anomaly(&dom, &never(), None)
        .unwrap();
    (dom, anomalies)
}

#[test]
fn shadowed_allow_behind_a_wider_deny() {
    let mut fw = Firewall::new("s1");
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

    let (_dom, anomalies) = analyze(&fw);
    assert_eq!(anomalies.len(), 1);
    assert!(anomalies.missing_deny_all);

    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 2);
    assert_eq!(finding.details.scope(), AnomalyScope::FullyMaskedRule);
    assert_eq!(finding.details.level(), AnomalyLevel::Error);
    match &finding.details {
        AnomalyDetails::Shadowed { shadowing } => {
            assert_eq!(shadowing.id_list(), vec![1]);
        }
        other => panic!("expected a shadowing finding, got {other:?}"),
    }
}

#[test]
fn fully_redundant_allow_inside_a_wider_allow() {
    let mut fw = Firewall::new("s2");
    fw.add_rule(rule(1, RuleAction::Allow, "any", "10.0.0.0/8", "any"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Allow, "any", "10.1.2.0/24", "any"))
        .unwrap();

    let (_dom, anomalies) = analyze(&fw);
    assert_eq!(anomalies.len(), 1);

    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 2);
    match &finding.details {
        AnomalyDetails::FullRedundant { redundant } => {
            assert_eq!(redundant.id_list(), vec![1]);
        }
        other => panic!("expected a redundancy finding, got {other:?}"),
    }
}

#[test]
fn deny_generalizing_an_earlier_allow() {
    let mut fw = Firewall::new("s3");
    fw.add_rule(rule(
        1,
        RuleAction::Allow,
        "10.1.1.5",
        "192.168.1.1",
        "tcp/443",
    ))
    .unwrap();
    fw.add_rule(rule(
        2,
        RuleAction::Deny,
        "10.1.1.0/24",
        "192.168.1.0/24",
        "any",
    ))
    .unwrap();

    let (_dom, anomalies) = analyze(&fw);
    assert_eq!(anomalies.len(), 1);

    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 2);
    assert_eq!(finding.details.scope(), AnomalyScope::PartiallyMaskedRule);
    assert_eq!(finding.details.level(), AnomalyLevel::Warning);
    match &finding.details {
        AnomalyDetails::Generalization { generalized } => {
            assert_eq!(generalized.id_list(), vec![1]);
        }
        other => panic!("expected a generalization finding, got {other:?}"),
    }
}

#[test]
fn empty_acl_reports_nothing_but_the_missing_deny_all() {
    let fw = Firewall::new("empty");
    let (_dom, anomalies) = analyze(&fw);
    assert!(anomalies.is_empty());
    assert!(anomalies.missing_deny_all);
}

#[test]
fn trailing_deny_all_is_not_a_finding_and_closes_the_acl() {
    let mut fw = Firewall::new("closed");
    fw.add_rule(rule(1, RuleAction::Allow, "10.0.0.0/8", "any", "tcp/80"))
        .unwrap();
    fw.add_rule(Rule::new(
        2,
        "",
        RuleStatus::Enabled,
        RuleAction::Deny,
        fwaudit_model::Predicate::any(),
    ))
    .unwrap();

    let (_dom, anomalies) = analyze(&fw);
    assert!(anomalies.is_empty());
    assert!(!anomalies.missing_deny_all);
}

#[test]
fn correlated_rules_cross_without_containment() {
    let mut fw = Firewall::new("corr");
    fw.add_rule(rule(1, RuleAction::Deny, "10.0.0.0/9", "any", "tcp/79-80"))
        .unwrap();
    // Overlaps rule 1 on 10.0.0.0/9 x tcp/80 but neither contains the other.
    fw.add_rule(rule(2, RuleAction::Allow, "10.0.0.0/8", "any", "tcp/80-81"))
        .unwrap();

    let (_dom, anomalies) = analyze(&fw);
    assert_eq!(anomalies.len(), 1);
    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 2);
    match &finding.details {
        AnomalyDetails::Correlated { correlated } => {
            assert_eq!(correlated.id_list(), vec![1]);
        }
        other => panic!("expected a correlation finding, got {other:?}"),
    }
}

/// Shadowed findings honor the defining inclusion: the rule's condition is
/// inside the union of the earlier opposite-action conditions.
#[test]
fn shadowing_inclusion_holds() {
    let mut fw = Firewall::new("incl");
    fw.add_rule(rule(1, RuleAction::Deny, "10.1.1.0/25", "any", "any"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Deny, "10.1.1.128/25", "any", "any"))
        .unwrap();
    fw.add_rule(rule(3, RuleAction::Allow, "10.1.1.0/24", "any", "tcp/22"))
        .unwrap();

    let dom = Domains::new();
    let anomalies = Analyzer::new(fw.acl())
        .check_anomaly(&dom, &|| false, None)
        .unwrap();
    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 3);

    match &finding.details {
        AnomalyDetails::Shadowed { shadowing } => {
            assert_eq!(shadowing.id_list(), vec![1, 2]);
            let mut cover = dom.mk_false();
            for earlier in shadowing.iter() {
                cover = cover.or(&earlier.predicate().make_bdd(&dom));
            }
            assert!(finding.rule.predicate().make_bdd(&dom).is_subset(&cover));
        }
        other => panic!("expected a shadowing finding, got {other:?}"),
    }
}

#[test]
fn interrupt_aborts_the_pass() {
    let mut fw = Firewall::new("int");
    fw.add_rule(rule(1, RuleAction::Allow, "any", "any", "any"))
        .unwrap();

    let dom = Domains::new();
    let err = Analyzer::new(fw.acl())
        .check_anomaly(&dom, &|| true, None)
        .unwrap_err();
    assert!(matches!(err, fwaudit_model::ModelError::Interrupted));
}

#[test]
fn check_any_and_check_deny_pick_the_expected_rules() {
    let mut fw = Firewall::new("queries");
    fw.add_rule(rule(1, RuleAction::Allow, "any", "10.0.0.0/8", "any"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Allow, "any", "10.0.0.0/8", "tcp/80"))
        .unwrap();
    fw.add_rule(Rule::new(
        3,
        "",
        RuleStatus::Enabled,
        RuleAction::Deny,
        fwaudit_model::Predicate::any(),
    ))
    .unwrap();

    let dom = Domains::new();
    let analyzer = Analyzer::new(fw.acl());

    let mut probe = fwaudit_model::Group::new("");
    probe.add_item(common::dst_addr("10.1.0.0/16"));

    // Rule 2 restricts the service set, so only rule 1 opens everything.
    assert_eq!(analyzer.check_any(&probe, &dom).id_list(), vec![1]);
    assert_eq!(analyzer.check_deny(&dom).id_list(), vec![3]);
}

/// The fully-masked mixed case: packets split between both earlier
/// actions.
#[test]
fn redundant_or_correlated_mixed_cover() {
    let mut fw = Firewall::new("mixed");
    fw.add_rule(rule(1, RuleAction::Allow, "10.0.0.0/25", "any", "any"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Deny, "10.0.0.128/25", "any", "any"))
        .unwrap();
    fw.add_rule(rule(3, RuleAction::Allow, "10.0.0.0/24", "any", "any"))
        .unwrap();

    let (_dom, anomalies) = analyze(&fw);
    let finding = anomalies
        .iter()
        .find(|a| a.rule.id() == 3)
        .expect("rule 3 flagged");
    match &finding.details {
        AnomalyDetails::RedundantOrCorrelated {
            redundant,
            correlated,
        } => {
            assert_eq!(redundant.id_list(), vec![1]);
            assert_eq!(correlated.id_list(), vec![2]);
        }
        other => panic!("expected the mixed finding, got {other:?}"),
    }
}

#[test]
fn anomaly_table_lists_findings_in_acl_order() {
    let mut fw = Firewall::new("table");
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

    let (_dom, anomalies) = analyze(&fw);
    let table = anomalies.create_table(false);
    assert_eq!(
        table.headers(),
        &["id", "src.zone", "dst.zone", "anomaly", "level", "details"]
    );
    assert_eq!(table.rows().len(), 1);
    assert_eq!(table.rows()[0].cells()[0].text(), "2");
    let details = table.rows()[0].cells()[5].text();
    assert!(details.contains("Shadowed rule"), "details: {details}");
    assert!(details.contains('1'), "details: {details}");
}

/// The predicate used by the walk is the same for equal spellings, so an
/// exact duplicate is fully redundant, never "shadowed by itself".
#[test]
fn exact_duplicate_is_redundant() {
    let mut fw = Firewall::new("dup");
    fw.add_rule(rule(1, RuleAction::Allow, "10.2.0.0/16", "any", "tcp/443"))
        .unwrap();
    fw.add_rule(rule(2, RuleAction::Allow, "10.2.0.0/16", "any", "tcp/443"))
        .unwrap();

    let (dom, anomalies) = analyze(&fw);
    let finding = anomalies.iter().next().unwrap();
    assert_eq!(finding.rule.id(), 2);
    assert!(matches!(
        finding.details,
        AnomalyDetails::FullRedundant { .. }
    ));

    // Both spell the same condition.
    assert_eq!(
        predicate("10.2.0.0/16", "any", "tcp/443").make_bdd(&dom),
        finding.rule.predicate().make_bdd(&dom),
    );
}
