//! Whole-policy equivalence.

use biodivine_lib_bdd::Bdd;

use crate::domain::Domains;
use crate::engine::{BddExt, NodeRelation};
use crate::rule::{RuleAction, RuleStatus};
use crate::rulelist::RuleList;

/// How two rule lists relate, separately for the traffic they admit and
/// the traffic they reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyRelationship {
    pub allowed: NodeRelation,
    pub denied: NodeRelation,
}

pub struct PolicyComparator;

impl PolicyComparator {
    pub fn compare(
        first: &RuleList<'_>,
        second: &RuleList<'_>,
        dom: &Domains,
    ) -> PolicyRelationship {
        let (allowed_a, denied_a) = Self::fold(first, dom);
        let (allowed_b, denied_b) = Self::fold(second, dom);

        PolicyRelationship {
            allowed: allowed_a.relation(&allowed_b),
            denied: denied_a.relation(&denied_b),
        }
    }

    /// Reduces an ordered rule list to its admitted and rejected packet
    /// sets. Subtracting the opposite set before adding a rule's packets
    /// is what enforces first-match semantics.
    fn fold(rules: &RuleList<'_>, dom: &Domains) -> (Bdd, Bdd) {
        let mut allowed = dom.mk_false();
        let mut denied = dom.mk_false();

        for rule in rules.iter() {
            if rule.status() != RuleStatus::Enabled {
                continue;
            }
            let predicate = rule.predicate().make_bdd(dom);
            match rule.action() {
                RuleAction::Allow => {
                    allowed = allowed.or(&predicate.and_not(&denied));
                }
                RuleAction::Deny => {
                    denied = denied.or(&predicate.and_not(&allowed));
                }
            }
        }

        (allowed, denied)
    }
}
