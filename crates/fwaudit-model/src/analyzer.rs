//! Structural queries over one ACL.
//!
//! The anomaly pass walks the ACL once, carrying the accept/deny/remaining
//! state, and classifies each rule against what the earlier rules already
//! decided. All set reasoning happens on compiled rule conditions, cached
//! per pass so no predicate is compiled twice.

use std::collections::HashMap;

use biodivine_lib_bdd::Bdd;
use tracing::debug;

use crate::address::Address;
use crate::anomaly::{AnomalyDetails, RuleAnomalies, RuleAnomaly};
use crate::domain::Domains;
use crate::engine::BddExt;
use crate::error::{ModelError, ModelResult};
use crate::group::Group;
use crate::predicate::Predicate;
use crate::rule::{Rule, RuleAction};
use crate::rulelist::RuleList;
use crate::state::State;

/// A pair of rules flagged by the symmetry check, in ACL order.
pub type RulePair<'a> = (&'a Rule, &'a Rule);

/// Cooperative cancellation query, polled at the top of each per-rule
/// iteration of a long pass.
pub type InterruptFn<'f> = &'f dyn Fn() -> bool;

/// Per-rule progress observer for the anomaly pass.
pub trait ProgressSink {
    fn tick(&self, processed: usize);
}

/// Compiled rule conditions of one analysis pass, keyed by rule id.
type BddCache = HashMap<u32, Bdd>;

pub struct Analyzer<'a> {
    acl: RuleList<'a>,
}

impl<'a> Analyzer<'a> {
    pub fn new(acl: RuleList<'a>) -> Self {
        Analyzer { acl }
    }

    pub fn acl(&self) -> &RuleList<'a> {
        &self.acl
    }

    /// Allow rules that open every service from anywhere to at least the
    /// given destinations.
    pub fn check_any(&self, dst_addresses: &Group<Address>, dom: &Domains) -> RuleList<'a> {
        let probe = dst_addresses.make_bdd(dom);
        self.acl.filter(|rule| {
            let predicate = rule.predicate();
            rule.action() == RuleAction::Allow
                && probe.is_subset(&predicate.dst_address_bdd(dom))
                && predicate.services().make_bdd(dom).is_true()
        })
    }

    /// Deny rules matching every packet.
    pub fn check_deny(&self, dom: &Domains) -> RuleList<'a> {
        let any = Predicate::any().make_bdd(dom);
        self.acl.filter(|rule| {
            rule.action() == RuleAction::Deny && rule.predicate().make_bdd(dom) == any
        })
    }

    /// All ordered pairs (i, j), i < j, of same-action rules whose
    /// conditions mirror each other.
    pub fn check_symmetry(
        &self,
        strict: bool,
        dom: &Domains,
        interrupt: InterruptFn<'_>,
    ) -> ModelResult<Vec<RulePair<'a>>> {
        let mut pairs = Vec::new();

        for (i, rule) in self.acl.iter().enumerate() {
            for other in self.acl.iter().skip(i + 1) {
                if interrupt() {
                    return Err(ModelError::Interrupted);
                }
                if rule.action() == other.action()
                    && rule
                        .predicate()
                        .is_symmetrical(other.predicate(), strict, dom)
                {
                    pairs.push((rule, other));
                }
            }
        }

        Ok(pairs)
    }

    /// The anomaly pass.
    pub fn check_anomaly(
        &self,
        dom: &Domains,
        interrupt: InterruptFn<'_>,
        progress: Option<&dyn ProgressSink>,
    ) -> ModelResult<RuleAnomalies<'a>> {
        let mut anomalies = RuleAnomalies::new();

        // The walk starts from the full packet space.
        let mut state = State::new(&Predicate::any(), dom);

        let mut cache = BddCache::with_capacity(self.acl.len());
        let mut processed = 0usize;

        for rule in self.acl.iter() {
            if interrupt() {
                return Err(ModelError::Interrupted);
            }

            cache.insert(rule.id(), rule.predicate().make_bdd(dom));

            // A trailing deny-all is the expected terminator, not a finding.
            let trailing_deny_all =
                rule.is_deny_all_bdd(&cache[&rule.id()]) && self.acl.is_last(rule);
            if !trailing_deny_all {
                if let Some(details) = self.classify(rule, &state, &cache) {
                    anomalies.push(RuleAnomaly { rule, details });
                }
            }

            state.update(rule.action(), &cache[&rule.id()]);

            processed += 1;
            if let Some(sink) = progress {
                sink.tick(processed);
            }
        }

        anomalies.missing_deny_all = !state.remaining().is_none();
        debug!(
            rules = self.acl.len(),
            findings = anomalies.len(),
            missing_deny_all = anomalies.missing_deny_all,
            "anomaly pass done"
        );

        Ok(anomalies)
    }

    fn classify(
        &self,
        rule: &'a Rule,
        state: &State,
        cache: &BddCache,
    ) -> Option<AnomalyDetails<'a>> {
        let predicate = &cache[&rule.id()];

        if predicate.is_subset(state.remaining()) {
            // The rule decides fresh packets only.
            return None;
        }

        if state.remaining().is_none() || predicate.is_disjoint(state.remaining()) {
            Some(self.classify_fully_masked(rule, state, cache))
        } else {
            self.classify_partially_masked(rule, state, cache)
        }
    }

    fn classify_fully_masked(
        &self,
        rule: &'a Rule,
        state: &State,
        cache: &BddCache,
    ) -> AnomalyDetails<'a> {
        let predicate = &cache[&rule.id()];

        if predicate.is_subset(state.processed(!rule.action())) {
            // Entirely decided the other way by earlier rules.
            return AnomalyDetails::Shadowed {
                shadowing: self.find_overlapping(rule, !rule.action(), cache),
            };
        }

        if predicate.is_disjoint(state.processed(!rule.action())) {
            // Entirely decided the same way by earlier rules.
            return AnomalyDetails::FullRedundant {
                redundant: self.find_overlapping(rule, rule.action(), cache),
            };
        }

        // Mixed cover: part of the packets went the same way, part the
        // other way.
        AnomalyDetails::RedundantOrCorrelated {
            redundant: self.find_overlapping(rule, rule.action(), cache),
            correlated: self.find_overlapping(rule, !rule.action(), cache),
        }
    }

    fn classify_partially_masked(
        &self,
        rule: &'a Rule,
        state: &State,
        cache: &BddCache,
    ) -> Option<AnomalyDetails<'a>> {
        let predicate = &cache[&rule.id()];

        let generalized = self.find_other_is_subset(rule, !rule.action(), cache);
        if !generalized.is_empty() {
            return Some(AnomalyDetails::Generalization { generalized });
        }

        if predicate.overlaps(state.processed(rule.action())) {
            let redundant = self.find_other_is_subset(rule, rule.action(), cache);
            if !redundant.is_empty() {
                return Some(AnomalyDetails::PartialRedundant { redundant });
            }
        }

        if predicate.overlaps(state.processed(!rule.action())) {
            let correlated = self.find_overlapping(rule, !rule.action(), cache);
            if !correlated.is_empty() {
                return Some(AnomalyDetails::Correlated { correlated });
            }
        }

        None
    }

    /// Earlier rules with the given action whose condition contains the
    /// rule's condition.
    #[allow(dead_code)]
    fn find_is_subset(&self, rule: &Rule, action: RuleAction, cache: &BddCache) -> RuleList<'a> {
        let predicate = &cache[&rule.id()];
        self.acl.filter_before(rule, |other| {
            other.action() == action && predicate.is_subset(&cache[&other.id()])
        })
    }

    /// Earlier rules with the given action contained in the rule's
    /// condition.
    fn find_other_is_subset(
        &self,
        rule: &Rule,
        action: RuleAction,
        cache: &BddCache,
    ) -> RuleList<'a> {
        let predicate = &cache[&rule.id()];
        self.acl.filter_before(rule, |other| {
            other.action() == action && cache[&other.id()].is_subset(predicate)
        })
    }

    /// Earlier rules with the given action intersecting the rule's
    /// condition.
    fn find_overlapping(
        &self,
        rule: &Rule,
        action: RuleAction,
        cache: &BddCache,
    ) -> RuleList<'a> {
        let predicate = &cache[&rule.id()];
        self.acl.filter_before(rule, |other| {
            other.action() == action && predicate.overlaps(&cache[&other.id()])
        })
    }
}
