//! The incremental accept/deny/remaining state of an ACL walk.

use biodivine_lib_bdd::Bdd;

use crate::domain::Domains;
use crate::predicate::Predicate;
use crate::rule::RuleAction;

/// The quadruple (I, A, D, R).
///
/// `I` is the input condition the walk starts from, `A` and `D` the
/// packets already accepted or denied by earlier rules, and
/// `R = I ∧ ¬(A ∨ D)` the packets still undecided. After every update the
/// three parts stay pairwise disjoint, cover `I` exactly, and `R` never
/// grows.
#[derive(Debug, Clone)]
pub struct State {
    input: Bdd,
    accepted: Bdd,
    denied: Bdd,
    remaining: Bdd,
}

impl State {
    pub fn new(input: &Predicate, dom: &Domains) -> Self {
        let input = input.make_bdd(dom);
        State {
            remaining: input.clone(),
            accepted: dom.mk_false(),
            denied: dom.mk_false(),
            input,
        }
    }

    /// Folds one rule into the state: the packets the rule newly decides
    /// are exactly those it matches among the remaining ones.
    pub fn update(&mut self, action: RuleAction, predicate: &Bdd) {
        let decided = self.remaining.and(predicate);
        match action {
            RuleAction::Allow => self.accepted = self.accepted.or(&decided),
            RuleAction::Deny => self.denied = self.denied.or(&decided),
        }
        self.remaining = self
            .input
            .and(&self.accepted.or(&self.denied).not());
    }

    pub fn input(&self) -> &Bdd {
        &self.input
    }

    pub fn accepted(&self) -> &Bdd {
        &self.accepted
    }

    pub fn denied(&self) -> &Bdd {
        &self.denied
    }

    pub fn remaining(&self) -> &Bdd {
        &self.remaining
    }

    /// The packets already decided with the given action.
    pub fn processed(&self, action: RuleAction) -> &Bdd {
        match action {
            RuleAction::Allow => &self.accepted,
            RuleAction::Deny => &self.denied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::engine::BddExt;
    use crate::predicate::{Destinations, Predicate, Sources};
    use crate::service::Service;
    use crate::zone::Zone;
    use crate::address::Address;
    use crate::application::Application;
    use crate::group::Group;
    use crate::options::OptionsCell;
    use crate::url::Url;
    use crate::user::User;
    use std::sync::Arc;

    fn pred(src: &str, svc: &str) -> Predicate {
        Predicate::new(
            Sources {
                zones: Group::with_item("", Arc::new(Zone::any(Side::Src))),
                addresses: Group::with_item(
                    "",
                    Arc::new(Address::parse("", Side::Src, src, false).unwrap()),
                ),
                negate: false,
            },
            Destinations {
                zones: Group::with_item("", Arc::new(Zone::any(Side::Dst))),
                addresses: Group::with_item("", Arc::new(Address::any(Side::Dst))),
                negate: false,
            },
            Group::with_item("", Arc::new(Service::parse("", svc).unwrap())),
            false,
            Group::with_item("", Arc::new(Application::any())),
            Group::with_item("", Arc::new(User::any())),
            Group::with_item("", Arc::new(Url::any())),
            OptionsCell::empty(),
        )
    }

    fn check_invariants(state: &State, dom: &Domains) {
        assert!(state.accepted().is_disjoint(state.denied()));
        let union = state
            .accepted()
            .or(state.denied())
            .or(state.remaining());
        assert_eq!(&union, state.input());
        let _ = dom;
    }

    #[test]
    fn updates_preserve_the_state_invariants() {
        let dom = Domains::new();
        let mut state = State::new(&Predicate::any(), &dom);
        assert!(state.accepted().is_false());
        assert!(state.denied().is_false());
        assert!(state.remaining().is_true());

        let mut previous_remaining = state.remaining().clone();
        let steps = [
            (RuleAction::Allow, pred("10.0.0.0/8", "tcp/80")),
            (RuleAction::Deny, pred("10.1.0.0/16", "any")),
            (RuleAction::Allow, pred("any", "udp/53")),
        ];
        for (action, predicate) in steps {
            state.update(action, &predicate.make_bdd(&dom));
            check_invariants(&state, &dom);
            assert!(state.remaining().is_subset(&previous_remaining));
            previous_remaining = state.remaining().clone();
        }
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let dom = Domains::new();
        let mut state = State::new(&Predicate::any(), &dom);

        let allow = pred("10.0.0.0/8", "any").make_bdd(&dom);
        let deny = pred("10.0.0.0/8", "tcp/80").make_bdd(&dom);

        state.update(RuleAction::Allow, &allow);
        state.update(RuleAction::Deny, &deny);

        // The deny arrived second: everything it would decide was already
        // accepted, so the denied set stays empty.
        assert!(state.denied().is_false());
        assert_eq!(state.processed(RuleAction::Allow), &allow);
    }
}
