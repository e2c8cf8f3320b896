//! A value set of one packet field: a (domain, range) pair.

use biodivine_lib_bdd::Bdd;

use crate::domain::{DomainKind, Domains};
use crate::engine;
use crate::range::Range;

/// An inclusive range of values attached to the domain it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mvalue {
    domain: DomainKind,
    range: Range,
}

impl Mvalue {
    pub fn new(domain: DomainKind, range: Range) -> Self {
        assert_eq!(range.width(), domain.width());
        Mvalue { domain, range }
    }

    pub fn singleton(domain: DomainKind, value: u128) -> Self {
        Self::new(domain, Range::singleton(domain.width(), value))
    }

    /// The value spanning the whole domain.
    pub fn spanning(domain: DomainKind) -> Self {
        let range = crate::range::Range::with_style(
            domain.width(),
            0,
            domain.max(),
            domain.range_style(),
        );
        Self::new(domain, range)
    }

    pub fn domain(&self) -> DomainKind {
        self.domain
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    /// True when the range spans the whole domain; such a value compiles
    /// straight to `bdd_true`.
    pub fn is_full(&self) -> bool {
        self.range.is_full()
    }

    pub fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.range.is_full() {
            return dom.mk_true();
        }

        let block = dom.block(self.domain);
        if self.range.is_singleton() {
            engine::eq_const(dom.var_set(), block, self.range.lb())
        } else {
            engine::between_const(dom.var_set(), block, self.range.lb(), self.range.ub())
        }
    }
}

impl std::fmt::Display for Mvalue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_compiles_to_true() {
        let dom = Domains::new();
        let value = Mvalue::spanning(DomainKind::Protocol);
        assert!(value.make_bdd(&dom).is_true());
    }

    #[test]
    fn singleton_and_interval_are_distinct_conditions() {
        let dom = Domains::new();
        let one = Mvalue::singleton(DomainKind::DstTcpPort, 80);
        let span = Mvalue::new(DomainKind::DstTcpPort, Range::new(16, 80, 443));
        let one_bdd = one.make_bdd(&dom);
        let span_bdd = span.make_bdd(&dom);
        assert!(!one_bdd.is_true());
        assert!(one_bdd.imp(&span_bdd).is_true());
        assert_ne!(one_bdd, span_bdd);
    }
}
