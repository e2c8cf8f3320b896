//! Thin binding over the BDD engine.
//!
//! The engine gives us canonical reduced ordered BDDs with the usual logical
//! operations. What it does not ship is bit-vector arithmetic: the packet
//! model needs `var == k` and `lb <= var <= ub` conditions over a block of
//! boolean variables that together encode one packet field. Those
//! comparisons are built here, bit by bit, and everything above this module
//! only ever sees a [`Bdd`].

use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet};
use serde::Serialize;

/// Relation between the packet sets denoted by two BDDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRelation {
    Equal,
    Subset,
    Superset,
    Disjoint,
    Overlap,
}

impl NodeRelation {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRelation::Equal => "equal",
            NodeRelation::Subset => "subset",
            NodeRelation::Superset => "superset",
            NodeRelation::Disjoint => "disjoint",
            NodeRelation::Overlap => "overlap",
        }
    }
}

impl std::fmt::Display for NodeRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set-theoretic helpers on raw BDDs.
///
/// `is_subset` follows the classical encoding: `a` is a subset of `b` iff
/// the implication `a -> b` is a tautology.
pub trait BddExt {
    fn is_any(&self) -> bool;
    fn is_none(&self) -> bool;
    fn is_subset(&self, other: &Bdd) -> bool;
    fn is_superset(&self, other: &Bdd) -> bool;
    fn is_disjoint(&self, other: &Bdd) -> bool;
    fn overlaps(&self, other: &Bdd) -> bool;
    fn negate_if(&self, condition: bool) -> Bdd;
    fn relation(&self, other: &Bdd) -> NodeRelation;
}

impl BddExt for Bdd {
    fn is_any(&self) -> bool {
        self.is_true()
    }

    fn is_none(&self) -> bool {
        self.is_false()
    }

    fn is_subset(&self, other: &Bdd) -> bool {
        self == other || self.imp(other).is_true()
    }

    fn is_superset(&self, other: &Bdd) -> bool {
        other.is_subset(self)
    }

    fn is_disjoint(&self, other: &Bdd) -> bool {
        self.and(other).is_false()
    }

    fn overlaps(&self, other: &Bdd) -> bool {
        !self.is_disjoint(other)
    }

    fn negate_if(&self, condition: bool) -> Bdd {
        if condition {
            self.not()
        } else {
            self.clone()
        }
    }

    fn relation(&self, other: &Bdd) -> NodeRelation {
        if self == other {
            NodeRelation::Equal
        } else if self.imp(other).is_true() {
            NodeRelation::Subset
        } else if other.imp(self).is_true() {
            NodeRelation::Superset
        } else if self.and(other).is_false() {
            NodeRelation::Disjoint
        } else {
            NodeRelation::Overlap
        }
    }
}

/// `block[0]` is the most significant bit of the encoded field.
///
/// The recurrences below walk from the least significant bit up, so each
/// call is linear in the block width and the produced BDD respects the
/// engine's fixed variable order.
pub fn eq_const(set: &BddVariableSet, block: &[BddVariable], value: u128) -> Bdd {
    let mut cond = set.mk_true();
    for (i, var) in block.iter().rev().enumerate() {
        let bit = (value >> i) & 1 == 1;
        cond = cond.and(&set.mk_literal(*var, bit));
    }
    cond
}

/// Condition `field <= value`.
pub fn lte_const(set: &BddVariableSet, block: &[BddVariable], value: u128) -> Bdd {
    // le(i) == "bits [0..i] of the field are <= bits [0..i] of value"
    let mut le = set.mk_true();
    for (i, var) in block.iter().rev().enumerate() {
        let x = set.mk_var(*var);
        le = if (value >> i) & 1 == 1 {
            x.not().or(&le)
        } else {
            x.not().and(&le)
        };
    }
    le
}

/// Condition `field >= value`.
pub fn gte_const(set: &BddVariableSet, block: &[BddVariable], value: u128) -> Bdd {
    let mut ge = set.mk_true();
    for (i, var) in block.iter().rev().enumerate() {
        let x = set.mk_var(*var);
        ge = if (value >> i) & 1 == 1 {
            x.and(&ge)
        } else {
            x.or(&ge)
        };
    }
    ge
}

/// Condition `lb <= field <= ub`.
pub fn between_const(set: &BddVariableSet, block: &[BddVariable], lb: u128, ub: u128) -> Bdd {
    gte_const(set, block, lb).and(&lte_const(set, block, ub))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(bits: u16) -> (BddVariableSet, Vec<BddVariable>) {
        let set = BddVariableSet::new_anonymous(bits);
        let vars = set.variables();
        (set, vars)
    }

    /// Evaluates `bdd` on the valuation that encodes `value` in `block`.
    fn accepts(set: &BddVariableSet, bdd: &Bdd, block: &[BddVariable], value: u128) -> bool {
        let mut point = bdd.clone();
        for (i, var) in block.iter().rev().enumerate() {
            let bit = (value >> i) & 1 == 1;
            point = point.and(&set.mk_literal(*var, bit));
        }
        !point.is_false()
    }

    #[test]
    fn eq_accepts_exactly_one_value() {
        let (set, vars) = space(8);
        let bdd = eq_const(&set, &vars, 42);
        for v in 0..=255u128 {
            assert_eq!(accepts(&set, &bdd, &vars, v), v == 42, "value {v}");
        }
    }

    #[test]
    fn between_matches_interval_semantics() {
        let (set, vars) = space(6);
        let bdd = between_const(&set, &vars, 10, 49);
        for v in 0..64u128 {
            assert_eq!(accepts(&set, &bdd, &vars, v), (10..=49).contains(&v), "value {v}");
        }
    }

    #[test]
    fn full_span_is_tautology() {
        let (set, vars) = space(5);
        assert!(between_const(&set, &vars, 0, 31).is_true());
    }

    #[test]
    fn relation_five_cases() {
        let (set, vars) = space(8);
        let small = between_const(&set, &vars, 10, 20);
        let big = between_const(&set, &vars, 0, 100);
        let apart = between_const(&set, &vars, 200, 210);
        let crossing = between_const(&set, &vars, 15, 30);

        assert_eq!(small.relation(&small.clone()), NodeRelation::Equal);
        assert_eq!(small.relation(&big), NodeRelation::Subset);
        assert_eq!(big.relation(&small), NodeRelation::Superset);
        assert_eq!(small.relation(&apart), NodeRelation::Disjoint);
        assert_eq!(small.relation(&crossing), NodeRelation::Overlap);
    }

    #[test]
    fn negate_if_flips_only_on_request() {
        let (set, vars) = space(4);
        let bdd = eq_const(&set, &vars, 3);
        assert_eq!(bdd.negate_if(false), bdd);
        assert_eq!(bdd.negate_if(true), bdd.not());
    }
}
