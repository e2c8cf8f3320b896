//! Security zones.

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{Domains, Side};
use crate::mvalue::Mvalue;
use crate::range::Range;

/// A named zone, encoded as an id interval in the source or destination
/// zone domain. Ids are allocated by the network registry; the `any`
/// sentinel spans the whole domain.
#[derive(Debug, Clone)]
pub struct Zone {
    name: String,
    side: Side,
    value: Mvalue,
    any: bool,
}

impl Zone {
    pub fn new(name: impl Into<String>, side: Side, lower: u16, upper: u16) -> Self {
        let domain = side.zone_domain();
        Zone {
            name: name.into(),
            side,
            value: Mvalue::new(
                domain,
                Range::new(domain.width(), lower as u128, upper as u128),
            ),
            any: false,
        }
    }

    pub fn with_id(name: impl Into<String>, side: Side, id: u16) -> Self {
        Self::new(name, side, id, id)
    }

    pub fn any(side: Side) -> Self {
        Zone {
            name: "any".to_string(),
            side,
            value: Mvalue::spanning(side.zone_domain()),
            any: true,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn range(&self) -> &Range {
        self.value.range()
    }
}

impl Atom for Zone {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any {
            return dom.mk_true();
        }
        self.value.make_bdd(dom)
    }

    fn value_text(&self) -> String {
        if self.any {
            "any".to_string()
        } else {
            self.value.to_string()
        }
    }

    fn is_any(&self) -> bool {
        self.any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BddExt;

    #[test]
    fn any_zone_is_unconstrained() {
        let dom = Domains::new();
        assert!(Zone::any(Side::Src).make_bdd(&dom).is_true());
    }

    #[test]
    fn src_and_dst_zone_with_same_id_differ() {
        let dom = Domains::new();
        let src = Zone::with_id("dmz", Side::Src, 3);
        let dst = Zone::with_id("dmz", Side::Dst, 3);
        assert!(!src.make_bdd(&dom).is_subset(&dst.make_bdd(&dom)));
    }
}
