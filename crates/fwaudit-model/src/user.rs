//! User atoms.

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{DomainKind, Domains};
use crate::mvalue::Mvalue;
use crate::options::SharedOptions;

/// A named user, a singleton id in the user domain. Compiles to no
/// constraint while user modeling is off.
#[derive(Debug, Clone)]
pub struct User {
    name: String,
    value: Mvalue,
    options: SharedOptions,
    any: bool,
}

impl User {
    pub fn new(name: impl Into<String>, user_id: u16, options: SharedOptions) -> Self {
        User {
            name: name.into(),
            value: Mvalue::singleton(DomainKind::User, user_id as u128),
            options,
            any: false,
        }
    }

    pub fn any() -> Self {
        User {
            name: "any".to_string(),
            value: Mvalue::spanning(DomainKind::User),
            options: crate::options::OptionsCell::empty(),
            any: true,
        }
    }

    pub fn id(&self) -> u16 {
        self.value.range().lb() as u16
    }
}

impl Atom for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any || !self.options.get().users {
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
