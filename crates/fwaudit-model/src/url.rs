//! URL atoms.

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{DomainKind, Domains};
use crate::mvalue::Mvalue;
use crate::options::SharedOptions;

/// A URL category entry, a singleton id in the URL domain. Compiles to no
/// constraint while URL modeling is off.
#[derive(Debug, Clone)]
pub struct Url {
    name: String,
    value: Mvalue,
    options: SharedOptions,
    any: bool,
}

impl Url {
    pub fn new(name: impl Into<String>, url_id: u16, options: SharedOptions) -> Self {
        Url {
            name: name.into(),
            value: Mvalue::singleton(DomainKind::Url, url_id as u128),
            options,
            any: false,
        }
    }

    pub fn any() -> Self {
        Url {
            name: "any".to_string(),
            value: Mvalue::spanning(DomainKind::Url),
            options: crate::options::OptionsCell::empty(),
            any: true,
        }
    }

    pub fn id(&self) -> u16 {
        self.value.range().lb() as u16
    }
}

/// A loose shape check for URL tokens: something with a dot-separated host
/// part and no spaces. The catalogs use it to tell URL entries from stray
/// object names.
pub fn is_url(text: &str) -> bool {
    let host = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"))
        .unwrap_or(text);
    let host = host.split('/').next().unwrap_or("");
    !host.is_empty()
        && host.contains('.')
        && !host.contains(char::is_whitespace)
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '*')
}

impl Atom for Url {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any || !self.options.get().urls {
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

    #[test]
    fn url_shape_check() {
        assert!(is_url("www.example.com"));
        assert!(is_url("https://docs.example.com/path"));
        assert!(is_url("*.example.com"));
        assert!(!is_url("intranet"));
        assert!(!is_url("bad host.com"));
    }
}
