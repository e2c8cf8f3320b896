//! The behavior every named model atom shares.

use biodivine_lib_bdd::Bdd;

use crate::domain::Domains;

/// A named, typed wrapper around one value set of the packet space.
///
/// `is_any` is the cheap sentinel test: it is true only for atoms built by
/// the `any()` constructors, whose condition is the whole domain. The
/// semantic test (does the compiled condition happen to cover everything)
/// goes through [`crate::engine::BddExt::is_any`] on the compiled BDD.
pub trait Atom {
    /// Case-preserving object name; comparisons are case-insensitive.
    fn name(&self) -> &str;

    /// Compiles the atom into its packet-space condition.
    fn make_bdd(&self, dom: &Domains) -> Bdd;

    /// Printable value form (the name is printed separately).
    fn value_text(&self) -> String;

    /// True for the `any` sentinel.
    fn is_any(&self) -> bool;
}

/// Case-insensitive name ordering used wherever object lists are sorted.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
}

pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
