//! Hierarchical groups of atoms.
//!
//! A group member is either a leaf atom or another group. Atoms are shared
//! immutable handles; the catalogs keep the owning side. Insertion is
//! idempotent, traversal is depth first, and a group can never be made to
//! contain itself: every group carries a process-unique id and adding a
//! sub-group that transitively holds the receiver's id is rejected.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::Domains;
use crate::engine::BddExt;
use crate::error::{ModelError, ModelResult};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

fn next_group_id() -> u64 {
    NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub enum Member<T> {
    Item(Arc<T>),
    Group(Arc<Group<T>>),
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        match self {
            Member::Item(item) => Member::Item(Arc::clone(item)),
            Member::Group(group) => Member::Group(Arc::clone(group)),
        }
    }
}

#[derive(Debug)]
pub struct Group<T> {
    id: u64,
    name: String,
    members: Vec<Member<T>>,
    // Direct-member identity sets backing the idempotent insert.
    item_keys: HashSet<usize>,
    group_keys: HashSet<u64>,
}

impl<T> Clone for Group<T> {
    /// A clone is a new group (fresh id) sharing the same members.
    fn clone(&self) -> Self {
        Group {
            id: next_group_id(),
            name: self.name.clone(),
            members: self.members.clone(),
            item_keys: self.item_keys.clone(),
            group_keys: self.group_keys.clone(),
        }
    }
}

impl<T: Atom> Group<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Group {
            id: next_group_id(),
            name: name.into(),
            members: Vec::new(),
            item_keys: HashSet::new(),
            group_keys: HashSet::new(),
        }
    }

    pub fn with_item(name: impl Into<String>, item: Arc<T>) -> Self {
        let mut group = Self::new(name);
        group.add_item(item);
        group
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a leaf atom; duplicates are ignored.
    pub fn add_item(&mut self, item: Arc<T>) {
        let key = Arc::as_ptr(&item) as usize;
        if self.item_keys.insert(key) {
            self.members.push(Member::Item(item));
        }
    }

    /// Adds a sub-group; duplicates are ignored and cycles are rejected.
    pub fn add_group(&mut self, group: Arc<Group<T>>) -> ModelResult<()> {
        if group.id == self.id || group.contains_group_id(self.id) {
            return Err(ModelError::CycleInGroup {
                name: group.name.clone(),
            });
        }
        if self.group_keys.insert(group.id) {
            self.members.push(Member::Group(group));
        }
        Ok(())
    }

    fn contains_group_id(&self, id: u64) -> bool {
        if self.group_keys.contains(&id) {
            return true;
        }
        self.members.iter().any(|member| match member {
            Member::Group(group) => group.contains_group_id(id),
            Member::Item(_) => false,
        })
    }

    /// True if the atom is reachable from this group.
    pub fn contains(&self, item: &Arc<T>) -> bool {
        let key = Arc::as_ptr(item) as usize;
        if self.item_keys.contains(&key) {
            return true;
        }
        self.members.iter().any(|member| match member {
            Member::Group(group) => group.contains(item),
            Member::Item(_) => false,
        })
    }

    /// Depth-first visit of every leaf atom, duplicates included.
    pub fn for_each(&self, visit: &mut dyn FnMut(&Arc<T>)) {
        for member in &self.members {
            match member {
                Member::Item(item) => visit(item),
                Member::Group(group) => group.for_each(visit),
            }
        }
    }

    /// All unique leaf atoms, in depth-first insertion order.
    pub fn items(&self) -> Vec<Arc<T>> {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        self.for_each(&mut |item| {
            if seen.insert(Arc::as_ptr(item) as usize) {
                items.push(Arc::clone(item));
            }
        });
        items
    }

    /// Names of the direct members.
    pub fn names(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|member| match member {
                Member::Item(item) => item.name().to_string(),
                Member::Group(group) => group.name.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.iter().all(|member| match member {
            Member::Item(_) => false,
            Member::Group(group) => group.is_empty(),
        })
    }

    /// Number of leaf atoms, duplicates included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(&mut |_| count += 1);
        count
    }

    /// True when some member is the `any` sentinel.
    pub fn has_any(&self) -> bool {
        self.members.iter().any(|member| match member {
            Member::Item(item) => item.is_any(),
            Member::Group(group) => group.has_any(),
        })
    }

    /// Disjunction of the member conditions.
    pub fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.has_any() {
            return dom.mk_true();
        }

        let mut condition = dom.mk_false();
        for member in &self.members {
            let bdd = match member {
                Member::Item(item) => item.make_bdd(dom),
                Member::Group(group) => group.make_bdd(dom),
            };
            condition = condition.or(&bdd);
        }
        condition
    }

    pub fn is_subset(&self, other: &Group<T>, dom: &Domains) -> bool {
        self.make_bdd(dom).is_subset(&other.make_bdd(dom))
    }

    pub fn equal(&self, other: &Group<T>, dom: &Domains) -> bool {
        self.make_bdd(dom) == other.make_bdd(dom)
    }

    /// Member names, comma separated.
    pub fn to_text(&self) -> String {
        self.names().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::zone::Zone;

    fn zone(id: u16) -> Arc<Zone> {
        Arc::new(Zone::with_id(format!("z{id}"), Side::Src, id))
    }

    #[test]
    fn duplicate_insertion_is_idempotent() {
        let z = zone(1);
        let mut group = Group::new("g");
        group.add_item(Arc::clone(&z));
        group.add_item(Arc::clone(&z));
        assert_eq!(group.items().len(), 1);
    }

    #[test]
    fn items_flatten_nested_groups_without_duplicates() {
        let shared = zone(7);
        let mut inner = Group::new("inner");
        inner.add_item(Arc::clone(&shared));
        inner.add_item(zone(8));

        let mut outer = Group::new("outer");
        outer.add_item(Arc::clone(&shared));
        outer.add_group(Arc::new(inner)).unwrap();

        let items = outer.items();
        assert_eq!(items.len(), 2);
        assert!(outer.contains(&shared));
    }

    #[test]
    fn group_bdd_is_the_member_disjunction() {
        let dom = Domains::new();
        let a = zone(1);
        let b = zone(2);
        let mut group = Group::new("g");
        group.add_item(Arc::clone(&a));
        group.add_item(Arc::clone(&b));

        let expected = a.make_bdd(&dom).or(&b.make_bdd(&dom));
        assert_eq!(group.make_bdd(&dom), expected);
    }

    #[test]
    fn any_member_short_circuits_to_true() {
        let dom = Domains::new();
        let mut group = Group::new("g");
        group.add_item(zone(1));
        group.add_item(Arc::new(Zone::any(Side::Src)));
        assert!(group.make_bdd(&dom).is_true());
    }

    #[test]
    fn nested_group_ids_are_visible_to_the_cycle_check() {
        let mut inner = Group::<Zone>::new("inner");
        inner.add_item(zone(1));
        let inner = Arc::new(inner);
        let inner_id = inner.id();

        let mut outer = Group::new("outer");
        outer.add_group(Arc::clone(&inner)).unwrap();
        let outer = Arc::new(outer);

        let mut top = Group::new("top");
        top.add_group(Arc::clone(&outer)).unwrap();
        assert!(top.contains_group_id(inner_id));
        assert!(!inner.contains_group_id(top.id()));
    }

    #[test]
    fn empty_group_has_empty_condition() {
        let dom = Domains::new();
        let group = Group::<Zone>::new("empty");
        assert!(group.is_empty());
        assert!(group.make_bdd(&dom).is_false());
    }
}
