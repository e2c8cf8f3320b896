//! Case-insensitive object dictionaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

/// A name-keyed dictionary owning its objects through shared handles.
/// Lookups are case-insensitive; the first spelling wins and duplicates
/// are rejected.
#[derive(Debug)]
pub struct Catalog<T> {
    items: BTreeMap<String, Arc<T>>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Catalog {
            items: BTreeMap::new(),
        }
    }
}

impl<T> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.items.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(&name.to_ascii_lowercase())
    }

    pub fn insert(&mut self, name: &str, item: Arc<T>) -> StoreResult<Arc<T>> {
        let key = name.to_ascii_lowercase();
        if self.items.contains_key(&key) {
            return Err(StoreError::DuplicateObject {
                name: name.to_string(),
            });
        }
        self.items.insert(key, Arc::clone(&item));
        Ok(item)
    }

    /// Fetches the object or inserts the one built by `make`.
    pub fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> Arc<T>) -> Arc<T> {
        self.items
            .entry(name.to_ascii_lowercase())
            .or_insert_with(make)
            .clone()
    }

    /// All objects, ordered by their lowercased name.
    pub fn items(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        let mut catalog = Catalog::new();
        catalog.insert("Web-Servers", Arc::new(1u32)).unwrap();
        assert!(catalog.get("web-servers").is_some());
        assert!(catalog.get("WEB-SERVERS").is_some());
        assert!(catalog.get("other").is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut catalog = Catalog::new();
        catalog.insert("dns", Arc::new(1u32)).unwrap();
        assert!(matches!(
            catalog.insert("DNS", Arc::new(2u32)),
            Err(StoreError::DuplicateObject { .. })
        ));
    }
}
