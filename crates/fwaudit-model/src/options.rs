//! Modeling toggles and per-call BDD scope selection.

use serde::{Deserialize, Serialize};

/// Which optional packet dimensions the model compiles.
///
/// An atom whose dimension is switched off compiles to `bdd_true`, so the
/// same predicate yields a different condition under a different option
/// set. Toggling an option therefore changes the outcome of the next
/// analysis without rebuilding any object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    #[serde(default)]
    pub applications: bool,

    #[serde(default)]
    pub users: bool,

    #[serde(default)]
    pub urls: bool,
}

impl ModelOptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        ModelOptions {
            applications: true,
            users: true,
            urls: true,
        }
    }
}

/// Live modeling options shared between the object catalogs and the atoms
/// they hand out.
///
/// Atoms keep a handle to this cell rather than a snapshot, so flipping an
/// option changes how every already-built predicate compiles on the next
/// analysis pass.
#[derive(Debug, Default)]
pub struct OptionsCell {
    applications: std::sync::atomic::AtomicBool,
    users: std::sync::atomic::AtomicBool,
    urls: std::sync::atomic::AtomicBool,
}

/// Shared handle to the live option set.
pub type SharedOptions = std::sync::Arc<OptionsCell>;

impl OptionsCell {
    pub fn new(options: ModelOptions) -> SharedOptions {
        let cell = OptionsCell::default();
        cell.set(options);
        std::sync::Arc::new(cell)
    }

    /// A detached, all-off option set for atoms built outside a catalog.
    pub fn empty() -> SharedOptions {
        std::sync::Arc::new(OptionsCell::default())
    }

    pub fn get(&self) -> ModelOptions {
        use std::sync::atomic::Ordering::Relaxed;
        ModelOptions {
            applications: self.applications.load(Relaxed),
            users: self.users.load(Relaxed),
            urls: self.urls.load(Relaxed),
        }
    }

    pub fn set(&self, options: ModelOptions) {
        use std::sync::atomic::Ordering::Relaxed;
        self.applications.store(options.applications, Relaxed);
        self.users.store(options.users, Relaxed);
        self.urls.store(options.urls, Relaxed);
    }

    pub fn set_applications(&self, enabled: bool) {
        self.applications
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn set_users(&self, enabled: bool) {
        self.users
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn set_urls(&self, enabled: bool) {
        self.urls
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Selects the predicate factors included in an option-gated compilation.
///
/// Used by the symmetry check and the packet tester, which only want the
/// dimensions the caller actually supplied. Addresses and services are
/// always included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BddScope {
    pub source_zone: bool,
    pub destination_zone: bool,
    pub application: bool,
    pub user: bool,
    pub url: bool,
}

impl BddScope {
    pub fn full() -> Self {
        BddScope {
            source_zone: true,
            destination_zone: true,
            application: true,
            user: true,
            url: true,
        }
    }
}
