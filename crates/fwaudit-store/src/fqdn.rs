//! Fully-qualified-domain-name resolution with a persisted cache.
//!
//! The cache file is a small TOML table mapping names to the IP literals
//! they resolved to. With resolution enabled a cache miss falls back to
//! the system resolver and the answer is written back on `save`, so
//! repeated analyses of the same policy stay offline.

use std::collections::BTreeMap;
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FqdnConfig;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Deserialize, Default)]
struct CacheFile {
    #[serde(default)]
    hosts: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct FqdnResolver {
    enable: bool,
    cache_path: Option<PathBuf>,
    cache: BTreeMap<String, Vec<String>>,
    dirty: bool,
}

/// Shape test for tokens worth resolving: dotted labels, at least one
/// alphabetic character, no scheme or path.
pub fn looks_like_fqdn(token: &str) -> bool {
    token.contains('.')
        && !token.contains('/')
        && !token.contains(':')
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

impl FqdnResolver {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FqdnConfig) -> StoreResult<Self> {
        let mut resolver = FqdnResolver {
            enable: config.enable,
            ..Self::default()
        };
        if !config.cache_file.is_empty() {
            let path = PathBuf::from(&config.cache_file);
            if path.exists() {
                let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let file: CacheFile = toml::from_str(&text)?;
                resolver.cache = file.hosts;
                debug!(entries = resolver.cache.len(), "fqdn cache loaded");
            }
            resolver.cache_path = Some(path);
        }
        Ok(resolver)
    }

    /// The IP literals for a name, from the cache or the system resolver.
    /// Returns nothing when resolution is off or the token is not an
    /// fqdn.
    pub fn resolve(&mut self, token: &str) -> Option<Vec<String>> {
        if !self.enable || !looks_like_fqdn(token) {
            return None;
        }
        if let Some(hit) = self.cache.get(token) {
            return Some(hit.clone());
        }

        let addresses: Vec<String> = match (token, 0u16).to_socket_addrs() {
            Ok(resolved) => resolved.map(|sa| sa.ip().to_string()).collect(),
            Err(err) => {
                warn!(host = token, error = %err, "fqdn resolution failed");
                return None;
            }
        };
        if addresses.is_empty() {
            return None;
        }

        self.cache.insert(token.to_string(), addresses.clone());
        self.dirty = true;
        Some(addresses)
    }

    /// Writes freshly resolved names back to the cache file.
    pub fn save(&mut self) -> StoreResult<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let mut text = String::from("[hosts]\n");
        for (host, addresses) in &self.cache {
            let quoted: Vec<String> = addresses.iter().map(|a| format!("\"{a}\"")).collect();
            text.push_str(&format!("\"{}\" = [{}]\n", host, quoted.join(", ")));
        }
        write_file(path, &text)?;
        self.dirty = false;
        Ok(())
    }
}

fn write_file(path: &Path, text: &str) -> StoreResult<()> {
    std::fs::write(path, text).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_shape_test() {
        assert!(looks_like_fqdn("www.example.com"));
        assert!(looks_like_fqdn("host-1.internal.lan"));
        assert!(!looks_like_fqdn("10.0.0.1"));
        assert!(!looks_like_fqdn("10.0.0.0/8"));
        assert!(!looks_like_fqdn("::1"));
        assert!(!looks_like_fqdn("plainname"));
    }

    #[test]
    fn disabled_resolver_answers_nothing() {
        let mut resolver = FqdnResolver::disabled();
        assert!(resolver.resolve("www.example.com").is_none());
    }

    #[test]
    fn cache_hits_bypass_the_system_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("fqdn.toml");
        std::fs::write(
            &cache,
            "[hosts]\n\"www.example.com\" = [\"10.9.9.9\"]\n",
        )
        .unwrap();

        let config = FqdnConfig {
            enable: true,
            cache_file: cache.display().to_string(),
        };
        let mut resolver = FqdnResolver::from_config(&config).unwrap();
        assert_eq!(
            resolver.resolve("www.example.com"),
            Some(vec!["10.9.9.9".to_string()])
        );
    }
}
