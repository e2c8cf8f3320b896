//! TOML configuration: runtime settings and object definitions.

use std::path::Path;

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

fn default_node_size() -> usize {
    1_000_000
}

fn default_cache_size() -> usize {
    100_000
}

fn default_list_delimiter() -> char {
    ';'
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggerConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub filename: String,
}

/// Sizing hints for the BDD engine node and operation caches.
#[derive(Debug, Clone, Deserialize)]
pub struct BddConfig {
    #[serde(default = "default_node_size")]
    pub node_size: usize,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        BddConfig {
            node_size: default_node_size(),
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Separator between the values of one compound CSV field.
    #[serde(default = "default_list_delimiter")]
    pub list_delimiter: char,

    /// Append a trailing deny-all rule to every loaded policy.
    #[serde(default)]
    pub implicit_deny_all: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            list_delimiter: default_list_delimiter(),
            implicit_deny_all: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FqdnConfig {
    /// Resolve fqdn address tokens to IP literals.
    #[serde(default)]
    pub enable: bool,

    /// Persisted fqdn cache; resolved names are written back here.
    #[serde(default)]
    pub cache_file: String,
}

/// The runtime configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub bdd: BddConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub fqdn: FqdnConfig,
}

impl StoreConfig {
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

/// One named object definition. `value` for a single literal, `members`
/// for a multi-value object or a pool of other names.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDef {
    pub name: String,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDef {
    pub name: String,

    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub use_app_svc: bool,

    #[serde(default)]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameDef {
    pub name: String,

    #[serde(default)]
    pub members: Option<Vec<String>>,
}

/// The object definition file fed to `os load`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectFile {
    #[serde(default)]
    pub address: Vec<ObjectDef>,

    #[serde(default)]
    pub service: Vec<ObjectDef>,

    #[serde(default)]
    pub application: Vec<ApplicationDef>,

    #[serde(default)]
    pub user: Vec<NameDef>,

    #[serde(default)]
    pub url: Vec<NameDef>,
}

impl ObjectFile {
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_an_empty_config() {
        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config.bdd.node_size, 1_000_000);
        assert_eq!(config.loader.list_delimiter, ';');
        assert!(!config.loader.implicit_deny_all);
        assert!(!config.fqdn.enable);
    }

    #[test]
    fn object_file_round_trip() {
        let text = r#"
            [[address]]
            name = "web1"
            value = "10.0.0.1"

            [[address]]
            name = "web"
            members = ["web1"]

            [[service]]
            name = "http"
            value = "tcp/80"

            [[application]]
            name = "web-browsing"
            services = ["tcp/80", "tcp/443"]
            use_app_svc = true

            [[user]]
            name = "alice"

            [[url]]
            name = "www.example.com"
        "#;
        let file: ObjectFile = toml::from_str(text).unwrap();
        assert_eq!(file.address.len(), 2);
        assert_eq!(file.address[1].members.as_ref().unwrap().len(), 1);
        assert_eq!(file.application[0].services.len(), 2);
        assert!(file.application[0].use_app_svc);
    }
}
