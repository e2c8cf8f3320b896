//! Error types for the object store.

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The core model rejected an object or token.
    #[error(transparent)]
    Model(#[from] fwaudit_model::ModelError),

    /// An object name was registered twice in one catalog.
    #[error("object '{name}' is already defined")]
    DuplicateObject { name: String },

    /// A command or definition referenced an unknown object.
    #[error("unknown object '{name}'")]
    UnknownObject { name: String },

    /// The configuration or object file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The TOML side of a configuration or object file is malformed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The policy CSV stream is malformed beyond row recovery.
    #[error("invalid policy file: {0}")]
    Csv(#[from] csv::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
