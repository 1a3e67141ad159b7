use std::path::PathBuf;

use thiserror::Error;

use crate::registry::domain::registry_state::IdentityId;

/// Failures of the durable encoding store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record exists but does not describe a valid registry state.
    #[error("registry record at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to read registry record at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The record could not be written; the previous record is left intact.
    #[error("failed to write registry record to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize registry state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures surfaced by [`IdentityRegistry`](crate::registry::domain::identity_registry::IdentityRegistry).
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to load registry: {0}")]
    Load(#[source] StoreError),
    #[error("invalid registry configuration: {0}")]
    Config(#[source] ConfigError),
    /// The mutation was rolled back because it could not be persisted.
    #[error("registry change was not persisted: {0}")]
    Persistence(#[source] StoreError),
    #[error("encoding has {actual} dimensions, registry expects {expected}")]
    InvalidEncoding { expected: usize, actual: usize },
    #[error("encoding is empty")]
    EmptyEncoding,
    #[error("encoding contains NaN or infinite values")]
    NonFiniteEncoding,
    #[error("stored encodings have {stored} dimensions but {configured} were configured")]
    DimensionMismatch { stored: usize, configured: usize },
    #[error("no identity with id {0}")]
    UnknownIdentity(IdentityId),
    /// Every id up to `u64::MAX` has been handed out.
    #[error("no identity ids left to assign")]
    IdsExhausted,
    #[error("display name must not be blank")]
    BlankName,
    #[error("registry worker has stopped")]
    WorkerStopped,
}

/// Failures while loading a [`RegistryConfig`](crate::registry::domain::registry_config::RegistryConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("threshold must be a finite non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("dimension must be greater than zero")]
    InvalidDimension,
    #[error("unknown match policy '{0}', expected 'first' or 'nearest'")]
    UnknownMatchPolicy(String),
}
