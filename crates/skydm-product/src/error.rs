//! Error types for product loading, expansion and changelogs.

use std::path::PathBuf;

use skydm_fuzzy::LookupError;

/// A product or model definition does not conform to its schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("field {field}: unknown kind {kind:?}")]
    InvalidKind { field: String, kind: String },

    #[error("{schema}: missing required field {field}")]
    MissingField { schema: String, field: String },

    #[error("{schema}: undeclared fields ({})", .fields.join(", "))]
    UnknownFields { schema: String, fields: Vec<String> },

    #[error("{schema}: field {field} expects {expected}, got {value}")]
    WrongKind {
        schema: String,
        field: String,
        expected: String,
        value: String,
    },

    #[error("field {field} is missing required keys ({})", .keys.join(", "))]
    MissingFieldKeys { field: String, keys: Vec<String> },

    #[error("product {product} contains unallowed keys ({})", .keys.join(", "))]
    UnallowedProductKeys { product: String, keys: Vec<String> },

    #[error("product {product}: changelog version {version} is not one of its versions")]
    UnknownChangelogVersion { product: String, version: String },

    #[error("{context}: {reason}")]
    Malformed { context: String, reason: String },
}

impl SchemaError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// A changelog override value is not valid.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("{key}: {value:?} uses {operator} without a version prefix")]
    OperatorWithoutVersion {
        key: String,
        value: String,
        operator: &'static str,
    },

    #[error("{key}: {value:?} does not match the syntax [version] += XXX -= XXX")]
    Syntax { key: String, value: String },

    #[error("{key}: version {version} has no value to modify")]
    MissingReference { key: String, version: String },

    #[error("{key}: value at version {version} is not a list of strings")]
    NotAList { key: String, version: String },
}

/// An access path could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("unknown access path {0:?}")]
    UnknownName(String),

    #[error("access path {name:?} is missing keywords ({})", .missing.join(", "))]
    MissingKeywords { name: String, missing: Vec<String> },
}

/// A model list operation failed.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot add a {actual} object to a list of {expected} objects")]
    TypeMismatch { expected: String, actual: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// The configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Any failure from the product layer.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Diff(#[from] skydm_diff::DiffError),

    #[error(transparent)]
    Format(#[from] skydm_format::FormatError),

    #[error("product {product} has no version {version}")]
    UnknownVersion { product: String, version: String },

    #[error("product {product} at version {version} has no backing file")]
    NoFile { product: String, version: String },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse YAML {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
pub type OverrideResult<T> = Result<T, OverrideError>;
pub type PathResult<T> = Result<T, PathError>;
pub type ModelResult<T> = Result<T, ModelError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ProductResult<T> = Result<T, ProductError>;
