//! Versioned data products for SkyDM.
//!
//! Products are declared in YAML, validated against a datamodel [`Schema`],
//! and expanded into one [`ExpandedFile`] per version. Per-version
//! attribute changes are written in a compact override syntax
//! (`v1 += [a, b] -= c`) and resolved at load time. A product's
//! [`ChangeLog`](skydm_diff::ChangeLog) is the series of structural diffs
//! between its consecutive versions.
//!
//! # Key Types
//!
//! - [`Product`] / [`ExpandedFile`] -- A versioned product and one of its versions
//! - [`ProductContext`] -- Backend, resolver and warning sink a product works with
//! - [`DataModel`] -- Schema and model lists products are validated against
//! - [`Schema`] / [`FieldSpec`] / [`FieldKind`] -- Field-spec validation
//! - [`ModelList`] / [`ModelObject`] -- Typed, fuzzy-searchable model objects
//! - [`PathResolver`] / [`TemplateResolver`] -- Access names to file paths
//! - [`Config`] -- TOML configuration

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod overrides;
pub mod product;
pub mod resolver;
pub mod schema;

pub use config::{Config, DATA_ROOT_ENV};
pub use error::{
    ConfigError, ConfigResult, ModelError, ModelResult, OverrideError, OverrideResult, PathError, PathResult,
    ProductError, ProductResult, SchemaError, SchemaResult,
};
pub use loader::DataModel;
pub use model::{ModelList, ModelObject};
pub use overrides::{expand_changelog, parse_override, Op, Override};
pub use product::{object_list, product_list, Backing, ExpandedFile, ObjectList, Product, ProductContext, ProductList};
pub use resolver::{PathResolver, TemplateResolver};
pub use schema::{FieldKind, FieldSpec, Record, Schema};
