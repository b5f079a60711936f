//! Loading product definitions from YAML.
//!
//! A products file maps a product key to its definition:
//!
//! ```yaml
//! logcube:
//!   name: LogCube
//!   datatype: fits
//!   versions: [DR15, DR16, DR17]
//!   example: mangawork/manga/spectro/redux/DR15/8485/stack/manga-8485-1901-LOGCUBE.fits.gz
//!   changelog:
//!     DR17:
//!       extensions: DR16 += [DISP] -= PREDISP
//!   defaults:
//!     short: log-sampled datacube
//! ```
//!
//! Definitions are checked against a [`DataModel`] schema: undeclared keys
//! are rejected, and each changelog entry may only name declared fields and
//! one of the product's own versions.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use skydm_fuzzy::FuzzyDict;
use tracing::{debug, info};

use crate::error::{ProductError, ProductResult, SchemaError};
use crate::model::{ModelList, ModelObject};
use crate::overrides::expand_changelog;
use crate::product::{product_list, Product, ProductContext, ProductList};
use crate::schema::{key_string, scalar_string, FieldKind, Schema};

/// Keys that are part of a definition but not of a version's attributes.
const STRUCTURAL_KEYS: [&str; 2] = ["changelog", "versions"];

/// The schema products are validated against, plus the model lists that
/// `objects` fields refer to.
#[derive(Clone, Debug)]
pub struct DataModel {
    schema: Schema,
    models: FuzzyDict<ModelList>,
}

impl Default for DataModel {
    fn default() -> Self {
        Self::new(Schema::product_default())
    }
}

impl DataModel {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            models: FuzzyDict::new(),
        }
    }

    /// Parse a datamodel document: a `schema` definition and optional
    /// `required_keys` every field description must carry.
    pub fn from_yaml_str(text: &str, path: &Path) -> ProductResult<Self> {
        let doc: Value = serde_yaml::from_str(text).map_err(|source| ProductError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        let required_keys: Vec<String> = match doc.get("required_keys") {
            Some(Value::Sequence(keys)) => keys.iter().filter_map(scalar_string).collect(),
            _ => Vec::new(),
        };
        let schema_def = doc
            .get("schema")
            .ok_or_else(|| SchemaError::malformed(path.display().to_string(), "missing schema"))?;
        Ok(Self::new(Schema::from_definition(schema_def, &required_keys)?))
    }

    pub fn load(path: &Path) -> ProductResult<Self> {
        Self::from_yaml_str(&read(path)?, path)
    }

    /// Register `models` under the field name that refers to them.
    pub fn with_models(mut self, field: impl Into<String>, models: ModelList) -> Self {
        self.models.insert(field, models);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn models(&self) -> &FuzzyDict<ModelList> {
        &self.models
    }

    /// The model object a product's `objects` field names.
    pub fn resolve_object(&self, product: &Product, field: &str) -> ProductResult<&ModelObject> {
        let name = product
            .attribute(field)
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::MissingField {
                schema: product.key().to_string(),
                field: field.to_string(),
            })?;
        Ok(self.models.get(field)?.get(name)?)
    }

    /// Parse a products document into products bound to `context`.
    pub fn products_from_yaml_str(&self, text: &str, path: &Path, context: &ProductContext) -> ProductResult<ProductList> {
        let doc: Value = serde_yaml::from_str(text).map_err(|source| ProductError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = match doc {
            Value::Mapping(entries) => entries,
            Value::Null => Mapping::new(),
            _ => {
                return Err(
                    SchemaError::malformed(path.display().to_string(), "products file must be a mapping").into(),
                )
            }
        };

        let mut products = Vec::with_capacity(entries.len());
        for (key, definition) in &entries {
            let key = key_string(key).ok_or_else(|| {
                SchemaError::malformed(path.display().to_string(), "product keys must be strings")
            })?;
            let definition = definition.as_mapping().ok_or_else(|| {
                SchemaError::malformed(format!("product {key}"), "definition must be a mapping")
            })?;
            products.push(self.product(&key, definition, context)?);
        }
        info!(path = %path.display(), products = products.len(), "loaded products");
        Ok(product_list(products).with_min_score(context.min_score()))
    }

    pub fn load_products(&self, path: &Path, context: &ProductContext) -> ProductResult<ProductList> {
        self.products_from_yaml_str(&read(path)?, path, context)
    }

    /// Validate and build one product.
    pub fn product(&self, key: &str, definition: &Mapping, context: &ProductContext) -> ProductResult<Product> {
        let mut definition = definition.clone();
        let defaults = definition.remove("defaults");
        let defaults = match &defaults {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(d)) => Some(d),
            Some(_) => return Err(SchemaError::malformed(format!("product {key}"), "defaults must be a mapping").into()),
        };

        let unallowed: Vec<String> = definition
            .keys()
            .filter_map(key_string)
            .filter(|k| !self.schema.contains(k))
            .collect();
        if !unallowed.is_empty() {
            return Err(SchemaError::UnallowedProductKeys {
                product: key.to_string(),
                keys: unallowed,
            }
            .into());
        }

        let record = self.schema.validate(&definition)?;
        let versions: Vec<String> = match record.get("versions") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
            _ => {
                return Err(SchemaError::MissingField {
                    schema: key.to_string(),
                    field: "versions".into(),
                }
                .into())
            }
        };

        let changelog = match record.get("changelog") {
            Some(Value::Mapping(changelog)) => Some(changelog),
            _ => None,
        };
        if let Some(changelog) = changelog {
            self.check_changelog(key, changelog, &versions)?;
        }
        if let Some(defaults) = defaults {
            self.schema.relaxed(&STRUCTURAL_KEYS).validate(defaults)?;
        }
        self.check_objects(key, &definition)?;

        let mut base = record.clone();
        for structural in STRUCTURAL_KEYS {
            base.shift_remove(structural);
        }
        let overrides = expand_changelog(&versions, changelog, defaults, &base)?;
        debug!(product = %key, versions = versions.len(), overrides = overrides.len(), "validated product");

        Product::from_record(key, record, overrides, self.schema.repr_fields(), context.clone())
    }

    fn check_changelog(&self, key: &str, changelog: &Mapping, versions: &[String]) -> ProductResult<()> {
        let entry_schema = self.schema.relaxed(&STRUCTURAL_KEYS);
        for (version, entry) in changelog {
            let version = key_string(version).unwrap_or_default();
            if !versions.contains(&version) {
                return Err(SchemaError::UnknownChangelogVersion {
                    product: key.to_string(),
                    version,
                }
                .into());
            }
            let entry = entry.as_mapping().ok_or_else(|| {
                SchemaError::malformed(format!("product {key} changelog {version}"), "entry must be a mapping")
            })?;
            // Override expressions are strings even for list fields, so
            // only the keys are checked here.
            let unknown: Vec<String> = entry
                .keys()
                .filter_map(key_string)
                .filter(|k| !entry_schema.contains(k))
                .collect();
            if !unknown.is_empty() {
                return Err(SchemaError::UnknownFields {
                    schema: format!("{key} changelog {version}"),
                    fields: unknown,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Every `objects` field must name an object in its registered model
    /// list, when one is registered.
    fn check_objects(&self, key: &str, definition: &Mapping) -> ProductResult<()> {
        for field in self.schema.fields().filter(|f| f.kind == FieldKind::Objects) {
            let Some(name) = definition.get(field.name.as_str()).and_then(Value::as_str) else {
                continue;
            };
            match self.models.iter().find(|(registered, _)| *registered == field.name) {
                Some((_, models)) => {
                    models.get(name)?;
                }
                None => debug!(product = %key, field = %field.name, "no models registered for field"),
            }
        }
        Ok(())
    }
}

fn read(path: &Path) -> ProductResult<String> {
    std::fs::read_to_string(path).map_err(|source| ProductError::Io {
        path: path.to_path_buf(),
        source,
    })
}
