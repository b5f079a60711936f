//! Model objects and typed, fuzzy-searchable lists of them.
//!
//! A models file declares a schema and the objects that conform to it:
//!
//! ```yaml
//! schema:
//!   name: release
//!   attributes:
//!     name: {kind: string, required: true}
//!     public: {kind: boolean, default: false}
//! objects:
//!   - {name: DR15, public: true}
//!   - {name: MPL-7}
//! ```

use std::fmt;
use std::path::Path;

use serde_yaml::Value;
use skydm_fuzzy::{FuzzyKey, FuzzyList, Named};
use tracing::debug;

use crate::error::{ModelError, ModelResult, ProductError, ProductResult, SchemaError, SchemaResult};
use crate::schema::{Record, Schema};

/// One validated model object.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelObject {
    /// The schema name the object was validated against.
    pub kind: String,
    pub name: String,
    pub attributes: Record,
    /// Name of the list the object was appended to.
    pub parent: Option<String>,
    /// Channels the object fans out into when appended.
    pub channels: Vec<String>,
    /// The channel this object was unpacked from.
    pub channel: Option<String>,
}

impl ModelObject {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            attributes: Record::new(),
            parent: None,
            channels: Vec::new(),
            channel: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_channels<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Build an object from a validated record. The name comes from the
    /// `name` attribute, or `release` when there is none; a `channels`
    /// list attribute becomes the object's channels.
    pub fn from_record(kind: &str, attributes: Record) -> SchemaResult<Self> {
        let name = ["name", "release"]
            .iter()
            .find_map(|key| attributes.get(*key).and_then(crate::schema::scalar_string))
            .ok_or_else(|| SchemaError::malformed(format!("{kind} object"), "has no name"))?;
        let channels = match attributes.get("channels") {
            Some(Value::Sequence(items)) => items.iter().filter_map(crate::schema::scalar_string).collect(),
            _ => Vec::new(),
        };
        Ok(Self {
            kind: kind.to_string(),
            name,
            attributes,
            parent: None,
            channels,
            channel: None,
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// One object per channel, named `<name>_<channel>`; the object itself
    /// if it has no channels.
    fn unpack(&self) -> Vec<ModelObject> {
        if self.channels.is_empty() {
            return vec![self.clone()];
        }
        self.channels
            .iter()
            .map(|channel| ModelObject {
                name: format!("{}_{}", self.name, channel),
                channels: Vec::new(),
                channel: Some(channel.clone()),
                ..self.clone()
            })
            .collect()
    }
}

impl Named for ModelObject {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModelObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}({})>", self.kind, self.name)
    }
}

/// A fuzzy list of model objects of a single kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelList {
    kind: String,
    parent: Option<String>,
    items: FuzzyList<ModelObject>,
}

impl ModelList {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parent: None,
            items: FuzzyList::new(),
        }
    }

    /// Set the parent name, on this list and every object already in it.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        for item in self.items.iter_mut() {
            item.parent = Some(parent.clone());
        }
        self.parent = Some(parent);
        self
    }

    /// Parse a models document: a `schema` definition and a list of
    /// `objects` validated against it.
    pub fn from_definition(doc: &Value) -> ProductResult<Self> {
        let required_keys: Vec<String> = match doc.get("required_keys") {
            Some(Value::Sequence(keys)) => keys.iter().filter_map(crate::schema::scalar_string).collect(),
            _ => Vec::new(),
        };
        let schema_def = doc
            .get("schema")
            .ok_or_else(|| SchemaError::malformed("models", "missing schema"))?;
        let schema = Schema::from_definition(schema_def, &required_keys)?;

        let mut list = Self::new(schema.name());
        let objects: &[Value] = match doc.get("objects") {
            Some(Value::Sequence(objects)) => objects.as_slice(),
            None | Some(Value::Null) => &[],
            Some(_) => return Err(SchemaError::malformed("models", "objects must be a list").into()),
        };
        for raw in objects {
            let data = raw
                .as_mapping()
                .ok_or_else(|| SchemaError::malformed(schema.name(), "each object must be a mapping"))?;
            let object = ModelObject::from_record(schema.name(), schema.validate(data)?)?;
            list.append(&object)?;
        }
        debug!(kind = %list.kind, objects = list.len(), "loaded models");
        Ok(list)
    }

    /// Load a models YAML file.
    pub fn load(path: &Path) -> ProductResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ProductError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Value = serde_yaml::from_str(&text).map_err(|source| ProductError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_definition(&doc)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Append a copy of `object`, tagged with this list's parent. Objects
    /// with channels are unpacked into one entry per channel.
    pub fn append(&mut self, object: &ModelObject) -> ModelResult<()> {
        if !object.kind.eq_ignore_ascii_case(&self.kind) {
            return Err(ModelError::TypeMismatch {
                expected: self.kind.clone(),
                actual: object.kind.clone(),
            });
        }
        for mut item in object.unpack() {
            item.parent = self.parent.clone();
            self.items.push(item);
        }
        Ok(())
    }

    pub fn get<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> ModelResult<&ModelObject> {
        Ok(self.items.get(key)?)
    }

    pub fn contains<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> bool {
        self.items.contains(key)
    }

    pub fn names(&self) -> Vec<String> {
        self.items.names()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelObject> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelList {
    type Item = &'a ModelObject;
    type IntoIter = std::slice::Iter<'a, ModelObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
