//! Field-spec schemas for products and model objects.
//!
//! A schema is declared in YAML as a mapping of field name to a field
//! description:
//!
//! ```yaml
//! schema:
//!   name: release
//!   attributes:
//!     name: {kind: string, required: true, add_to_repr: true}
//!     versions: {kind: list(string)}
//!     public: {kind: boolean, default: false}
//! ```
//!
//! Validation turns a raw mapping into a [`Record`]: undeclared keys and
//! missing required keys are rejected, value kinds are checked, and
//! defaults are filled in.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::error::{SchemaError, SchemaResult};

/// Validated attribute values, in declaration order.
pub type Record = IndexMap<String, Value>;

/// The kind of value a field holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Dict,
    List(Box<FieldKind>),
    Tuple(Vec<FieldKind>),
    /// The name of a model object, resolved against a model list.
    Objects,
}

impl FieldKind {
    /// Returns `true` if `value` is a non-null value of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String | Self::Objects, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Dict, Value::Mapping(_)) => true,
            (Self::List(inner), Value::Sequence(items)) => items.iter().all(|v| inner.matches(v)),
            (Self::Tuple(kinds), Value::Sequence(items)) => {
                kinds.len() == items.len() && kinds.iter().zip(items).all(|(k, v)| k.matches(v))
            }
            _ => false,
        }
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(inner) = s.strip_suffix(')') {
            let (outer, args) = inner.split_once('(').ok_or_else(|| s.clone())?;
            let kinds = args
                .split(',')
                .map(|a| a.parse::<FieldKind>())
                .collect::<Result<Vec<_>, _>>()?;
            return match (outer.trim(), kinds.as_slice()) {
                ("list", [kind]) => Ok(Self::List(Box::new(kind.clone()))),
                ("tuple", _) => Ok(Self::Tuple(kinds)),
                _ => Err(s.clone()),
            };
        }
        match s.as_str() {
            "string" | "str" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "dict" => Ok(Self::Dict),
            "list" => Ok(Self::List(Box::new(Self::String))),
            "tuple" => Ok(Self::Tuple(vec![Self::String])),
            "objects" => Ok(Self::Objects),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Dict => f.write_str("dict"),
            Self::List(inner) => write!(f, "list({inner})"),
            Self::Tuple(kinds) => {
                let kinds: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
                write!(f, "tuple({})", kinds.join(","))
            }
            Self::Objects => f.write_str("objects"),
        }
    }
}

/// One declared field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Include the field in the object's display form.
    pub add_to_repr: bool,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            add_to_repr: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn in_repr(mut self) -> Self {
        self.add_to_repr = true;
        self
    }

    /// Parse a field description, checking that it carries every key in
    /// `required_keys` as well as `kind`.
    pub fn from_value(name: &str, value: &Value, required_keys: &[String]) -> SchemaResult<Self> {
        let desc = value
            .as_mapping()
            .ok_or_else(|| SchemaError::malformed(format!("field {name}"), "description must be a mapping"))?;

        let mut missing: Vec<String> = required_keys
            .iter()
            .filter(|k| !desc.contains_key(k.as_str()))
            .cloned()
            .collect();
        if !desc.contains_key("kind") && !missing.iter().any(|k| k == "kind") {
            missing.insert(0, "kind".into());
        }
        if !missing.is_empty() {
            return Err(SchemaError::MissingFieldKeys {
                field: name.to_string(),
                keys: missing,
            });
        }

        let raw_kind = desc.get("kind").and_then(Value::as_str).unwrap_or_default();
        let kind = raw_kind.parse().map_err(|kind| SchemaError::InvalidKind {
            field: name.to_string(),
            kind,
        })?;

        let spec = Self {
            name: name.to_string(),
            kind,
            required: desc.get("required").and_then(Value::as_bool).unwrap_or(false),
            default: desc.get("default").filter(|v| !v.is_null()).cloned(),
            add_to_repr: desc.get("add_to_repr").and_then(Value::as_bool).unwrap_or(false),
            description: desc.get("description").and_then(Value::as_str).map(str::to_string),
        };
        if let Some(default) = &spec.default {
            if !spec.kind.matches(default) {
                return Err(SchemaError::WrongKind {
                    schema: "default".into(),
                    field: spec.name,
                    expected: spec.kind.to_string(),
                    value: describe(default),
                });
            }
        }
        Ok(spec)
    }
}

/// A named set of fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// The schema product definitions are validated against when no
    /// datamodel file is supplied.
    pub fn product_default() -> Self {
        Self::new("product")
            .with_field(FieldSpec::new("name", FieldKind::String).required().in_repr())
            .with_field(FieldSpec::new("datatype", FieldKind::String).required())
            .with_field(FieldSpec::new("versions", FieldKind::List(Box::new(FieldKind::String))).required())
            .with_field(FieldSpec::new("example", FieldKind::String))
            .with_field(FieldSpec::new("path_name", FieldKind::String))
            .with_field(FieldSpec::new("path_kwargs", FieldKind::Dict))
            .with_field(FieldSpec::new("changelog", FieldKind::Dict))
            .with_field(FieldSpec::new("short", FieldKind::String).with_default(""))
            .with_field(FieldSpec::new("description", FieldKind::String).with_default(""))
    }

    /// Parse a `{name, attributes}` schema definition.
    pub fn from_definition(value: &Value, required_keys: &[String]) -> SchemaResult<Self> {
        let def = value
            .as_mapping()
            .ok_or_else(|| SchemaError::malformed("schema", "definition must be a mapping"))?;
        let name = def.get("name").and_then(Value::as_str).unwrap_or("schema");
        let attributes = def
            .get("attributes")
            .and_then(Value::as_mapping)
            .ok_or_else(|| SchemaError::malformed(format!("schema {name}"), "missing attributes mapping"))?;
        Self::from_mapping(name, attributes, required_keys)
    }

    /// Build a schema from a mapping of field name to field description.
    pub fn from_mapping(name: &str, fields: &Mapping, required_keys: &[String]) -> SchemaResult<Self> {
        let mut schema = Self::new(name);
        for (key, desc) in fields {
            let field = key_string(key).ok_or_else(|| {
                SchemaError::malformed(format!("schema {name}"), format!("invalid field name {}", describe(key)))
            })?;
            schema = schema.with_field(FieldSpec::from_value(&field, desc, required_keys)?);
        }
        Ok(schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Fields flagged `add_to_repr`.
    pub fn repr_fields(&self) -> Vec<String> {
        self.fields
            .values()
            .filter(|f| f.add_to_repr)
            .map(|f| f.name.clone())
            .collect()
    }

    /// A copy with `exclude` removed and every field optional without a
    /// default. Used for per-version override entries.
    pub fn relaxed(&self, exclude: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| !exclude.contains(&name.as_str()))
            .map(|(name, spec)| {
                let spec = FieldSpec {
                    required: false,
                    default: None,
                    ..spec.clone()
                };
                (name.clone(), spec)
            })
            .collect();
        Self {
            name: self.name.clone(),
            fields,
        }
    }

    /// Validate `data`, filling defaults for absent optional fields.
    pub fn validate(&self, data: &Mapping) -> SchemaResult<Record> {
        let mut record = Record::new();
        let mut unknown = Vec::new();
        for (key, value) in data {
            let key = key_string(key).ok_or_else(|| {
                SchemaError::malformed(self.name.clone(), format!("invalid key {}", describe(key)))
            })?;
            if self.fields.contains_key(&key) {
                record.insert(key, value.clone());
            } else {
                unknown.push(key);
            }
        }
        if !unknown.is_empty() {
            return Err(SchemaError::UnknownFields {
                schema: self.name.clone(),
                fields: unknown,
            });
        }

        for (name, spec) in &self.fields {
            match record.get(name) {
                Some(value) if !value.is_null() => {
                    if !spec.kind.matches(value) {
                        return Err(SchemaError::WrongKind {
                            schema: self.name.clone(),
                            field: name.clone(),
                            expected: spec.kind.to_string(),
                            value: describe(value),
                        });
                    }
                }
                _ if spec.required => {
                    return Err(SchemaError::MissingField {
                        schema: self.name.clone(),
                        field: name.clone(),
                    });
                }
                _ => {
                    if let Some(default) = &spec.default {
                        record.insert(name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(record)
    }
}

/// A mapping key as a string. Scalar keys are stringified.
pub(crate) fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A scalar value as a string, for path keywords and display.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => key_string(other),
    }
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Sequence(_) => "a list".into(),
        Value::Mapping(_) => "a mapping".into(),
        Value::Tagged(_) => "a tagged value".into(),
    }
}
