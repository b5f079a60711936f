//! Per-version attribute overrides.
//!
//! A product's `changelog` maps a version label to the attributes that
//! differ at that version. Values are either literal replacements or, for
//! list attributes, modifications of the value at another version:
//!
//! ```yaml
//! changelog:
//!   v3:
//!     extensions: v2 += [EMLINE, SPECINDEX] -= MASK
//! ```
//!
//! Versions without an entry take the product's `defaults` mapping, if
//! one is declared.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{OverrideError, OverrideResult};
use crate::schema::{key_string, scalar_string, Record};

const ADD: &str = "+=";
const REMOVE: &str = "-=";

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[+-]=(?:\[[^\[\]=]+\]|[^\[\]=]+))+$").expect("valid override pattern")
    })
}

fn operator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[+-]=").expect("valid operator pattern"))
}

/// Whether an operation adds or removes items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Remove,
}

/// A parsed override value.
#[derive(Clone, Debug, PartialEq)]
pub enum Override {
    /// Use the value as given.
    Verbatim(Value),
    /// Start from the value at `base` and apply `ops` in order.
    Modify {
        base: String,
        ops: Vec<(Op, Vec<String>)>,
    },
}

/// Parse one override value for `key`.
///
/// Non-string values are verbatim. A string that starts with one of
/// `versions` must continue with one or more `+=`/`-=` operations; a
/// string that does not must contain neither operator.
pub fn parse_override(key: &str, value: &Value, versions: &[String]) -> OverrideResult<Override> {
    let Value::String(text) = value else {
        return Ok(Override::Verbatim(value.clone()));
    };
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(base) = version_prefix(&compact, versions) else {
        for operator in [ADD, REMOVE] {
            if compact.contains(operator) {
                return Err(OverrideError::OperatorWithoutVersion {
                    key: key.to_string(),
                    value: text.clone(),
                    operator,
                });
            }
        }
        return Ok(Override::Verbatim(value.clone()));
    };

    let rest = &compact[base.len()..];
    let syntax = || OverrideError::Syntax {
        key: key.to_string(),
        value: text.clone(),
    };
    if !expression_pattern().is_match(rest) {
        return Err(syntax());
    }

    let operators: Vec<_> = operator_pattern().find_iter(rest).collect();
    let mut ops = Vec::with_capacity(operators.len());
    for (i, m) in operators.iter().enumerate() {
        let end = operators.get(i + 1).map_or(rest.len(), |next| next.start());
        let op = if m.as_str() == ADD { Op::Add } else { Op::Remove };
        let operand = &rest[m.end()..end];
        let operand = operand
            .strip_prefix('[')
            .and_then(|o| o.strip_suffix(']'))
            .unwrap_or(operand);
        let items: Vec<String> = operand
            .split(',')
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if items.is_empty() {
            return Err(syntax());
        }
        ops.push((op, items));
    }

    Ok(Override::Modify {
        base: base.to_string(),
        ops,
    })
}

/// The longest version label that prefixes `text`, first in order on ties.
fn version_prefix<'v>(text: &str, versions: &'v [String]) -> Option<&'v str> {
    versions
        .iter()
        .filter(|v| !v.is_empty() && text.starts_with(v.as_str()))
        .fold(None, |best: Option<&String>, v| match best {
            Some(b) if b.len() >= v.len() => Some(b),
            _ => Some(v),
        })
        .map(String::as_str)
}

impl Override {
    /// Produce the final value. `lookup` returns the value of `key` at a
    /// given version.
    pub fn resolve<'a>(&self, key: &str, lookup: impl Fn(&str) -> Option<&'a Value>) -> OverrideResult<Value> {
        let (base, ops) = match self {
            Self::Verbatim(value) => return Ok(value.clone()),
            Self::Modify { base, ops } => (base, ops),
        };
        let start = lookup(base).ok_or_else(|| OverrideError::MissingReference {
            key: key.to_string(),
            version: base.clone(),
        })?;
        let not_a_list = || OverrideError::NotAList {
            key: key.to_string(),
            version: base.clone(),
        };
        let Value::Sequence(start) = start else {
            return Err(not_a_list());
        };

        let mut items: Vec<String> = Vec::with_capacity(start.len());
        for item in start {
            let item = scalar_string(item).ok_or_else(not_a_list)?;
            if !items.contains(&item) {
                items.push(item);
            }
        }
        for (op, operands) in ops {
            match op {
                Op::Add => {
                    for operand in operands {
                        if !items.contains(operand) {
                            items.push(operand.clone());
                        }
                    }
                }
                Op::Remove => items.retain(|item| !operands.contains(item)),
            }
        }
        Ok(Value::Sequence(items.into_iter().map(Value::String).collect()))
    }
}

/// Expand a product's changelog into the concrete overrides of each
/// version, in version order.
///
/// Modifications are resolved against the referenced version's already
/// expanded value when there is one, and against `base` otherwise.
/// Versions with no changelog entry take `defaults`; versions with
/// neither are absent from the result.
pub fn expand_changelog(
    versions: &[String],
    changelog: Option<&Mapping>,
    defaults: Option<&Mapping>,
    base: &Record,
) -> OverrideResult<IndexMap<String, Record>> {
    let mut expanded: IndexMap<String, Record> = IndexMap::new();
    for version in versions {
        let entry = changelog.and_then(|c| c.get(version.as_str()));
        let record = match (entry, defaults) {
            (Some(entry), _) => {
                let mut record = Record::new();
                for (key, value) in entry.as_mapping().into_iter().flatten() {
                    let Some(key) = key_string(key) else {
                        continue;
                    };
                    let parsed = parse_override(&key, value, versions)?;
                    let resolved = parsed.resolve(&key, |at| {
                        expanded
                            .get(at)
                            .and_then(|r| r.get(&key))
                            .or_else(|| base.get(&key))
                    })?;
                    record.insert(key, resolved);
                }
                record
            }
            (None, Some(defaults)) => defaults
                .iter()
                .filter_map(|(k, v)| Some((key_string(k)?, v.clone())))
                .collect(),
            (None, None) => continue,
        };
        debug!(%version, overrides = record.len(), "expanded changelog entry");
        expanded.insert(version.clone(), record);
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn strings(value: &Value) -> Vec<String> {
        value
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    fn seq(items: &[&str]) -> Value {
        Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn add_and_remove_against_reference() {
        let versions = versions(&["v1", "v2"]);
        let parsed = parse_override("ext", &Value::from("v1 += [a,b] -= [c]"), &versions).unwrap();
        assert_eq!(
            parsed,
            Override::Modify {
                base: "v1".into(),
                ops: vec![
                    (Op::Add, vec!["a".into(), "b".into()]),
                    (Op::Remove, vec!["c".into()])
                ],
            }
        );
        let start = seq(&["c", "d"]);
        let value = parsed.resolve("ext", |_| Some(&start)).unwrap();
        let mut got = strings(&value);
        got.sort();
        assert_eq!(got, vec!["a", "b", "d"]);
    }

    #[test]
    fn single_items_without_brackets() {
        let versions = versions(&["DR15", "DR16"]);
        let parsed = parse_override("ext", &Value::from("DR15 -= MASK += MPL-7"), &versions).unwrap();
        let start = seq(&["FLUX", "MASK"]);
        let value = parsed.resolve("ext", |_| Some(&start)).unwrap();
        assert_eq!(strings(&value), vec!["FLUX", "MPL-7"]);
    }

    #[test]
    fn verbatim_values() {
        let versions = versions(&["v1"]);
        let list = seq(&["x"]);
        assert_eq!(parse_override("k", &list, &versions).unwrap(), Override::Verbatim(list));
        let text = Value::from("manga/{drpver}/cube.fits");
        assert_eq!(parse_override("k", &text, &versions).unwrap(), Override::Verbatim(text));
    }

    #[test]
    fn operator_without_version_fails() {
        let err = parse_override("ext", &Value::from("dr5 += [a]"), &versions(&["v1"])).unwrap_err();
        assert!(matches!(err, OverrideError::OperatorWithoutVersion { operator: "+=", .. }));
    }

    #[test]
    fn malformed_expression_fails() {
        let versions = versions(&["v1"]);
        for bad in ["v1", "v1 += ", "v1 += [a", "v1 == b", "v1 += []"] {
            let err = parse_override("ext", &Value::from(bad), &versions).unwrap_err();
            assert!(matches!(err, OverrideError::Syntax { .. }), "{bad}");
        }
    }

    #[test]
    fn longest_version_prefix_wins() {
        let versions = versions(&["v1", "v10"]);
        let parsed = parse_override("ext", &Value::from("v10 += a"), &versions).unwrap();
        assert!(matches!(parsed, Override::Modify { ref base, .. } if base == "v10"));
    }

    #[test]
    fn modifying_a_scalar_fails() {
        let parsed = parse_override("name", &Value::from("v1 += a"), &versions(&["v1"])).unwrap();
        let scalar = Value::from("cube");
        assert!(matches!(
            parsed.resolve("name", |_| Some(&scalar)),
            Err(OverrideError::NotAList { .. })
        ));
        assert!(matches!(
            parsed.resolve("name", |_| None),
            Err(OverrideError::MissingReference { .. })
        ));
    }

    #[test]
    fn expands_with_defaults_and_chained_references() {
        let versions = versions(&["v1", "v2", "v3", "v4"]);
        let changelog: Mapping = serde_yaml::from_str(
            "v2:\n  ext: v1 += [IVAR]\nv3:\n  ext: v2 -= FLUX += MASK\n  short: renamed\n",
        )
        .unwrap();
        let defaults: Mapping = serde_yaml::from_str("short: default text\n").unwrap();
        let mut base = Record::new();
        base.insert("ext".into(), seq(&["FLUX"]));

        let expanded = expand_changelog(&versions, Some(&changelog), Some(&defaults), &base).unwrap();
        assert_eq!(expanded.keys().collect::<Vec<_>>(), vec!["v1", "v2", "v3", "v4"]);
        assert_eq!(expanded["v1"]["short"], Value::from("default text"));
        assert_eq!(strings(&expanded["v2"]["ext"]), vec!["FLUX", "IVAR"]);
        assert_eq!(strings(&expanded["v3"]["ext"]), vec!["IVAR", "MASK"]);
        assert_eq!(expanded["v3"]["short"], Value::from("renamed"));
    }

    #[test]
    fn versions_without_entries_or_defaults_are_absent() {
        let versions = versions(&["v1", "v2"]);
        let changelog: Mapping = serde_yaml::from_str("v2:\n  short: hi\n").unwrap();
        let expanded = expand_changelog(&versions, Some(&changelog), None, &Record::new()).unwrap();
        assert_eq!(expanded.keys().collect::<Vec<_>>(), vec!["v2"]);
    }
}
