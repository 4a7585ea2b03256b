//! The parameter tree templates are rendered against.
//!
//! A tree is an untyped string-keyed mapping of JSON-like values. Trees are
//! combined with one of two merge policies:
//! - override merge: the later source wins, even across a map/scalar mismatch
//! - plain merge: the destination wins, a map/scalar mismatch is an error

use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::VAR_ARG_EXPRESSION;
use crate::error::{Error, Result};
use crate::matcher::Matcher;

static VAR_ARG: LazyLock<Matcher> = LazyLock::new(|| Matcher::must(VAR_ARG_EXPRESSION));

/// A mapping from string keys to values, used to render the templates with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override-merges every tree, in order, into a fresh accumulator.
    pub fn merge<I>(trees: I) -> Parameters
    where
        I: IntoIterator<Item = Parameters>,
    {
        let mut accumulator = Parameters::new();
        for tree in trees {
            accumulator.merge_override(tree);
        }
        accumulator
    }

    /// Builds a tree from `name=value` arguments.
    ///
    /// Dotted names (`a.b.c=value`) build nested maps. Values are kept as
    /// strings, without any numeric or boolean coercion.
    pub fn from_vars<S: AsRef<str>>(vars: &[S]) -> Result<Parameters> {
        let mut parameters = Parameters::new();
        for var in vars {
            let var = var.as_ref();
            let (groups, found) = VAR_ARG.match_groups(var);
            if !found {
                return Err(Error::InvalidOverrideArgument(var.to_string()));
            }
            let name = groups.get("name").map(String::as_str).unwrap_or_default();
            let value = unquote(groups.get("value").map(String::as_str).unwrap_or_default());
            debug!("Extra var: {name}={value}");

            if name.contains('.') {
                debug!("Extra var key is nested: {name}");
                parameters.insert_nested(name, Value::String(value.to_string()))?;
            } else {
                parameters.0.insert(name.to_string(), Value::String(value.to_string()));
            }
        }

        debug!("Parameters from vars: {parameters:?}");
        Ok(parameters)
    }

    /// Assigns `value` at the dotted path `key`, creating intermediate maps.
    ///
    /// An intermediate segment holding a non-map value is a key conflict;
    /// a null intermediate is replaced by a map.
    pub fn insert_nested(&mut self, key: &str, value: Value) -> Result<()> {
        if key.split('.').any(str::is_empty) {
            return Err(Error::EmptyKey(key.to_string()));
        }
        let (parents, last) = match key.rsplit_once('.') {
            Some((parents, last)) => (parents.split('.').collect::<Vec<_>>(), last),
            None => (Vec::new(), key),
        };

        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                other => {
                    return Err(Error::KeyConflict {
                        key: segment.to_string(),
                        kind: kind_of(other),
                    })
                }
            };
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Merges `src` into `self`, the values of `src` winning at every depth.
    pub fn merge_override(&mut self, src: Parameters) {
        merge_override_maps(&mut self.0, src.0);
    }

    /// Merges `src` into `self` without overriding.
    ///
    /// Keys missing from `self` (or null in it) are filled in and maps merge
    /// recursively; existing scalars are kept. A map meeting a non-null
    /// scalar fails with a merge conflict naming the dotted path.
    pub fn merge_plain(&mut self, src: Parameters) -> Result<()> {
        merge_plain_maps(&mut self.0, src.0, "")
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for Parameters {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Parameters {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Parameters> for Value {
    fn from(parameters: Parameters) -> Self {
        Value::Object(parameters.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Type name of a value, as shown in conflict errors.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

fn merge_override_maps(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, incoming) in src {
        match incoming {
            Value::Object(incoming) => match dst.get_mut(&key) {
                Some(Value::Object(existing)) => merge_override_maps(existing, incoming),
                _ => {
                    dst.insert(key, Value::Object(incoming));
                }
            },
            incoming => {
                dst.insert(key, incoming);
            }
        }
    }
}

fn merge_plain_maps(dst: &mut Map<String, Value>, src: Map<String, Value>, prefix: &str) -> Result<()> {
    for (key, incoming) in src {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match dst.get_mut(&key) {
            None | Some(Value::Null) => {
                dst.insert(key, incoming);
            }
            Some(Value::Object(existing)) => match incoming {
                Value::Object(incoming) => merge_plain_maps(existing, incoming, &path)?,
                Value::Null => {}
                other => {
                    return Err(Error::MergeConflict {
                        key: path,
                        existing: "map",
                        incoming: kind_of(&other),
                    })
                }
            },
            Some(existing) => {
                if incoming.is_object() {
                    return Err(Error::MergeConflict {
                        key: path,
                        existing: kind_of(existing),
                        incoming: "map",
                    });
                }
            }
        }
    }
    Ok(())
}

/// Strips one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"value 2\""), "value 2");
        assert_eq!(unquote("'and value 3'"), "and value 3");
        assert_eq!(unquote("\"mixed'"), "\"mixed'");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(&Value::from("a")), "string");
        assert_eq!(kind_of(&Value::from(1)), "number");
        assert_eq!(kind_of(&Value::Array(vec![])), "array");
        assert_eq!(kind_of(&Value::Object(Map::new())), "map");
    }
}
