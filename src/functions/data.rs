//! Structured data functions: YAML, JSON, JSONPath, merging and file reads.

use std::path::{Path, PathBuf};

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::State;
use serde::Deserialize;
use serde_json_path::JsonPath;

use super::failure;
use crate::constants::ROOT_KEY;
use crate::parameters::Parameters;

/// Reads a file, resolving relative paths against the `root` parameter.
pub fn read_file(state: &State, path: &str) -> Result<String, minijinja::Error> {
    let path = Path::new(path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root(state)?.join(path)
    };
    std::fs::read_to_string(&path).map_err(|e| failure(&format!("cannot read '{}'", path.display()), e))
}

fn root(state: &State) -> Result<PathBuf, minijinja::Error> {
    if let Some(root) = state.lookup(ROOT_KEY).as_ref().and_then(Value::as_str) {
        return Ok(PathBuf::from(root));
    }
    std::env::current_dir().map_err(|e| failure("cannot get the working directory", e))
}

pub fn to_yaml(value: Value) -> Result<String, minijinja::Error> {
    serde_yaml::to_string(&value).map_err(|e| failure("cannot marshal YAML", e))
}

/// Parses YAML text; a stream of several documents yields a list.
pub fn from_yaml(text: &str) -> Result<Value, minijinja::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let document = serde_yaml::Value::deserialize(document).map_err(|e| failure("cannot parse YAML", e))?;
        documents.push(document);
    }
    match documents.len() {
        0 => Ok(Value::from(())),
        1 => Ok(Value::from_serialize(&documents[0])),
        _ => Ok(Value::from_serialize(&documents)),
    }
}

pub fn to_json(value: Value) -> Result<String, minijinja::Error> {
    serde_json::to_string(&value).map_err(|e| failure("cannot marshal JSON", e))
}

pub fn from_json(text: &str) -> Result<Value, minijinja::Error> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| failure("cannot parse JSON", e))?;
    Ok(Value::from_serialize(&value))
}

/// Evaluates a JSONPath expression against a structure.
///
/// The expression may be wrapped in `{` `}`. A single match is returned
/// as-is, anything else as the list of matches.
pub fn json_path(expression: &str, structure: Value) -> Result<Value, minijinja::Error> {
    let trimmed = expression.trim();
    let expression = trimmed
        .strip_prefix('{')
        .and_then(|e| e.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim();
    let path = JsonPath::parse(expression).map_err(|e| failure(&format!("invalid JSONPath '{expression}'"), e))?;
    let structure = serde_json::to_value(&structure).map_err(|e| failure("cannot convert structure", e))?;

    let matches = path.query(&structure).all();
    match matches.as_slice() {
        [single] => Ok(Value::from_serialize(single)),
        _ => Ok(Value::from_serialize(&matches)),
    }
}

/// Longest sequence `n` produces.
const MAX_SEQUENCE_LEN: i128 = 1_000_000;

/// Inclusive integer sequence from `start` to `end`.
pub fn n(start: i64, end: i64) -> Result<Vec<i64>, minijinja::Error> {
    let len = i128::from(end) - i128::from(start) + 1;
    if len > MAX_SEQUENCE_LEN {
        return Err(failure(
            "n",
            format!("sequence from {start} to {end} has {len} items, at most {MAX_SEQUENCE_LEN} are allowed"),
        ));
    }
    Ok((start..=end).collect())
}

/// Plain merge: keys of `dst` win, a map/scalar clash is an error.
pub fn merge(dst: Value, sources: Rest<Value>) -> Result<Value, minijinja::Error> {
    let mut accumulator = to_parameters(&dst, 1)?;
    for (i, source) in sources.iter().enumerate() {
        accumulator
            .merge_plain(to_parameters(source, i + 2)?)
            .map_err(|e| failure("cannot merge", e))?;
    }
    Ok(Value::from_serialize(&accumulator))
}

/// Override merge: later sources win at every depth.
pub fn merge_overwrite(dst: Value, sources: Rest<Value>) -> Result<Value, minijinja::Error> {
    let mut accumulator = to_parameters(&dst, 1)?;
    for (i, source) in sources.iter().enumerate() {
        accumulator.merge_override(to_parameters(source, i + 2)?);
    }
    Ok(Value::from_serialize(&accumulator))
}

/// Filter form of [`json_path`]: `structure | jsonPath(expression)`.
pub fn json_path_filter(structure: Value, expression: &str) -> Result<Value, minijinja::Error> {
    json_path(expression, structure)
}

fn to_parameters(value: &Value, position: usize) -> Result<Parameters, minijinja::Error> {
    if value.kind() != ValueKind::Map {
        return Err(failure(
            "cannot merge",
            format!("expected parameter {position} to be type map, got {}", value.kind()),
        ));
    }
    serde_json::from_value(serde_json::to_value(value).map_err(|e| failure("cannot convert map", e))?)
        .map_err(|e| failure("cannot convert map", e))
}
