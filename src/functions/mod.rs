//! Functions exposed to templates.
//!
//! A [`FunctionSet`] is an immutable table of callables. Every entry is
//! registered both as a global function (`gzip(text)`) and as a filter
//! (`text | gzip`), the piped value becoming the first argument, unless the
//! entry carries its own filter form.

use std::collections::BTreeMap;

use minijinja::value::{Rest, Value};
use minijinja::{Environment, ErrorKind, State};

pub mod cidr;
pub mod compress;
pub mod data;

/// Named template functions, composed with override semantics.
#[derive(Debug, Clone, Default)]
pub struct FunctionSet {
    functions: BTreeMap<String, Value>,
    filters: BTreeMap<String, Value>,
}

impl FunctionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable, replacing any function of the same name.
    ///
    /// The callable is usually built with `Value::from_function`.
    pub fn with<N: Into<String>>(mut self, name: N, function: Value) -> Self {
        let name = name.into();
        self.filters.remove(&name);
        self.functions.insert(name, function);
        self
    }

    /// Adds a callable together with a dedicated filter form, for functions
    /// whose piped argument is not their first one.
    pub fn with_filter<N: Into<String>>(mut self, name: N, function: Value, filter: Value) -> Self {
        let name = name.into();
        self.filters.insert(name.clone(), filter);
        self.functions.insert(name, function);
        self
    }

    /// Layers `other` over this set; its functions win on name clashes.
    pub fn extend(mut self, other: FunctionSet) -> Self {
        for name in other.functions.keys() {
            self.filters.remove(name);
        }
        self.functions.extend(other.functions);
        self.filters.extend(other.filters);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registers every function as a global and as a filter.
    pub fn register(&self, env: &mut Environment<'_>) {
        for (name, function) in &self.functions {
            env.add_global(name.clone(), function.clone());

            let function = self.filters.get(name).unwrap_or(function).clone();
            env.add_filter(
                name.clone(),
                move |state: &State, value: Value, args: Rest<Value>| -> Result<Value, minijinja::Error> {
                    let mut all = Vec::with_capacity(args.len() + 1);
                    all.push(value);
                    all.extend(args.0);
                    function.call(state, &all)
                },
            );
        }
    }
}

/// The extra functions shipped with render.
pub fn extra() -> FunctionSet {
    FunctionSet::new()
        .with("readFile", Value::from_function(data::read_file))
        .with("toYaml", Value::from_function(data::to_yaml))
        .with("fromYaml", Value::from_function(data::from_yaml))
        .with("toJson", Value::from_function(data::to_json))
        .with("fromJson", Value::from_function(data::from_json))
        .with_filter(
            "jsonPath",
            Value::from_function(data::json_path),
            Value::from_function(data::json_path_filter),
        )
        .with("n", Value::from_function(data::n))
        .with("merge", Value::from_function(data::merge))
        .with("mergeOverwrite", Value::from_function(data::merge_overwrite))
        .with("gzip", Value::from_function(compress::gzip))
        .with("ungzip", Value::from_function(compress::ungzip))
        .with("cidrHost", Value::from_function(cidr::cidr_host))
        .with("cidrNetmask", Value::from_function(cidr::cidr_netmask))
        .with("cidrSubnet", Value::from_function(cidr::cidr_subnet))
        .with("cidrSubnets", Value::from_function(cidr::cidr_subnets))
}

/// Wraps a foreign error as a template function failure.
pub(crate) fn failure<E: std::fmt::Display>(context: &str, err: E) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_overrides_same_name() {
        let base = FunctionSet::new()
            .with("a", Value::from_function(|| "base a"))
            .with("b", Value::from_function(|| "base b"));
        let ext = FunctionSet::new().with("a", Value::from_function(|| "ext a"));

        let set = base.extend(ext);
        assert_eq!(set.len(), 2);

        let mut env = Environment::new();
        set.register(&mut env);
        let rendered = env.render_str("{{ a() }} {{ b() }}", ()).unwrap();
        assert_eq!(rendered, "ext a base b");
    }

    #[test]
    fn test_registered_as_filter_with_piped_value_first() {
        let set = FunctionSet::new().with(
            "join2",
            Value::from_function(|a: String, b: String| format!("{a}-{b}")),
        );
        let mut env = Environment::new();
        set.register(&mut env);

        let rendered = env.render_str("{{ 'x' | join2('y') }}|{{ join2('x', 'y') }}", ()).unwrap();
        assert_eq!(rendered, "x-y|x-y");
    }

    #[test]
    fn test_dedicated_filter_form() {
        let set = FunctionSet::new().with_filter(
            "pair",
            Value::from_function(|a: String, b: String| format!("{a}-{b}")),
            Value::from_function(|b: String, a: String| format!("{a}-{b}")),
        );
        let mut env = Environment::new();
        set.register(&mut env);

        let rendered = env.render_str("{{ pair('x', 'y') }}|{{ 'y' | pair('x') }}", ()).unwrap();
        assert_eq!(rendered, "x-y|x-y");
    }

    #[test]
    fn test_override_drops_dedicated_filter() {
        let base = FunctionSet::new().with_filter(
            "f",
            Value::from_function(|a: String| format!("fn {a}")),
            Value::from_function(|a: String| format!("filter {a}")),
        );
        let set = base.extend(FunctionSet::new().with("f", Value::from_function(|a: String| format!("new {a}"))));
        let mut env = Environment::new();
        set.register(&mut env);

        let rendered = env.render_str("{{ f('x') }}|{{ 'x' | f }}", ()).unwrap();
        assert_eq!(rendered, "new x|new x");
    }

    #[test]
    fn test_extra_names() {
        let set = extra();
        for name in ["readFile", "toYaml", "fromYaml", "fromJson", "jsonPath", "gzip", "ungzip"] {
            assert!(set.contains(name), "missing {name}");
        }
        assert!(!set.contains("render"));
    }
}
