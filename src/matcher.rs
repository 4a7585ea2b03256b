//! Named-capture regular expression matching.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled regular expression with named capture groups.
///
/// The compiled pattern is immutable, so a `Matcher` can be shared freely
/// between callers.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    /// Compiles `expression`, reporting a compile failure as an error.
    pub fn new(expression: &str) -> Result<Self> {
        let regex = Regex::new(expression).map_err(|source| Error::InvalidExpression {
            expression: expression.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Compiles `expression` or panics.
    ///
    /// Meant for expressions that are compile-time constants.
    pub fn must(expression: &str) -> Self {
        match Self::new(expression) {
            Ok(matcher) => matcher,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns true if `value` matches the expression.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Matches `value` and returns the named groups.
    ///
    /// On no match the map is empty and the flag is false. Otherwise there is
    /// one entry per named group; a group that matched nothing maps to "".
    pub fn match_groups(&self, value: &str) -> (HashMap<String, String>, bool) {
        let mut groups = HashMap::new();
        let Some(captures) = self.regex.captures(value) else {
            return (groups, false);
        };

        for name in self.regex.capture_names().flatten() {
            let captured = captures.name(name).map_or("", |m| m.as_str());
            groups.insert(name.to_string(), captured.to_string());
        }
        (groups, true)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.regex.as_str())
    }
}
