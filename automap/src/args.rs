//! Query-string argument parsing.
//!
//! Keyword arguments are ordinary query pairs (`x=f:2.5`); positional
//! arguments travel in a single reserved key, `_args=i:3;i:4` by default.

use std::sync::Arc;

use crate::coerce::{FallbackPolicy, TypeRegistry};
use crate::config::MapperConfig;
use crate::error::CallError;
use crate::value::Value;

/// Arguments for one call: positional values first, then keywords in query
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keyword.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns a raw query string into [`Arguments`] using a registry snapshot.
#[derive(Debug, Clone)]
pub struct ArgumentParser {
    registry: Arc<TypeRegistry>,
    positional_key: String,
    separator: char,
    fallback: FallbackPolicy,
}

impl ArgumentParser {
    pub fn new(registry: Arc<TypeRegistry>, config: &MapperConfig) -> Self {
        Self {
            registry,
            positional_key: config.positional_key.clone(),
            separator: config.separator,
            fallback: config.fallback,
        }
    }

    /// Parses `query` (without the leading `?`).
    ///
    /// When a key repeats, its first occurrence wins. An empty positional
    /// value means no positional arguments.
    pub fn parse(&self, query: Option<&str>) -> Result<Arguments, CallError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.unwrap_or(""))
            .map_err(|e| CallError::MalformedQuery(e.to_string()))?;

        let mut args = Arguments::new();
        let mut seen_positional = false;

        for (key, raw) in pairs {
            if key == self.positional_key {
                if seen_positional {
                    continue;
                }
                seen_positional = true;
                if raw.is_empty() {
                    continue;
                }
                for part in raw.split(self.separator) {
                    args.positional
                        .push(self.registry.decode(part, self.fallback)?);
                }
            } else if args.get(&key).is_none() {
                let value = self.registry.decode(&raw, self.fallback)?;
                args.keyword.push((key, value));
            }
        }

        Ok(args)
    }
}
