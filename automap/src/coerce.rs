//! Type-tag coercion of string arguments.
//!
//! Query arguments arrive as text. An argument written as `<tag>:<raw>` is
//! decoded by the coercion function registered under `tag`; anything else
//! stays a string. The built-in tags are:
//!
//! | tag | result |
//! |-----|--------|
//! | `i` | integer |
//! | `f` | float |
//! | `c` | complex (`1+2j`) |
//! | `s` | string, unchanged |
//! | `b` | `true` if the text is one of `true t yes y 1` (any case) |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CoerceError;
use crate::value::{Complex, Value};

type CoerceFn = dyn Fn(&str) -> Result<Value, CoerceError> + Send + Sync;

const TRUTHY: [&str; 5] = ["true", "t", "yes", "y", "1"];

/// What to do with `<tag>:<raw>` when `tag` is not registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Pass `raw`, the text after the first colon.
    #[default]
    StripTag,
    /// Pass the whole argument text, tag and colon included.
    Verbatim,
}

/// Mapping from type tag to coercion function.
///
/// Cloning is cheap: entries are shared. The mapper hands each `map()` call
/// its own clone, so later registrations never reach already-mapped routes.
#[derive(Clone)]
pub struct TypeRegistry {
    handlers: HashMap<String, Arc<CoerceFn>>,
}

impl TypeRegistry {
    /// A registry holding only the built-in tags.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("i", |raw| {
            raw.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| CoerceError::new("i", raw, e))
        });
        registry.register("f", |raw| {
            raw.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| CoerceError::new("f", raw, e))
        });
        registry.register("c", |raw| {
            raw.parse::<Complex>()
                .map(Value::Complex)
                .map_err(|e| CoerceError::new("c", raw, e))
        });
        registry.register("s", |raw| Ok(Value::Str(raw.to_owned())));
        registry.register("b", |raw| {
            let lowered = raw.to_lowercase();
            Ok(Value::Bool(TRUTHY.contains(&lowered.as_str())))
        });
        registry
    }

    /// A registry with no tags at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Inserts or replaces the coercion function for `tag`.
    pub fn register<F>(&mut self, tag: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Value, CoerceError> + Send + Sync + 'static,
    {
        let tag = tag.into();
        if self.handlers.insert(tag.clone(), Arc::new(func)).is_some() {
            tracing::debug!(tag = %tag, "replaced type handler");
        }
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Decodes `raw` with the function registered for `tag`, or returns it
    /// unchanged as a string when `tag` is unknown.
    pub fn coerce(&self, tag: &str, raw: &str) -> Result<Value, CoerceError> {
        match self.handlers.get(tag) {
            Some(func) => func(raw),
            None => Ok(Value::Str(raw.to_owned())),
        }
    }

    /// Decodes one argument as written in the query: `<tag>:<raw>` or a bare
    /// string. The text is split on the first colon only.
    pub fn decode(&self, arg: &str, fallback: FallbackPolicy) -> Result<Value, CoerceError> {
        let Some((tag, raw)) = arg.split_once(':') else {
            return Ok(Value::Str(arg.to_owned()));
        };
        if !self.contains(tag) && fallback == FallbackPolicy::Verbatim {
            return Ok(Value::Str(arg.to_owned()));
        }
        self.coerce(tag, raw)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
