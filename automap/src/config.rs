//! Mapper and server configuration.
//!
//! Both structs have sensible defaults and can be read from `AUTOMAP_*`
//! environment variables. Call [`load_dotenv`] first to pick up a `.env` file.
//!
//! | variable | default |
//! |----------|---------|
//! | `AUTOMAP_MAX_DEPTH` | `5` |
//! | `AUTOMAP_POSITIONAL_KEY` | `_args` |
//! | `AUTOMAP_SEPARATOR` | `;` |
//! | `AUTOMAP_METHODS` | `GET` (comma separated) |
//! | `AUTOMAP_ON_COLLISION` | `reject` (`reject` or `overwrite`) |
//! | `AUTOMAP_UNKNOWN_TAG` | `strip` (`strip` or `verbatim`) |
//! | `AUTOMAP_INTROSPECTION` | `false` |
//! | `AUTOMAP_HOST` | `127.0.0.1` |
//! | `AUTOMAP_PORT` | `3000` |

use std::env;
use std::str::FromStr;

use http::Method;

use crate::coerce::FallbackPolicy;
use crate::error::ConfigError;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_POSITIONAL_KEY: &str = "_args";

/// Loads variables from a `.env` file in the working directory, if present.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }
}

/// What `map()` does when a generated route is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail the whole `map()` call before registering anything.
    #[default]
    Reject,
    /// Replace the existing route.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapperConfig {
    /// Recursion bound for nested modules.
    pub max_depth: usize,
    /// Query key carrying positional arguments.
    pub positional_key: String,
    /// Separator between positional arguments.
    pub separator: char,
    /// Methods every generated route answers to.
    pub methods: Vec<Method>,
    pub on_collision: CollisionPolicy,
    pub fallback: FallbackPolicy,
    /// Serve the route listing at `/__automap/routes`.
    pub introspection: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            positional_key: DEFAULT_POSITIONAL_KEY.to_string(),
            separator: ';',
            methods: vec![Method::GET],
            on_collision: CollisionPolicy::Reject,
            fallback: FallbackPolicy::StripTag,
            introspection: false,
        }
    }
}

impl MapperConfig {
    /// Reads overrides from the environment; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(depth) = var("AUTOMAP_MAX_DEPTH") {
            config.max_depth = parse("AUTOMAP_MAX_DEPTH", &depth)?;
        }
        if let Some(key) = var("AUTOMAP_POSITIONAL_KEY") {
            config.positional_key = key;
        }
        if let Some(sep) = var("AUTOMAP_SEPARATOR") {
            config.separator = parse("AUTOMAP_SEPARATOR", &sep)?;
        }
        if let Some(methods) = var("AUTOMAP_METHODS") {
            config.methods = methods
                .split(',')
                .map(|m| {
                    Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                        .map_err(|e| invalid("AUTOMAP_METHODS", &methods, e))
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(policy) = var("AUTOMAP_ON_COLLISION") {
            config.on_collision = match policy.to_ascii_lowercase().as_str() {
                "reject" => CollisionPolicy::Reject,
                "overwrite" => CollisionPolicy::Overwrite,
                _ => {
                    return Err(invalid(
                        "AUTOMAP_ON_COLLISION",
                        &policy,
                        "expected reject or overwrite",
                    ));
                }
            };
        }
        if let Some(policy) = var("AUTOMAP_UNKNOWN_TAG") {
            config.fallback = match policy.to_ascii_lowercase().as_str() {
                "strip" => FallbackPolicy::StripTag,
                "verbatim" => FallbackPolicy::Verbatim,
                _ => {
                    return Err(invalid(
                        "AUTOMAP_UNKNOWN_TAG",
                        &policy,
                        "expected strip or verbatim",
                    ));
                }
            };
        }
        if let Some(flag) = var("AUTOMAP_INTROSPECTION") {
            config.introspection = parse("AUTOMAP_INTROSPECTION", &flag)?;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = var("AUTOMAP_HOST") {
            config.host = host;
        }
        if let Some(port) = var("AUTOMAP_PORT") {
            config.port = parse("AUTOMAP_PORT", &port)?;
        }
        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(key, value, e))
}

fn invalid(key: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
