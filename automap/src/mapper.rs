//! Registers the routes of exposed objects with a [`Router`].
//!
//! ```
//! use automap::prelude::*;
//!
//! let mut mapper = Mapper::new();
//! mapper.register_type_handler("h", |raw| {
//!     i64::from_str_radix(raw, 16)
//!         .map(Value::Int)
//!         .map_err(|e| CoerceError::new("h", raw, e))
//! });
//!
//! let calc = Module::new("calc").function("double", &["x"], |x: i64| x * 2);
//! let mapped = mapper.map(&calc).unwrap();
//! assert_eq!(mapped, 1);
//! assert_eq!(mapper.routes()[0].path, "/calc/double");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use http::Method;

use crate::args::ArgumentParser;
use crate::coerce::TypeRegistry;
use crate::config::{CollisionPolicy, MapperConfig};
use crate::discovery;
use crate::endpoint::Endpoint;
use crate::error::{CoerceError, MapError};
use crate::introspection::{self, RouteInfo, RouteRegistry};
use crate::reflect::{Exposable, Route, traverse};
use crate::router::Router;
use crate::server;
use crate::value::Value;

/// Maps exposed objects onto a router.
///
/// Type handlers registered with [`register_type_handler`](Self::register_type_handler)
/// apply to objects mapped afterwards; routes already mapped keep the
/// registry they were mapped with.
pub struct Mapper {
    router: Router,
    registry: TypeRegistry,
    config: MapperConfig,
    routes: RouteRegistry,
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self::with_router(Router::new(), config)
    }

    /// Maps onto an existing router, keeping its routes.
    pub fn with_router(router: Router, config: MapperConfig) -> Self {
        Self {
            router,
            registry: TypeRegistry::new(),
            config,
            routes: RouteRegistry::new(),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Inserts or replaces the coercion function for `tag`.
    pub fn register_type_handler<F>(&mut self, tag: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Value, CoerceError> + Send + Sync + 'static,
    {
        self.registry.register(tag, func);
        self
    }

    /// Maps `obj` with the configured depth. Returns the number of routes
    /// registered.
    pub fn map<E: Exposable + ?Sized>(&mut self, obj: &E) -> Result<usize, MapError> {
        self.map_with_depth(obj, self.config.max_depth)
    }

    pub fn map_with_depth<E: Exposable + ?Sized>(
        &mut self,
        obj: &E,
        max_depth: usize,
    ) -> Result<usize, MapError> {
        let routes = traverse(obj, max_depth);

        for route in &routes {
            check_segments(route)?;
        }
        if self.config.on_collision == CollisionPolicy::Reject {
            self.check_collisions(routes.iter().map(|r| r.path()))?;
        }

        let parser = Arc::new(ArgumentParser::new(
            Arc::new(self.registry.clone()),
            &self.config,
        ));

        let mut registered = 0;
        for route in routes {
            let kind = route.kind();
            let endpoint = Endpoint::new(route, parser.clone());
            for method in &self.config.methods {
                let handler = {
                    let endpoint = endpoint.clone();
                    move |parts: http::request::Parts| {
                        let endpoint = endpoint.clone();
                        async move { endpoint.respond(parts.uri.query()) }
                    }
                };
                if self.router.insert(method.clone(), endpoint.path(), handler) {
                    tracing::warn!(method = %method, path = endpoint.path(), "route overwritten");
                }
                tracing::debug!(method = %method, path = endpoint.path(), ?kind, "route registered");
                self.routes
                    .record(RouteInfo::new(method.as_str(), endpoint.path(), kind));
                registered += 1;
            }
        }

        tracing::info!(module = obj.name(), routes = registered, "mapped");
        Ok(registered)
    }

    /// Maps every type registered with `#[expose(discover)]`.
    pub fn discover(&mut self) -> Result<usize, MapError> {
        let mut registered = 0;
        for descriptor in discovery::descriptors() {
            let obj = (descriptor.build)();
            registered += self.map(&obj)?;
        }
        Ok(registered)
    }

    /// Metadata of every route registered so far.
    pub fn routes(&self) -> &[RouteInfo] {
        self.routes.routes()
    }

    /// Finishes mapping. Adds the introspection route when enabled.
    pub fn into_router(self) -> Router {
        let Mapper {
            mut router,
            config,
            routes,
            ..
        } = self;

        if !config.introspection {
            return router;
        }

        if router.contains(&Method::GET, introspection::ROUTES_PATH) {
            if config.on_collision == CollisionPolicy::Reject {
                tracing::warn!(
                    path = introspection::ROUTES_PATH,
                    "route already registered, introspection not mounted"
                );
                return router;
            }
            tracing::warn!(path = introspection::ROUTES_PATH, "route overwritten by introspection");
        }

        let registry = Arc::new(routes);
        router.insert(Method::GET, introspection::ROUTES_PATH, move |_| {
            let registry = registry.clone();
            async move { introspection::list_routes(&registry) }
        });
        router
    }

    pub async fn listen(self, addr: &str) -> std::io::Result<()> {
        server::serve(self.into_router(), addr).await
    }

    fn check_collisions(&self, paths: impl Iterator<Item = String>) -> Result<(), MapError> {
        let mut seen = HashSet::new();
        for path in paths {
            for method in &self.config.methods {
                let reserved = self.config.introspection
                    && *method == Method::GET
                    && path == introspection::ROUTES_PATH;
                if reserved
                    || self.router.contains(method, &path)
                    || !seen.insert((method.clone(), path.clone()))
                {
                    return Err(MapError::DuplicateRoute {
                        method: method.clone(),
                        path,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Routes are matched against the raw request path, so every segment must
/// be non-empty and spelled with characters a path carries unescaped.
fn check_segments(route: &Route) -> Result<(), MapError> {
    let invalid = route.segments().iter().find(|segment| {
        segment.is_empty()
            || !segment.bytes().all(|b| {
                b.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@".contains(&b)
            })
    });

    match invalid {
        Some(segment) => Err(MapError::InvalidSegment {
            path: route.path(),
            segment: segment.clone(),
        }),
        None => Ok(()),
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Kind, Module};
    use crate::testing::TestClient;

    fn math() -> Module {
        Module::new("math")
            .function("sqrt", &["x"], f64::sqrt)
            .value("pi", std::f64::consts::PI)
    }

    #[test]
    fn test_map_registers_routes() {
        let mut mapper = Mapper::new();
        assert_eq!(mapper.map(&math()), Ok(2));

        let paths: Vec<_> = mapper.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["/math/pi", "/math/sqrt"]);
        assert_eq!(mapper.routes()[0].kind, Kind::Value);
        assert_eq!(mapper.routes()[0].method, "GET");
    }

    #[test]
    fn test_collision_rejected_before_registering() {
        let mut mapper = Mapper::new();
        mapper.map(&Module::new("math").value("pi", 3)).unwrap();

        let err = mapper.map(&math()).unwrap_err();
        assert_eq!(
            err,
            MapError::DuplicateRoute {
                method: Method::GET,
                path: "/math/pi".into()
            }
        );
        // Nothing from the rejected object was added.
        assert_eq!(mapper.routes().len(), 1);
    }

    #[test]
    fn test_duplicate_member_names_rejected() {
        let mut mapper = Mapper::new();
        let module = Module::new("m").value("x", 1).value("x", 2);
        assert!(mapper.map(&module).is_err());
    }

    #[test]
    fn test_collision_overwrite_policy() {
        let config = MapperConfig {
            on_collision: CollisionPolicy::Overwrite,
            ..MapperConfig::default()
        };
        let mut mapper = Mapper::with_config(config);
        mapper.map(&Module::new("math").value("pi", 3)).unwrap();
        assert_eq!(mapper.map(&math()), Ok(2));
        assert_eq!(mapper.routes().len(), 2);
    }

    #[test]
    fn test_multiple_methods() {
        let config = MapperConfig {
            methods: vec![Method::GET, Method::POST],
            ..MapperConfig::default()
        };
        let mut mapper = Mapper::with_config(config);
        assert_eq!(mapper.map(&math()), Ok(4));
        let router = mapper.into_router();
        assert!(router.contains(&Method::POST, "/math/sqrt"));
    }

    #[test]
    fn test_map_with_depth_zero() {
        let mut mapper = Mapper::new();
        assert_eq!(mapper.map_with_depth(&math(), 0), Ok(0));
    }

    #[test]
    fn test_unsafe_names_rejected_before_registering() {
        let mut mapper = Mapper::new();
        let module = Module::new("ok")
            .value("fine", 1)
            .module("nested", Module::new("my module").value("x", 1));

        assert_eq!(
            mapper.map(&module),
            Err(MapError::InvalidSegment {
                path: "/ok/my module/x".into(),
                segment: "my module".into(),
            })
        );
        assert!(mapper.routes().is_empty());

        for name in ["caf\u{e9}", "a/b", "", "50%"] {
            let module = Module::new("m").value(name, 1);
            assert!(
                matches!(mapper.map(&module), Err(MapError::InvalidSegment { .. })),
                "{name:?}"
            );
        }
        assert_eq!(mapper.map(&Module::new("m").value("v1.2~x", 1)), Ok(1));
    }

    fn introspecting(policy: CollisionPolicy) -> Mapper {
        Mapper::with_config(MapperConfig {
            introspection: true,
            on_collision: policy,
            ..MapperConfig::default()
        })
    }

    fn shadow() -> Module {
        Module::new("__automap").value("routes", "mine")
    }

    #[test]
    fn test_introspection_path_reserved_under_reject() {
        let mut mapper = introspecting(CollisionPolicy::Reject);
        assert_eq!(
            mapper.map(&shadow()),
            Err(MapError::DuplicateRoute {
                method: Method::GET,
                path: introspection::ROUTES_PATH.into(),
            })
        );

        // Only GET is reserved.
        let mut mapper = Mapper::with_config(MapperConfig {
            introspection: true,
            methods: vec![Method::POST],
            ..MapperConfig::default()
        });
        assert_eq!(mapper.map(&shadow()), Ok(1));
    }

    #[tokio::test]
    async fn test_introspection_overwrites_under_overwrite() {
        let mut mapper = introspecting(CollisionPolicy::Overwrite);
        assert_eq!(mapper.map(&shadow()), Ok(1));

        let client = TestClient::new(mapper.into_router());
        let response = client.get(introspection::ROUTES_PATH).send().await;
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_existing_route_kept_under_reject() {
        let router = Router::new().get(introspection::ROUTES_PATH, |_| async { "custom" });
        let mapper = Mapper::with_router(
            router,
            MapperConfig {
                introspection: true,
                ..MapperConfig::default()
            },
        );

        let client = TestClient::new(mapper.into_router());
        let response = client.get(introspection::ROUTES_PATH).send().await;
        assert_eq!(response.text(), "custom");
    }

    #[test]
    fn test_introspection_route_only_when_enabled() {
        let mut mapper = Mapper::new();
        mapper.map(&math()).unwrap();
        assert!(!mapper.into_router().contains(&Method::GET, introspection::ROUTES_PATH));

        let config = MapperConfig {
            introspection: true,
            ..MapperConfig::default()
        };
        let mut mapper = Mapper::with_config(config);
        mapper.map(&math()).unwrap();
        assert!(mapper.into_router().contains(&Method::GET, introspection::ROUTES_PATH));
    }
}
