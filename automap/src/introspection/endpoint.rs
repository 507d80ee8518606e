//! Introspection endpoint listing mapped routes.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Response, StatusCode};

use crate::introspection::RouteInfo;
use crate::response::{self, BoxBody};

pub const ROUTES_PATH: &str = "/__automap/routes";

/// Every route registered by a mapper, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteInfo>,
    index: HashMap<(String, String), usize>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routes(routes: Vec<RouteInfo>) -> Self {
        let mut registry = Self::new();
        for info in routes {
            registry.record(info);
        }
        registry
    }

    /// Records a route, replacing an earlier entry with the same method and
    /// path in place.
    pub fn record(&mut self, info: RouteInfo) {
        let key = (info.method.clone(), info.path.clone());
        if let Some(&at) = self.index.get(&key) {
            self.routes[at] = info;
            return;
        }
        self.index.insert(key, self.routes.len());
        self.routes.push(info);
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }
}

/// Returns all registered routes as JSON.
pub fn list_routes(registry: &Arc<RouteRegistry>) -> Response<BoxBody> {
    response::json(StatusCode::OK, &registry.routes())
}
