//! Introspection of mapped routes.
//!
//! When enabled, the mapper serves every route it registered as JSON at
//! [`ROUTES_PATH`].

mod endpoint;
mod route_info;

pub use endpoint::{ROUTES_PATH, RouteRegistry, list_routes};
pub use route_info::RouteInfo;
