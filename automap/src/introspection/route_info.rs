//! Route metadata for introspection.

use serde::Serialize;

use crate::reflect::Kind;

/// Metadata about a mapped route.
///
/// # Examples
///
/// ```
/// use automap::introspection::RouteInfo;
/// use automap::reflect::Kind;
///
/// let info = RouteInfo::new("GET", "/math/sqrt", Kind::Function);
/// assert_eq!(info.method, "GET");
/// assert_eq!(info.path, "/math/sqrt");
/// ```
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteInfo {
    /// The HTTP method the route answers to.
    pub method: String,
    /// The full route path.
    pub path: String,
    /// Whether the route calls a function or returns a value.
    pub kind: Kind,
}

impl RouteInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>, kind: Kind) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_info_new() {
        let info = RouteInfo::new("GET", "/math/pi", Kind::Value);
        assert_eq!(info.method, "GET");
        assert_eq!(info.path, "/math/pi");
        assert_eq!(info.kind, Kind::Value);
    }

    #[test]
    fn test_route_info_serialize() {
        let info = RouteInfo::new("GET", "/math/sqrt", Kind::Function);
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"method\":\"GET\""));
        assert!(json.contains("\"path\":\"/math/sqrt\""));
        assert!(json.contains("\"kind\":\"function\""));
    }
}
