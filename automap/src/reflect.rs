//! Member discovery and route synthesis.
//!
//! An object takes part in mapping by implementing [`Exposable`]: it has a
//! name and lists its members. Each [`Member`] is a function, a nested module
//! or a plain value. [`traverse`] walks the object graph depth-first and
//! returns one [`Route`] per reachable function or value.
//!
//! Objects can implement [`Exposable`] by hand, through the `#[expose]`
//! attribute, or be assembled with the [`Module`] builder:
//!
//! ```
//! use automap::reflect::{Module, traverse};
//!
//! let math = Module::new("math")
//!     .function("add", &["a", "b"], |a: i64, b: i64| a + b)
//!     .value("pi", std::f64::consts::PI)
//!     .module("trig", Module::new("trig").function("sin", &["x"], f64::sin));
//!
//! let paths: Vec<String> = traverse(&math, 5).iter().map(|r| r.path()).collect();
//! assert_eq!(paths, ["/math/add", "/math/pi", "/math/trig/sin"]);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::args::Arguments;
use crate::function::{Callable, Function, TypedFn};
use crate::value::{IntoOutput, IntoValue, Value};

/// An object whose members can be mapped to endpoints.
pub trait Exposable: Send + Sync + 'static {
    /// The object's own name, used as the first path segment when it is the
    /// root of a mapping.
    fn name(&self) -> &str;

    /// The object's members. Called once per traversal.
    fn members(&self) -> Vec<Member>;
}

impl<T: Exposable + ?Sized> Exposable for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn members(&self) -> Vec<Member> {
        (**self).members()
    }
}

impl<T: Exposable + ?Sized> Exposable for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn members(&self) -> Vec<Member> {
        (**self).members()
    }
}

/// Classification of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Function,
    Module,
    Value,
}

/// What a member holds.
#[derive(Clone)]
pub enum MemberKind {
    Function(Arc<dyn Callable>),
    Module(Arc<dyn Exposable>),
    Value(Value),
}

/// A named member discovered on an object.
#[derive(Clone)]
pub struct Member {
    name: String,
    kind: MemberKind,
}

impl Member {
    pub fn function(name: impl Into<String>, func: impl Callable) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Function(Arc::new(func)),
        }
    }

    /// A nested module. Its routes are prefixed with the module's own name;
    /// `name` only orders it among its siblings and can mark it private.
    pub fn module(name: impl Into<String>, module: impl Exposable) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Module(Arc::new(module)),
        }
    }

    /// A plain value. It is converted now, so later changes to its source are
    /// never observed.
    pub fn value(name: impl Into<String>, value: impl IntoValue) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Value(value.into_value()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        match self.kind {
            MemberKind::Function(_) => Kind::Function,
            MemberKind::Module(_) => Kind::Module,
            MemberKind::Value(_) => Kind::Value,
        }
    }

    /// Members whose name starts with `_` are never exposed.
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn into_parts(self) -> (String, MemberKind) {
        (self.name, self.kind)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// An explicit table of members.
#[derive(Clone)]
pub struct Module {
    name: String,
    members: Vec<Member>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a typed function; see [`Function::new`].
    pub fn function<F, Args>(mut self, name: impl Into<String>, params: &[&str], f: F) -> Self
    where
        F: TypedFn<Args>,
    {
        self.members
            .push(Member::function(name, Function::new(params, f)));
        self
    }

    /// Adds a function receiving its [`Arguments`] unbound.
    pub fn variadic<F, R>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> R + Send + Sync + 'static,
        R: IntoOutput,
    {
        self.members
            .push(Member::function(name, Function::variadic(f)));
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.members.push(Member::value(name, value));
        self
    }

    pub fn module(mut self, name: impl Into<String>, module: impl Exposable) -> Self {
        self.members.push(Member::module(name, module));
        self
    }

    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }
}

impl Exposable for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Vec<Member> {
        self.members.clone()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish()
    }
}

/// What a route serves.
#[derive(Clone)]
pub enum Target {
    Function(Arc<dyn Callable>),
    /// Captured at mapping time.
    Value(Value),
}

/// A path and what it serves, produced by [`traverse`].
#[derive(Clone)]
pub struct Route {
    segments: Vec<String>,
    target: Target,
}

impl Route {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn path(&self) -> String {
        self.segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        })
    }

    pub fn kind(&self) -> Kind {
        match self.target {
            Target::Function(_) => Kind::Function,
            Target::Value(_) => Kind::Value,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn into_target(self) -> Target {
        self.target
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Walks `obj` and returns a route for every public function and value
/// reachable through at most `max_depth` levels of modules.
///
/// Paths are `/<obj name>/<member>` for direct members and gain one segment
/// per nested module, taken from the module's own [`Exposable::name`]. Members are visited in name order. A depth of 0
/// yields nothing; modules past the limit are dropped silently.
pub fn traverse<E: Exposable + ?Sized>(obj: &E, max_depth: usize) -> Vec<Route> {
    let mut routes = Vec::new();
    let mut prefix = vec![obj.name().to_string()];
    walk(obj, max_depth, &mut prefix, &mut routes);
    routes
}

fn walk<E: Exposable + ?Sized>(
    obj: &E,
    depth: usize,
    prefix: &mut Vec<String>,
    routes: &mut Vec<Route>,
) {
    if depth == 0 {
        tracing::trace!(module = %prefix.join("/"), "depth limit reached");
        return;
    }

    let mut members = obj.members();
    members.sort_by(|a, b| a.name.cmp(&b.name));

    for member in members {
        if member.is_private() {
            tracing::trace!(member = %member.name, "skipping private member");
            continue;
        }

        let (name, kind) = member.into_parts();
        match kind {
            MemberKind::Function(func) => {
                routes.push(route(prefix, name, Target::Function(func)));
            }
            MemberKind::Value(value) => {
                routes.push(route(prefix, name, Target::Value(value)));
            }
            MemberKind::Module(module) => {
                prefix.push(module.name().to_string());
                walk(module.as_ref(), depth - 1, prefix, routes);
                prefix.pop();
            }
        }
    }
}

fn route(prefix: &[String], name: String, target: Target) -> Route {
    let mut segments = prefix.to_vec();
    segments.push(name);
    Route { segments, target }
}
