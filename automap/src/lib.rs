//! Expose the functions and values of in-memory objects as HTTP endpoints.
//!
//! An object describes its members through [`Exposable`]; the [`Mapper`]
//! walks them and registers one `GET` route per public function or value:
//!
//! - functions at `/<object>/<name>`, taking keyword arguments from the query
//!   string and positional arguments from `_args=a;b;c`,
//! - values at `/<object>/<name>`, returning the value captured at mapping time,
//! - nested modules as extra path segments, up to a depth limit.
//!
//! Arguments are strings unless prefixed with a type tag: `i:3`, `f:2.5`,
//! `c:1+2j`, `b:yes`, `s:text`. More tags can be registered with
//! [`Mapper::register_type_handler`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use automap::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let math = Module::new("math")
//!         .function("add", &["a", "b"], |a: i64, b: i64| a + b)
//!         .value("pi", std::f64::consts::PI);
//!
//!     let mut mapper = Mapper::new();
//!     mapper.map(&math).expect("no route collisions");
//!
//!     // GET /math/add?_args=i:3;i:4  ->  7
//!     mapper.listen("127.0.0.1:3000").await
//! }
//! ```

extern crate self as automap;

pub mod args;
pub mod coerce;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod function;
pub mod introspection;
pub mod logging;
pub mod mapper;
pub mod reflect;
pub mod response;
pub mod router;
pub mod server;
pub mod testing;
pub mod value;

pub use args::Arguments;
pub use automap_macros::expose;
pub use error::{CallError, CoerceError, Error, MapError, Result};
pub use function::{Callable, Function};
pub use mapper::Mapper;
pub use reflect::{Exposable, Member, Module, traverse};
pub use value::{Complex, FromArg, IntoValue, Value};

#[doc(hidden)]
pub use inventory;

pub mod prelude {
    pub use crate::args::Arguments;
    pub use crate::coerce::{FallbackPolicy, TypeRegistry};
    pub use crate::config::{CollisionPolicy, MapperConfig, ServerConfig, load_dotenv};
    pub use crate::error::{CallError, CoerceError, Error, MapError};
    pub use crate::function::{Callable, Function};
    pub use crate::mapper::Mapper;
    pub use crate::reflect::{Exposable, Member, Module, traverse};
    pub use crate::router::Router;
    pub use crate::value::{Complex, IntoValue, Value};
    pub use automap_macros::expose;
    pub use http::{Method, StatusCode};
}
