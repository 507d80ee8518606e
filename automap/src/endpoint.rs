//! Request handlers generated for mapped routes.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use http::{Response, StatusCode};

use crate::args::ArgumentParser;
use crate::error::{CallError, Error};
use crate::reflect::{Route, Target};
use crate::response::{self, BoxBody, IntoResponse};
use crate::value::Value;

/// Serves one mapped route: invokes its function with arguments parsed from
/// the query string, or returns its value snapshot.
#[derive(Clone)]
pub struct Endpoint {
    path: Arc<str>,
    target: Target,
    parser: Arc<ArgumentParser>,
}

impl Endpoint {
    pub fn new(route: Route, parser: Arc<ArgumentParser>) -> Self {
        Self {
            path: route.path().into(),
            target: route.into_target(),
            parser,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Produces the value this endpoint serves for `query`.
    ///
    /// A panic inside the function is caught and reported like any other
    /// failure.
    pub fn invoke(&self, query: Option<&str>) -> Result<Value, CallError> {
        match &self.target {
            Target::Value(value) => Ok(value.clone()),
            Target::Function(func) => {
                let args = self.parser.parse(query)?;
                tracing::debug!(
                    path = %self.path,
                    positional = args.positional.len(),
                    keyword = args.keyword.len(),
                    "invoking"
                );
                catch_unwind(AssertUnwindSafe(|| func.call(args)))
                    .unwrap_or_else(|payload| Err(CallError::Panicked(panic_message(payload))))
            }
        }
    }

    /// `200` with the result's text, or `500` with the error's text.
    pub fn respond(&self, query: Option<&str>) -> Response<BoxBody> {
        match self.invoke(query) {
            Ok(value) => response::text(StatusCode::OK, value.to_string()),
            Err(err) => {
                tracing::warn!(path = %self.path, error = %err, "call failed");
                Error::from(err).into_response()
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
