use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::request::Parts;
use http::{Method, Request, Response, StatusCode};

use crate::response::{BoxBody, IntoResponse};

type BoxFuture = Pin<Box<dyn Future<Output = Response<BoxBody>> + Send>>;
type HandlerFn = Arc<dyn Fn(Parts) -> BoxFuture + Send + Sync>;

/// Exact-match route table keyed by method and path.
///
/// Handlers receive the request head only; mapped endpoints read their
/// arguments from the query string.
#[derive(Clone)]
pub struct Router {
    routes: HashMap<(Method, String), HandlerFn>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn route<F, Fut, Out>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Parts) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.insert(method, path, handler);
        self
    }

    /// Registers a handler in place, returning `true` if it replaced one.
    pub fn insert<F, Fut, Out>(&mut self, method: Method, path: &str, handler: F) -> bool
    where
        F: Fn(Parts) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        let handler: HandlerFn = Arc::new(move |parts: Parts| {
            let handler = handler.clone();
            Box::pin(async move {
                let output = handler(parts).await;
                output.into_response()
            }) as BoxFuture
        });

        self.routes
            .insert((method, path.to_string()), handler)
            .is_some()
    }

    pub fn get<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Parts) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Parts) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.contains_key(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatches a request. The body is dropped unread.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<BoxBody> {
        let (parts, _body) = req.into_parts();
        let key = (parts.method.clone(), parts.uri.path().to_string());

        match self.routes.get(&key) {
            Some(handler) => handler(parts).await,
            None => {
                tracing::debug!(method = %key.0, path = %key.1, "no route matched");
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
