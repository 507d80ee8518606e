//! In-process client for exercising a [`Router`] in tests.
//!
//! ```ignore
//! let client = TestClient::new(mapper.into_router());
//! let response = client.get("/math/add?_args=i:1;i:2").send().await;
//! assert_eq!(response.text(), "3");
//! ```

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::router::Router;

/// Sends requests straight to a router, without a socket.
#[derive(Clone)]
pub struct TestClient {
    router: Arc<Router>,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        self.request(Method::GET, uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest {
        self.request(Method::POST, uri)
    }

    pub fn request(&self, method: Method, uri: &str) -> TestRequest {
        TestRequest {
            router: self.router.clone(),
            method,
            uri: uri.to_string(),
        }
    }
}

pub struct TestRequest {
    router: Arc<Router>,
    method: Method,
    uri: String,
}

impl TestRequest {
    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the URI is invalid.
    pub async fn send(self) -> TestResponse {
        let request = Request::builder()
            .method(self.method)
            .uri(&self.uri)
            .body(())
            .unwrap_or_else(|e| panic!("invalid test request {}: {e}", self.uri));

        let response = self.router.handle(request).await;
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// # Panics
    ///
    /// Panics if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("response body is not valid JSON: {e}"))
    }
}
