use std::fmt;

use http::{Method, StatusCode};

use crate::response::{self, BoxBody, IntoResponse};

/// An HTTP-facing error: a status code and the text sent back as the body.
#[derive(Debug)]
pub struct Error {
    pub status: u16,
    pub message: String,
}

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: msg.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> http::Response<BoxBody> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        response::text(status, self.message)
    }
}

/// Every request-time failure is reported as a server error, whether the
/// query was malformed or the callable itself failed.
impl From<CallError> for Error {
    fn from(err: CallError) -> Self {
        Error::internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A registered coercion function rejected its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot coerce '{raw}' with tag '{tag}': {reason}")]
pub struct CoerceError {
    pub tag: String,
    pub raw: String,
    pub reason: String,
}

impl CoerceError {
    pub fn new(tag: impl Into<String>, raw: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            tag: tag.into(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure while turning a request into a call, or raised by the call itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    #[error(transparent)]
    Coerce(#[from] CoerceError),

    #[error("takes {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    #[error("got multiple values for argument '{0}'")]
    DuplicateArgument(String),

    #[error("missing required argument: '{0}'")]
    MissingArgument(String),

    #[error("argument '{param}' must be {expected}, not {found}")]
    TypeMismatch {
        param: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(String),

    #[error("callable panicked: {0}")]
    Panicked(String),
}

impl CallError {
    /// Wraps an arbitrary error raised by a callable.
    pub fn failed(err: impl fmt::Display) -> Self {
        CallError::Failed(err.to_string())
    }
}

/// Failure while registering mapped routes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: Method, path: String },

    #[error("'{segment}' in {path} is not a valid URL path segment")]
    InvalidSegment { path: String, segment: String },
}

/// An environment variable held a value that could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}
