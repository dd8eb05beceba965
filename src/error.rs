//! Error types for the request-execution core.
//!
//! This module provides [`ClientError`], the error type returned by
//! [`ApiClient::execute`](crate::ApiClient::execute), plus the supporting
//! pieces of the error taxonomy:
//! - [`ConfigError`]: a bug in an endpoint descriptor, always fatal
//! - [`ApiError`] / [`ApiFailure`]: a structured failure reported by the server
//!
//! Auth selection errors live in [`crate::auth::AuthError`]; transport errors
//! in [`crate::transport::TransportError`]. Both fold into [`ClientError`].

use std::collections::BTreeMap;

use http::StatusCode;
use serde::Deserialize;

use crate::auth::AuthError;
use crate::transport::TransportError;

/// Errors surfaced by a single endpoint call.
///
/// The generic parameter `E` is the endpoint's declared failure type and
/// defaults to [`ApiError`]. Callers branch on the variant to distinguish
/// recoverable conditions (API errors, auth misconfiguration) from fatal
/// ones (endpoint descriptor bugs).
#[derive(Debug, thiserror::Error)]
pub enum ClientError<E = ApiError> {
    /// No registered auth method satisfied the endpoint, or credentials
    /// could not be applied.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The endpoint descriptor is invalid. Indicates a programming mistake,
    /// not a runtime condition; never retry.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection-level failure, passed through from the transport unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response body could not be deserialized into the declared type.
    #[error("decode error: {0}")]
    Decode(String),

    /// The server reported a failure status; `E` carries the decoded body.
    #[error(transparent)]
    Api(E),
}

impl<E: ApiFailure> ClientError<E> {
    /// The HTTP status of the failure, when the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api(e) => Some(e.status()),
            _ => None,
        }
    }

    /// Whether this error came from the API itself (as opposed to the
    /// client, its configuration, or the transport).
    pub fn is_api(&self) -> bool {
        matches!(self, ClientError::Api(_))
    }
}

/// A defect in an endpoint descriptor.
///
/// These are raised as early as possible, ideally from
/// [`EndpointBuilder::build`](crate::endpoint::EndpointBuilder::build), and
/// never deep inside response parsing when avoidable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The endpoint declared an HTTP verb the core does not dispatch.
    #[error("unsupported request method: {0}")]
    UnsupportedMethod(String),

    /// The endpoint was built without a path function.
    #[error("endpoint declared without a path function")]
    MissingPath,

    /// The endpoint was built without a request method.
    #[error("endpoint declared without a request method")]
    MissingMethod,

    /// The endpoint accepts no auth method kinds.
    #[error("endpoint declared without any acceptable auth method")]
    MissingAuth,

    /// The path function produced something that does not parse as a URL.
    #[error("path function produced an invalid URL: {0}")]
    InvalidUrl(String),

    /// A configured header override is not a legal header value.
    #[error("invalid header value for {name}: {value:?}")]
    InvalidHeader { name: &'static str, value: String },

    /// A signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The declared response type has no strategy for the response that
    /// arrived (e.g. a redirect for a non-string type, or a JSON body for a
    /// type without a JSON decoder). The endpoint was declared incorrectly.
    #[error("unhandled response type: {0}")]
    UnhandledResponseType(&'static str),
}

/// A failure type that can be manufactured from a raw error response.
///
/// Implementations must be total: construction succeeds for any body the
/// server sent (malformed JSON, HTML, empty) and preserves the raw text, so
/// that a bad error body never masks the original status code.
pub trait ApiFailure: std::error::Error + Send + Sync + 'static {
    /// Build the failure from the response status and body text.
    fn from_response(status: StatusCode, body: &str) -> Self
    where
        Self: Sized;

    /// The HTTP status the server reported.
    fn status(&self) -> StatusCode;
}

/// The generic API failure, shaped after RFC 7807 problem details.
///
/// Fields the server did not supply are `None`; anything outside the
/// well-known field set is preserved in [`ProblemDetails::extensions`].
/// The raw body text is always retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    problem: Option<ProblemDetails>,
    body: String,
}

/// Structured fields of an error body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProblemDetails {
    /// Problem type identifier (the `type` member).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Short human-readable summary.
    #[serde(default)]
    pub title: Option<String>,
    /// Detailed explanation specific to this occurrence.
    #[serde(default)]
    pub detail: Option<String>,
    /// URI identifying this occurrence.
    #[serde(default)]
    pub instance: Option<String>,
    /// Per-field validation errors, when the API reports them.
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    /// Any members outside the well-known set.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ApiError {
    /// The structured body, when the server sent valid JSON.
    pub fn problem(&self) -> Option<&ProblemDetails> {
        self.problem.as_ref()
    }

    /// The raw response body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The `title` member, defaulted to the status reason phrase.
    pub fn title(&self) -> Option<&str> {
        self.problem.as_ref().and_then(|p| p.title.as_deref())
    }

    /// Look up an extension member by name.
    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.problem.as_ref().and_then(|p| p.extensions.get(key))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        match self.title() {
            Some(title) => write!(f, ": {title}"),
            None if !self.body.is_empty() => write!(f, ": {}", self.body),
            None => Ok(()),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiFailure for ApiError {
    fn from_response(status: StatusCode, body: &str) -> Self {
        let mut problem: Option<ProblemDetails> = serde_json::from_str(body).ok();
        if let Some(p) = problem.as_mut() {
            if p.title.is_none() {
                p.title = status.canonical_reason().map(str::to_owned);
            }
        }
        ApiError {
            status,
            problem,
            body: body.to_owned(),
        }
    }

    fn status(&self) -> StatusCode {
        self.status
    }
}
