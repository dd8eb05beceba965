//! Outbound request payloads and assembly.
//!
//! Request types describe their wire form with a [`Payload`]: a JSON
//! document, a flat parameter list, a pre-encoded byte buffer, or nothing.
//! [`OutboundRequest`] accumulates the payload, headers and auth decoration,
//! then finalizes into an [`http::Request`] for the transport. Parameters
//! travel in the query string for GET/DELETE and as a form-encoded body for
//! other verbs without an explicit body.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use url::Url;

use crate::error::ConfigError;
use crate::transport::TransportBody;

/// The wire form of a request type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A serialized JSON document, sent as the request body.
    Json(String),
    /// Flat key/value parameters; multi-valued keys appear once per value.
    Params(Vec<(String, String)>),
    /// A pre-encoded body sent verbatim, with no implied content type.
    Raw(Bytes),
    /// No body and no parameters.
    Empty,
}

impl Payload {
    /// Serialize `value` into a JSON payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Payload::Json(serde_json::to_string(value)?))
    }

    /// Build a parameter payload, flattening multi-valued entries into
    /// repeated keys.
    pub fn params<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: Into<String>,
    {
        let mut flat = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            match value {
                ParamValue::Single(v) => flat.push((key, v)),
                ParamValue::Many(vs) => {
                    for v in vs {
                        flat.push((key.clone(), v));
                    }
                }
            }
        }
        Payload::Params(flat)
    }

    /// A verbatim byte payload.
    pub fn raw(data: impl Into<Bytes>) -> Self {
        Payload::Raw(data.into())
    }

    /// The empty payload.
    pub fn empty() -> Self {
        Payload::Empty
    }
}

/// One parameter value: scalar, or repeated under the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_owned())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Many(values)
    }
}

/// Conversion from a request type to its wire form.
///
/// Implemented per request type; serialization failures surface as encode
/// errors rather than panics.
pub trait IntoPayload {
    fn payload(&self) -> Result<Payload, serde_json::Error>;
}

impl IntoPayload for () {
    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Empty)
    }
}

impl IntoPayload for Vec<u8> {
    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Raw(Bytes::copy_from_slice(self)))
    }
}

impl IntoPayload for Bytes {
    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Raw(self.clone()))
    }
}

impl IntoPayload for serde_json::Value {
    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Payload::json(self)
    }
}

#[derive(Debug, Clone)]
enum BodyKind {
    None,
    Json(String),
    Raw(Bytes),
}

/// A request under assembly: resolved URL, headers, parameters and body.
///
/// Auth decoration happens against this type, after the payload is applied
/// and before finalization, so signature auth sees the final parameter set.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: BodyKind,
}

impl OutboundRequest {
    pub(crate) fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            params: Vec::new(),
            body: BodyKind::None,
        }
    }

    /// Set a header, replacing any existing value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Whether a header is already present.
    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.contains_key(name)
    }

    /// Append a request parameter. Repeated keys are preserved in order.
    pub fn push_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// The parameters accumulated so far, in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The resolved request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn apply_payload(&mut self, payload: Payload) {
        match payload {
            Payload::Json(json) => self.body = BodyKind::Json(json),
            Payload::Raw(data) => self.body = BodyKind::Raw(data),
            Payload::Params(pairs) => {
                for (key, value) in pairs {
                    self.params.push((key, value));
                }
            }
            Payload::Empty => {}
        }
    }

    /// Encode parameters into their place and produce the wire request.
    ///
    /// Parameters go to the query string for GET and DELETE; for other verbs
    /// they become a form-encoded body, unless an explicit body is already
    /// set, in which case they go to the query string as well.
    pub(crate) fn finalize(mut self) -> Result<http::Request<TransportBody>, ConfigError> {
        let params_as_query = matches!(self.method, Method::GET | Method::DELETE)
            || !matches!(self.body, BodyKind::None);
        if !self.params.is_empty() {
            if params_as_query {
                self.url
                    .query_pairs_mut()
                    .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            } else {
                let form = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                self.body = BodyKind::Raw(Bytes::from(form));
                if !self.headers.contains_key(CONTENT_TYPE) {
                    self.headers.insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    );
                }
            }
        }

        let body = match self.body {
            BodyKind::None => TransportBody::empty(),
            BodyKind::Json(json) => {
                if !self.headers.contains_key(CONTENT_TYPE) {
                    self.headers
                        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                TransportBody::full(Bytes::from(json))
            }
            BodyKind::Raw(data) => TransportBody::full(data),
        };

        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.url.as_str())
            .body(body)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}
