//! Endpoint descriptors.
//!
//! An [`Endpoint`] is an immutable value describing one API operation: the
//! verb, a path function over the client configuration and the request
//! value, the acceptable auth kinds, and header overrides. Descriptors are
//! built once (typically in a `static`-like constructor per operation) and
//! shared freely; all validation happens in [`EndpointBuilder::build`] so a
//! bad descriptor fails at construction, not mid-request.

use std::marker::PhantomData;
use std::sync::Arc;

use http::header::HeaderValue;
use http::Method;
use url::Url;

use crate::auth::AuthKind;
use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::response::FromResponse;

type PathFn<T> = Arc<dyn Fn(&ClientConfig, &T) -> String + Send + Sync>;

/// An immutable descriptor for one API operation.
///
/// `T` is the request type, `R` the response type, and `E` the declared
/// failure type (defaulting to [`ApiError`]). The descriptor holds no
/// credentials and no connection state.
pub struct Endpoint<T, R, E = ApiError> {
    method: Method,
    path: PathFn<T>,
    auth_kinds: Vec<AuthKind>,
    content_type: Option<HeaderValue>,
    accept: Option<HeaderValue>,
    force_basic_auth: bool,
    declared_error: bool,
    parse_fallback: Option<fn(&str) -> Option<R>>,
    _marker: PhantomData<fn(T) -> (R, E)>,
}

impl<T, R: FromResponse, E> Endpoint<T, R, E> {
    /// Start describing an endpoint.
    pub fn builder() -> EndpointBuilder<T, R, E> {
        EndpointBuilder::new()
    }
}

impl<T, R, E> Endpoint<T, R, E> {
    pub(crate) fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn auth_kinds(&self) -> &[AuthKind] {
        &self.auth_kinds
    }

    pub(crate) fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    pub(crate) fn accept(&self) -> Option<&HeaderValue> {
        self.accept.as_ref()
    }

    pub(crate) fn force_basic_auth(&self) -> bool {
        self.force_basic_auth
    }

    pub(crate) fn declared_error(&self) -> bool {
        self.declared_error
    }

    pub(crate) fn parse_fallback(&self) -> Option<fn(&str) -> Option<R>> {
        self.parse_fallback
    }

    /// Run the path function and parse its output as an absolute URL.
    pub(crate) fn resolve_url(
        &self,
        config: &ClientConfig,
        request: &T,
    ) -> Result<Url, ConfigError> {
        let path = (self.path)(config, request);
        Url::parse(&path).map_err(|e| ConfigError::InvalidUrl(format!("{path}: {e}")))
    }
}

impl<T, R, E> Clone for Endpoint<T, R, E> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: Arc::clone(&self.path),
            auth_kinds: self.auth_kinds.clone(),
            content_type: self.content_type.clone(),
            accept: self.accept.clone(),
            force_basic_auth: self.force_basic_auth,
            declared_error: self.declared_error,
            parse_fallback: self.parse_fallback,
            _marker: PhantomData,
        }
    }
}

impl<T, R, E> std::fmt::Debug for Endpoint<T, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("auth_kinds", &self.auth_kinds)
            .field("force_basic_auth", &self.force_basic_auth)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Endpoint`]. All validation happens in [`build`].
///
/// [`build`]: EndpointBuilder::build
pub struct EndpointBuilder<T, R, E = ApiError> {
    method: Option<Method>,
    path: Option<PathFn<T>>,
    auth_kinds: Vec<AuthKind>,
    content_type: Option<String>,
    accept: Option<String>,
    force_basic_auth: bool,
    declared_error: bool,
    parse_fallback: Option<fn(&str) -> Option<R>>,
    _marker: PhantomData<fn(T) -> (R, E)>,
}

impl<T, R: FromResponse, E> EndpointBuilder<T, R, E> {
    fn new() -> Self {
        Self {
            method: None,
            path: None,
            auth_kinds: Vec::new(),
            content_type: None,
            accept: None,
            force_basic_auth: false,
            declared_error: false,
            parse_fallback: None,
            _marker: PhantomData,
        }
    }

    /// The HTTP verb. GET, POST, PUT, PATCH and DELETE are dispatched.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// The path function, producing an absolute URL from the client
    /// configuration and the request value.
    pub fn path<F>(mut self, path: F) -> Self
    where
        F: Fn(&ClientConfig, &T) -> String + Send + Sync + 'static,
    {
        self.path = Some(Arc::new(path));
        self
    }

    /// Add one acceptable auth kind. Order does not matter; selection is by
    /// kind precedence, not declaration order.
    pub fn auth(mut self, kind: AuthKind) -> Self {
        if !self.auth_kinds.contains(&kind) {
            self.auth_kinds.push(kind);
        }
        self
    }

    /// Add several acceptable auth kinds.
    pub fn auth_kinds(mut self, kinds: &[AuthKind]) -> Self {
        for kind in kinds {
            self = self.auth(*kind);
        }
        self
    }

    /// Override the request `Content-Type` header.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the `Accept` header. Without an override the response
    /// type's [`FromResponse::accept`] applies.
    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Apply the selected auth method as a Basic header even when its
    /// default decoration differs. Fails per-request for methods with no
    /// Basic representation.
    pub fn as_basic_auth(mut self) -> Self {
        self.force_basic_auth = true;
        self
    }

    /// Declare that failure responses decode into the typed error `E`,
    /// taking priority over any custom parser.
    pub fn error_response(mut self) -> Self {
        self.declared_error = true;
        self
    }

    /// A last-resort parser for bodies the response type's own capabilities
    /// cannot decode. Also consulted for failure bodies when no typed error
    /// is declared.
    pub fn parse_with(mut self, parse: fn(&str) -> Option<R>) -> Self {
        self.parse_fallback = Some(parse);
        self
    }

    /// Validate and produce the descriptor.
    pub fn build(self) -> Result<Endpoint<T, R, E>, ConfigError> {
        let method = self.method.ok_or(ConfigError::MissingMethod)?;
        match method {
            Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE => {}
            other => return Err(ConfigError::UnsupportedMethod(other.to_string())),
        }
        let path = self.path.ok_or(ConfigError::MissingPath)?;
        if self.auth_kinds.is_empty() {
            return Err(ConfigError::MissingAuth);
        }

        let content_type = self
            .content_type
            .map(|v| parse_header("content-type", v))
            .transpose()?;
        let accept = match self.accept {
            Some(v) => Some(parse_header("accept", v)?),
            None => R::accept().map(|v| parse_header("accept", v.to_owned())).transpose()?,
        };

        Ok(Endpoint {
            method,
            path,
            auth_kinds: self.auth_kinds,
            content_type,
            accept,
            force_basic_auth: self.force_basic_auth,
            declared_error: self.declared_error,
            parse_fallback: self.parse_fallback,
            _marker: PhantomData,
        })
    }
}

fn parse_header(name: &'static str, value: String) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidHeader { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    use crate::response::{JsonDecodeError, decode_json};

    #[derive(Deserialize)]
    struct Thing {
        #[allow(dead_code)]
        id: String,
    }

    impl FromResponse for Thing {
        fn from_json(json: &str) -> Result<Self, JsonDecodeError> {
            decode_json(json)
        }
    }

    fn path(config: &ClientConfig, _request: &()) -> String {
        format!("{}/v1/things", config.api_base_url())
    }

    #[test]
    fn builds_a_complete_descriptor() {
        let endpoint: Endpoint<(), Thing> = Endpoint::builder()
            .method(Method::POST)
            .path(path)
            .auth(AuthKind::Jwt)
            .auth(AuthKind::ApiKeyHeader)
            .build()
            .unwrap();

        assert_eq!(endpoint.method(), &Method::POST);
        assert_eq!(
            endpoint.auth_kinds(),
            [AuthKind::Jwt, AuthKind::ApiKeyHeader]
        );
        // Accept defaults from the response type.
        assert_eq!(endpoint.accept().unwrap(), "application/json");

        let config = ClientConfig::new("https://api.example.com");
        let url = endpoint.resolve_url(&config, &()).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/things");
    }

    #[test]
    fn accept_override_wins() {
        let endpoint: Endpoint<(), Thing> = Endpoint::builder()
            .method(Method::GET)
            .path(path)
            .auth(AuthKind::Basic)
            .accept("text/csv")
            .build()
            .unwrap();
        assert_eq!(endpoint.accept().unwrap(), "text/csv");
    }

    #[test]
    fn no_accept_for_types_without_one() {
        let endpoint: Endpoint<(), ()> = Endpoint::builder()
            .method(Method::DELETE)
            .path(path)
            .auth(AuthKind::Jwt)
            .build()
            .unwrap();
        assert!(endpoint.accept().is_none());
    }

    #[test]
    fn missing_pieces_fail_at_build() {
        let no_method = Endpoint::<(), Thing>::builder()
            .path(path)
            .auth(AuthKind::Jwt)
            .build();
        assert_eq!(no_method.unwrap_err(), ConfigError::MissingMethod);

        let no_path = Endpoint::<(), Thing>::builder()
            .method(Method::GET)
            .auth(AuthKind::Jwt)
            .build();
        assert_eq!(no_path.unwrap_err(), ConfigError::MissingPath);

        let no_auth = Endpoint::<(), Thing>::builder()
            .method(Method::GET)
            .path(path)
            .build();
        assert_eq!(no_auth.unwrap_err(), ConfigError::MissingAuth);
    }

    #[test]
    fn exotic_verbs_are_rejected() {
        let err = Endpoint::<(), Thing>::builder()
            .method(Method::CONNECT)
            .path(path)
            .auth(AuthKind::Jwt)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedMethod("CONNECT".to_owned()));
    }

    #[test]
    fn bad_path_output_is_an_invalid_url() {
        let endpoint: Endpoint<(), Thing> = Endpoint::builder()
            .method(Method::GET)
            .path(|_, _| "not a url".to_owned())
            .auth(AuthKind::Jwt)
            .build()
            .unwrap();
        let config = ClientConfig::new("https://api.example.com");
        let err = endpoint.resolve_url(&config, &()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)), "{err:?}");
    }
}
