//! The API client: configuration, credentials and the execute loop.

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};

use crate::auth::{AuthError, AuthMethod, AuthMethodSet};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiFailure, ClientError};
use crate::request::{IntoPayload, OutboundRequest};
use crate::response::{FromResponse, dispatch};
use crate::transport::{HyperTransport, Transport, TransportError};

/// Executes endpoint calls over a transport with a fixed credential set.
///
/// The client is cheap to clone and safe to share; it holds no per-request
/// state. `C` is the transport and defaults to [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use restwire::{ApiClient, AuthMethod};
///
/// let client = ApiClient::builder("https://api.example.com")
///     .auth(AuthMethod::api_key_header("key", "secret"))
///     .build()?;
/// let balance = client.execute(&balance_endpoint(), &()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<C = HyperTransport> {
    transport: C,
    auth: AuthMethodSet,
    config: ClientConfig,
}

impl ApiClient {
    /// Start building a client for the given API base URL.
    pub fn builder(api_base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            config: ClientConfig::new(api_base_url),
            auth: AuthMethodSet::new(),
        }
    }
}

impl<C: Transport> ApiClient<C> {
    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The registered credential set.
    pub fn auth_methods(&self) -> &AuthMethodSet {
        &self.auth
    }

    /// Execute one endpoint call.
    ///
    /// Assembly order: resolve the URL, encode the payload, apply header
    /// overrides, select and apply auth (so signature auth signs the final
    /// parameter set), send, then dispatch the buffered response by status.
    pub async fn execute<T, R, E>(
        &self,
        endpoint: &Endpoint<T, R, E>,
        request: &T,
    ) -> Result<R, ClientError<E>>
    where
        T: IntoPayload,
        R: FromResponse,
        E: ApiFailure,
    {
        let url = endpoint.resolve_url(&self.config, request)?;
        let mut outbound = OutboundRequest::new(endpoint.method().clone(), url);

        let payload = request
            .payload()
            .map_err(|e| ClientError::Encode(e.to_string()))?;
        outbound.apply_payload(payload);

        if let Some(content_type) = endpoint.content_type() {
            outbound.set_header(CONTENT_TYPE, content_type.clone());
        }
        if let Some(accept) = endpoint.accept() {
            outbound.set_header(ACCEPT, accept.clone());
        }

        let auth = self.auth.select(endpoint.auth_kinds())?;
        if endpoint.force_basic_auth() {
            let value = auth.basic_header()?;
            let value = HeaderValue::from_str(&value).map_err(|_| {
                AuthError::InvalidHeaderValue {
                    name: "authorization",
                }
            })?;
            outbound.set_header(AUTHORIZATION, value);
        } else {
            auth.decorate(&mut outbound)?;
        }

        tracing::debug!(
            method = %outbound.method(),
            url = %outbound.url(),
            auth = %auth.kind(),
            "sending request"
        );

        let response = self.transport.send(outbound.finalize()?).await?;
        let (parts, body) = response.into_parts();

        tracing::debug!(status = %parts.status, bytes = body.len(), "received response");

        dispatch(
            parts.status,
            &parts.headers,
            &body,
            endpoint.declared_error(),
            endpoint.parse_fallback(),
        )
    }
}

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    auth: AuthMethodSet,
}

impl ApiClientBuilder {
    /// Register a credential. Registering the same logical credential twice
    /// is a no-op.
    pub fn auth(mut self, method: AuthMethod) -> Self {
        self.auth.insert(method);
        self
    }

    /// Override the base URL for legacy form-parameter endpoints.
    pub fn rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.with_rest_base_url(url);
        self
    }

    /// Build with the default [`HyperTransport`].
    pub fn build(self) -> Result<ApiClient, TransportError> {
        let transport = HyperTransport::new()?;
        Ok(self.build_with_transport(transport))
    }

    /// Build with a caller-supplied transport.
    pub fn build_with_transport<C: Transport>(self, transport: C) -> ApiClient<C> {
        ApiClient {
            transport,
            auth: self.auth,
            config: self.config,
        }
    }
}
