//! Hyper-based default transport.
//!
//! [`HyperTransport`] wraps hyper_util's legacy client with a rustls TLS
//! connector. It supports HTTP/1.1 and HTTP/2 with ALPN negotiation and
//! connection pooling. The response body is collected in full before the
//! response is handed back, releasing the pooled connection immediately.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::ClientConfig;

use super::body::TransportBody;
use super::{Transport, TransportError};

/// Type alias for the hyper client with HTTPS connector.
type HyperClient = Client<HttpsConnector<HttpConnector>, TransportBody>;

/// HTTP transport using hyper_util's legacy client.
///
/// # Example
///
/// ```ignore
/// use restwire::transport::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .pool_idle_timeout(Duration::from_secs(60))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    http2_only: bool,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("http2_only", &self.http2_only)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// Check if this transport is configured for HTTP/2 only.
    pub fn is_http2_only(&self) -> bool {
        self.http2_only
    }
}

impl Transport for HyperTransport {
    async fn send(
        &self,
        request: http::Request<TransportBody>,
    ) -> Result<http::Response<Bytes>, TransportError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| TransportError(format!("request failed: {e}")))?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?
            .to_bytes();

        Ok(http::Response::from_parts(parts, bytes))
    }
}

/// Builder for [`HyperTransport`].
pub struct HyperTransportBuilder {
    /// Custom TLS configuration; system roots when unset.
    tls_config: Option<ClientConfig>,
    /// Force HTTP/2 only (for h2c or when HTTP/2 is required).
    http2_only: bool,
    /// Connection pool idle timeout.
    pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host.
    pool_max_idle_per_host: usize,
}

impl HyperTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            tls_config: None,
            http2_only: false,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }

    /// Use a custom rustls [`ClientConfig`] instead of the default
    /// native-root configuration.
    pub fn tls_config(mut self, config: ClientConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Force HTTP/2 for all connections.
    pub fn http2_only(mut self, enabled: bool) -> Self {
        self.http2_only = enabled;
        self
    }

    /// Set the connection pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, TransportError> {
        let tls = match self.tls_config {
            Some(config) => hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(config),
            None => hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| TransportError(format!("failed to load native roots: {e}")))?,
        };

        let connector = if self.http2_only {
            tls.https_or_http().enable_http2().build()
        } else {
            tls.https_or_http().enable_all_versions().build()
        };

        let mut builder = Client::builder(TokioExecutor::new());
        builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .http2_only(self.http2_only);
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }

        Ok(HyperTransport {
            client: builder.build(connector),
            http2_only: self.http2_only,
        })
    }
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
