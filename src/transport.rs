//! Outbound HTTP boundary.
//!
//! The core depends on the smallest possible transport shape: send one
//! request (verb, URI, headers, optional body), get back one response
//! (status, headers, body). [`Transport`] captures that shape; everything
//! else about the underlying HTTP client (pooling, TLS, timeouts) is the
//! transport's business, not the core's.
//!
//! [`HyperTransport`] is the default implementation, built on hyper_util's
//! legacy client with rustls TLS. Implement [`Transport`] for anything else
//! (including in-memory stubs for tests).

mod body;
mod hyper;

pub use body::TransportBody;
pub use hyper::{HyperTransport, HyperTransportBuilder};

use bytes::Bytes;

/// Connection-level failure.
///
/// The core adds no retry or backoff semantics; whatever the transport
/// reports is passed through to the caller unchanged.
#[derive(Debug, Clone, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// The minimal HTTP shape the core depends on.
///
/// Implementations must fully read the response body before returning, so
/// the underlying connection is released no matter which dispatch branch the
/// response takes afterwards.
pub trait Transport {
    /// Issue one HTTP request and return the complete response.
    fn send(
        &self,
        request: http::Request<TransportBody>,
    ) -> impl Future<Output = Result<http::Response<Bytes>, TransportError>> + Send;
}
