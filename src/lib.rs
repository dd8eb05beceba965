//! A typed request-execution core for REST API clients.
//!
//! The crate separates three concerns that SDK-style clients tend to tangle:
//!
//! - **What an operation is**: an [`Endpoint`] descriptor holding the verb,
//!   path function, acceptable auth kinds and header overrides, built once
//!   and validated eagerly.
//! - **What the caller holds**: an [`ApiClient`] with a fixed, precedence-
//!   ordered set of [`AuthMethod`] credentials and a [`Transport`].
//! - **How values cross the wire**: request types describe their form via
//!   [`IntoPayload`]; response types declare the representations they can be
//!   built from via [`FromResponse`], and the dispatcher routes each
//!   response by status class.
//!
//! A single call ties them together:
//!
//! ```ignore
//! use http::Method;
//! use restwire::{ApiClient, AuthKind, AuthMethod, Endpoint};
//!
//! let endpoint: Endpoint<(), Balance> = Endpoint::builder()
//!     .method(Method::GET)
//!     .path(|config, _| format!("{}/account/get-balance", config.api_base_url()))
//!     .auth(AuthKind::ApiKeyHeader)
//!     .build()?;
//!
//! let client = ApiClient::builder("https://api.example.com")
//!     .auth(AuthMethod::api_key_header("key", "secret"))
//!     .build()?;
//!
//! let balance = client.execute(&endpoint, &()).await?;
//! ```
//!
//! Errors are partitioned by who is at fault: [`ConfigError`] for descriptor
//! bugs, [`AuthError`](auth::AuthError) for credential mismatches,
//! [`TransportError`](transport::TransportError) for connection failures,
//! and the endpoint's declared failure type (default [`ApiError`]) for
//! everything the server reports. All fold into [`ClientError`].

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use auth::{AuthKind, AuthMethod, AuthMethodSet, HashStrategy, JwtAuth, SignatureAuth};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{ApiError, ApiFailure, ClientError, ConfigError, ProblemDetails};
pub use request::{IntoPayload, ParamValue, Payload};
pub use response::{FromResponse, JsonDecodeError, decode_json};
pub use transport::{Transport, TransportBody};
