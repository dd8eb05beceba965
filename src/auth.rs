//! Authentication methods and selection.
//!
//! A client registers a set of [`AuthMethod`] values once at construction;
//! each endpoint declares which [`AuthKind`]s it accepts. Selection walks the
//! registered set in ascending precedence order and takes the first method
//! whose kind the endpoint accepts, so a client holding several credentials
//! always resolves the same method for a given endpoint regardless of
//! registration order.

mod hash;
mod jwt;

pub use hash::HashStrategy;
pub use jwt::JwtAuth;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::header::{AUTHORIZATION, HeaderValue};

use crate::request::OutboundRequest;

/// Discriminates the auth method variants. Endpoints declare acceptance in
/// terms of kinds; clients register concrete [`AuthMethod`] values.
///
/// Variants are declared in precedence order: the more specific or secure
/// scheme wins when several registered methods satisfy an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthKind {
    /// Bearer token freshly signed from claims on every request.
    Jwt,
    /// HMAC-signed request parameters.
    Signature,
    /// API key and secret carried in an `Authorization: Basic` header.
    ApiKeyHeader,
    /// API key and secret carried as request parameters.
    ApiKeyQuery,
    /// Username/password `Authorization: Basic` header.
    Basic,
}

impl AuthKind {
    /// Fixed precedence weight; lower is preferred.
    pub fn precedence(self) -> u8 {
        match self {
            AuthKind::Jwt => 10,
            AuthKind::Signature => 20,
            AuthKind::ApiKeyHeader => 30,
            AuthKind::ApiKeyQuery => 40,
            AuthKind::Basic => 50,
        }
    }

    /// Stable name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthKind::Jwt => "jwt",
            AuthKind::Signature => "signature",
            AuthKind::ApiKeyHeader => "api-key-header",
            AuthKind::ApiKeyQuery => "api-key-query",
            AuthKind::Basic => "basic",
        }
    }
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while selecting or applying credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The endpoint's acceptable kinds and the client's registered kinds do
    /// not intersect. Both sides are listed for diagnosability.
    #[error(
        "no acceptable auth method found; acceptable types are [{}], supplied types were [{}]",
        join_kinds(acceptable),
        join_kinds(available)
    )]
    NoAcceptableMethod {
        acceptable: Vec<AuthKind>,
        available: Vec<AuthKind>,
    },

    /// Token signing failed.
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    /// The endpoint forces Basic-header decoration but the selected method
    /// has no Basic representation.
    #[error("{kind} auth cannot be applied as a Basic header")]
    BasicNotSupported { kind: AuthKind },

    /// The credential material is not representable as a header value.
    #[error("credentials produced an invalid {name} header value")]
    InvalidHeaderValue { name: &'static str },
}

fn join_kinds(kinds: &[AuthKind]) -> String {
    let mut out = String::new();
    for kind in kinds {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(kind.as_str());
    }
    out
}

/// Credentials for HMAC-signed request parameters.
///
/// The signature covers the parameters present on the request at decoration
/// time, so all other parameters must be finalized before auth is applied.
#[derive(Clone)]
pub struct SignatureAuth {
    api_key: String,
    secret: String,
    hash: HashStrategy,
}

impl SignatureAuth {
    /// Create with the default keyed hash ([`HashStrategy::HmacSha256`]).
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_hash(api_key, secret, HashStrategy::default())
    }

    /// Create with an explicit hash strategy.
    pub fn with_hash(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        hash: HashStrategy,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            hash,
        }
    }

    /// The public API key included alongside the signature.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Parameters to append: `api_key`, a `timestamp` when the request does
    /// not already carry one, and the `sig` over the combined set.
    pub(crate) fn auth_params(
        &self,
        existing: &[(String, String)],
        timestamp: u64,
    ) -> Vec<(String, String)> {
        let mut combined: BTreeMap<&str, String> = existing
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        let mut additions = vec![("api_key".to_owned(), self.api_key.clone())];
        combined.insert("api_key", self.api_key.clone());
        if !combined.contains_key("timestamp") {
            let ts = timestamp.to_string();
            combined.insert("timestamp", ts.clone());
            additions.push(("timestamp".to_owned(), ts));
        }

        let mut signing = String::new();
        for (key, value) in &combined {
            signing.push('&');
            signing.push_str(key);
            signing.push('=');
            // '&' and '=' would be ambiguous inside the signing string.
            signing.push_str(&value.replace(['&', '='], "_"));
        }
        additions.push(("sig".to_owned(), self.hash.calculate(&signing, &self.secret)));
        additions
    }
}

impl std::fmt::Debug for SignatureAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureAuth")
            .field("api_key", &self.api_key)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// An immutable credential capability.
///
/// Equality is structural over the kind and the identifying fields (the api
/// key or application id, not the secret where avoidable), so registering the
/// same logical credential twice is a no-op. Basic-style variants compare the
/// full encoded token.
#[derive(Clone)]
pub enum AuthMethod {
    /// Fresh signed bearer token per request.
    Jwt(JwtAuth),
    /// HMAC-signed parameters.
    Signature(SignatureAuth),
    /// Key/secret pair sent as an `Authorization: Basic` header.
    ApiKeyHeader { api_key: String, api_secret: String },
    /// Key/secret pair sent as `api_key`/`api_secret` parameters.
    ApiKeyQuery { api_key: String, api_secret: String },
    /// Username/password Basic credential.
    Basic { username: String, password: String },
}

impl AuthMethod {
    /// Key/secret pair applied as a Basic header.
    pub fn api_key_header(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        AuthMethod::ApiKeyHeader {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Key/secret pair applied as request parameters.
    pub fn api_key_query(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        AuthMethod::ApiKeyQuery {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Username/password Basic credential.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthMethod::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The discriminating kind of this method.
    pub fn kind(&self) -> AuthKind {
        match self {
            AuthMethod::Jwt(_) => AuthKind::Jwt,
            AuthMethod::Signature(_) => AuthKind::Signature,
            AuthMethod::ApiKeyHeader { .. } => AuthKind::ApiKeyHeader,
            AuthMethod::ApiKeyQuery { .. } => AuthKind::ApiKeyQuery,
            AuthMethod::Basic { .. } => AuthKind::Basic,
        }
    }

    /// Fixed precedence weight; lower is preferred.
    pub fn precedence(&self) -> u8 {
        self.kind().precedence()
    }

    /// Attach this credential to an outbound request.
    ///
    /// Header-based variants set `Authorization`; parameter-based variants
    /// append request parameters. Signature auth signs the parameters present
    /// at call time, so the request body/query must already be final.
    pub fn decorate(&self, request: &mut OutboundRequest) -> Result<(), AuthError> {
        match self {
            AuthMethod::Jwt(jwt) => {
                let token = jwt.generate_token()?;
                set_authorization(request, format!("Bearer {token}"))
            }
            AuthMethod::Signature(sig) => {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                let additions = sig.auth_params(request.params(), timestamp);
                for (key, value) in additions {
                    request.push_param(key, value);
                }
                Ok(())
            }
            AuthMethod::ApiKeyHeader { .. } | AuthMethod::Basic { .. } => {
                set_authorization(request, self.basic_header()?)
            }
            AuthMethod::ApiKeyQuery {
                api_key,
                api_secret,
            } => {
                request.push_param("api_key", api_key.clone());
                request.push_param("api_secret", api_secret.clone());
                Ok(())
            }
        }
    }

    /// The `Basic` header value for this credential, for endpoints that
    /// require Basic-style decoration regardless of the method's default.
    pub fn basic_header(&self) -> Result<String, AuthError> {
        let (user, pass) = match self {
            AuthMethod::ApiKeyHeader {
                api_key,
                api_secret,
            }
            | AuthMethod::ApiKeyQuery {
                api_key,
                api_secret,
            } => (api_key, api_secret),
            AuthMethod::Basic { username, password } => (username, password),
            other => {
                return Err(AuthError::BasicNotSupported { kind: other.kind() });
            }
        };
        Ok(format!("Basic {}", BASE64.encode(format!("{user}:{pass}"))))
    }

    /// Identity triple driving ordering, equality and hashing.
    fn identity(&self) -> (u8, &str, &str) {
        match self {
            AuthMethod::Jwt(jwt) => (self.precedence(), jwt.application_id(), ""),
            AuthMethod::Signature(sig) => (self.precedence(), sig.api_key(), ""),
            AuthMethod::ApiKeyHeader {
                api_key,
                api_secret,
            } => (self.precedence(), api_key, api_secret),
            AuthMethod::ApiKeyQuery { api_key, .. } => (self.precedence(), api_key, ""),
            AuthMethod::Basic { username, password } => (self.precedence(), username, password),
        }
    }
}

fn set_authorization(request: &mut OutboundRequest, value: String) -> Result<(), AuthError> {
    let value = HeaderValue::from_str(&value)
        .map_err(|_| AuthError::InvalidHeaderValue { name: "authorization" })?;
    request.set_header(AUTHORIZATION, value);
    Ok(())
}

impl PartialEq for AuthMethod {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for AuthMethod {}

impl PartialOrd for AuthMethod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AuthMethod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl Hash for AuthMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (_, id, _) = self.identity();
        f.debug_struct("AuthMethod")
            .field("kind", &self.kind())
            .field("id", &id)
            .finish_non_exhaustive()
    }
}

/// The credentials a client holds, deduplicated and ordered by precedence.
///
/// Populated once at client construction and read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct AuthMethodSet {
    methods: BTreeSet<AuthMethod>,
}

impl AuthMethodSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential. Re-registering the same logical credential is
    /// a no-op; returns whether the set changed.
    pub fn insert(&mut self, method: AuthMethod) -> bool {
        self.methods.insert(method)
    }

    /// Number of registered credentials.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no credentials are registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterate in ascending precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &AuthMethod> {
        self.methods.iter()
    }

    /// The distinct kinds present, in precedence order.
    pub fn kinds(&self) -> Vec<AuthKind> {
        let mut kinds: Vec<AuthKind> = Vec::new();
        for method in &self.methods {
            if !kinds.contains(&method.kind()) {
                kinds.push(method.kind());
            }
        }
        kinds
    }

    /// Pick the registered method with the lowest precedence whose kind the
    /// endpoint accepts. Deterministic for a given set and kind list.
    pub fn select(&self, acceptable: &[AuthKind]) -> Result<&AuthMethod, AuthError> {
        self.methods
            .iter()
            .find(|method| acceptable.contains(&method.kind()))
            .ok_or_else(|| AuthError::NoAcceptableMethod {
                acceptable: acceptable.to_vec(),
                available: self.kinds(),
            })
    }
}

impl FromIterator<AuthMethod> for AuthMethodSet {
    fn from_iter<I: IntoIterator<Item = AuthMethod>>(iter: I) -> Self {
        Self {
            methods: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_query() -> AuthMethod {
        AuthMethod::api_key_query("acc0unt1", "s3cret")
    }

    fn basic() -> AuthMethod {
        AuthMethod::basic("admin", "hunter2")
    }

    fn signature() -> AuthMethod {
        AuthMethod::Signature(SignatureAuth::new("acc0unt1", "sig-secret"))
    }

    #[test]
    fn selects_lowest_precedence_member_of_intersection() {
        let set: AuthMethodSet = [basic(), key_query(), signature()].into_iter().collect();

        let selected = set
            .select(&[AuthKind::Basic, AuthKind::Signature, AuthKind::ApiKeyQuery])
            .unwrap();
        assert_eq!(selected.kind(), AuthKind::Signature);

        // Deterministic across repeated calls.
        for _ in 0..3 {
            let again = set
                .select(&[AuthKind::Basic, AuthKind::Signature, AuthKind::ApiKeyQuery])
                .unwrap();
            assert_eq!(again.kind(), AuthKind::Signature);
        }
    }

    #[test]
    fn selection_ignores_endpoint_kind_order() {
        let set: AuthMethodSet = [basic(), key_query()].into_iter().collect();
        // The endpoint listing basic first does not override precedence.
        let selected = set.select(&[AuthKind::Basic, AuthKind::ApiKeyQuery]).unwrap();
        assert_eq!(selected.kind(), AuthKind::ApiKeyQuery);
    }

    #[test]
    fn no_intersection_names_both_sides() {
        let set: AuthMethodSet = [basic()].into_iter().collect();
        let err = set.select(&[AuthKind::Jwt, AuthKind::Signature]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("jwt, signature"), "{message}");
        assert!(message.contains("supplied types were [basic]"), "{message}");
    }

    #[test]
    fn duplicate_registration_is_a_noop() {
        let mut set = AuthMethodSet::new();
        assert!(set.insert(AuthMethod::api_key_query("k", "secret-one")));
        // Same principal, different secret: still the same logical credential.
        assert!(!set.insert(AuthMethod::api_key_query("k", "secret-two")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn basic_equality_includes_the_encoded_token() {
        let mut set = AuthMethodSet::new();
        assert!(set.insert(AuthMethod::basic("admin", "one")));
        assert!(set.insert(AuthMethod::basic("admin", "two")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn basic_header_encoding() {
        assert_eq!(
            basic().basic_header().unwrap(),
            // base64("admin:hunter2")
            "Basic YWRtaW46aHVudGVyMg=="
        );
        assert!(matches!(
            signature().basic_header(),
            Err(AuthError::BasicNotSupported {
                kind: AuthKind::Signature
            })
        ));
    }

    #[test]
    fn signature_params_cover_preexisting_parameters() {
        let sig = SignatureAuth::new("acc0unt1", "sig-secret");
        let existing = vec![("to".to_owned(), "447700900001".to_owned())];

        let additions = sig.auth_params(&existing, 1_500_000_000);
        let keys: Vec<&str> = additions.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["api_key", "timestamp", "sig"]);

        let sig_value = &additions.last().unwrap().1;
        // HMAC-SHA256, hex-encoded.
        assert_eq!(sig_value.len(), 64);
        assert!(sig_value.chars().all(|c| c.is_ascii_hexdigit()));

        // Same inputs, same signature.
        assert_eq!(additions, sig.auth_params(&existing, 1_500_000_000));
        // Different parameter set, different signature.
        assert_ne!(
            sig_value,
            &sig.auth_params(&[], 1_500_000_000).last().unwrap().1
        );
    }

    #[test]
    fn signature_respects_caller_supplied_timestamp() {
        let sig = SignatureAuth::new("acc0unt1", "sig-secret");
        let existing = vec![("timestamp".to_owned(), "1".to_owned())];
        let additions = sig.auth_params(&existing, 1_500_000_000);
        let keys: Vec<&str> = additions.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["api_key", "sig"]);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", key_query());
        assert!(!rendered.contains("s3cret"), "{rendered}");
        assert!(rendered.contains("acc0unt1"), "{rendered}");
    }
}
