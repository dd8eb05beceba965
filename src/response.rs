//! Response decoding capabilities and status-driven dispatch.
//!
//! A response type opts into the representations it understands through
//! [`FromResponse`]; the dispatcher routes each response by status class and
//! asks the type for the first capability that applies. A response the type
//! cannot represent is a [`ConfigError::UnhandledResponseType`]: the
//! endpoint was declared with the wrong response type, which is a bug rather
//! than a runtime condition.

use bytes::Bytes;
use http::header::{HeaderMap, LOCATION};
use http::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ApiFailure, ClientError, ConfigError};

/// Why a JSON decode did not produce a value.
#[derive(Debug)]
pub enum JsonDecodeError {
    /// The type has no JSON representation at all.
    Unhandled(&'static str),
    /// The type decodes JSON but this document did not fit.
    Invalid(String),
}

/// Decode a JSON document through serde, for use in [`FromResponse::from_json`]
/// implementations.
pub fn decode_json<T: DeserializeOwned>(json: &str) -> Result<T, JsonDecodeError> {
    serde_json::from_str(json).map_err(|e| JsonDecodeError::Invalid(e.to_string()))
}

/// The representations a response type can be built from.
///
/// Every method has a refusing default; a type overrides exactly the ones
/// that apply to it. Typical JSON response types override [`from_json`]
/// (usually as a one-liner over [`decode_json`]) and leave the rest alone.
///
/// [`from_json`]: FromResponse::from_json
pub trait FromResponse: Sized {
    /// The `Accept` header to request, when the endpoint does not override
    /// it. `None` sends no `Accept` header.
    fn accept() -> Option<&'static str> {
        Some("application/json")
    }

    /// The value representing a response with no meaningful body.
    fn no_content() -> Option<Self> {
        None
    }

    /// Build from the raw body bytes, bypassing text decoding.
    fn from_raw(_body: &Bytes) -> Option<Self> {
        None
    }

    /// Build from the body as text.
    fn from_text(_text: &str) -> Option<Self> {
        None
    }

    /// Build from a redirect's `Location` header value.
    fn from_location(_location: &str) -> Option<Self> {
        None
    }

    /// Build from the body as a JSON document.
    fn from_json(_json: &str) -> Result<Self, JsonDecodeError> {
        Err(JsonDecodeError::Unhandled(std::any::type_name::<Self>()))
    }
}

impl FromResponse for () {
    fn accept() -> Option<&'static str> {
        None
    }

    fn no_content() -> Option<Self> {
        Some(())
    }
}

impl FromResponse for Bytes {
    fn accept() -> Option<&'static str> {
        None
    }

    fn from_raw(body: &Bytes) -> Option<Self> {
        Some(body.clone())
    }
}

impl FromResponse for Vec<u8> {
    fn accept() -> Option<&'static str> {
        None
    }

    fn from_raw(body: &Bytes) -> Option<Self> {
        Some(body.to_vec())
    }
}

impl FromResponse for String {
    fn accept() -> Option<&'static str> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_owned())
    }

    fn from_location(location: &str) -> Option<Self> {
        Some(location.to_owned())
    }
}

impl FromResponse for Url {
    fn accept() -> Option<&'static str> {
        None
    }

    fn from_location(location: &str) -> Option<Self> {
        Url::parse(location).ok()
    }
}

/// Route a fully-buffered response to the declared response type.
///
/// Status classes are handled in order: informational, redirect, success,
/// failure. The optional `parse_fallback` is consulted for success bodies the
/// type's own capabilities cannot decode, and for failure bodies when the
/// endpoint has not declared a typed error.
pub(crate) fn dispatch<R, E>(
    status: StatusCode,
    headers: &HeaderMap,
    body: &Bytes,
    declared_error: bool,
    parse_fallback: Option<fn(&str) -> Option<R>>,
) -> Result<R, ClientError<E>>
where
    R: FromResponse,
    E: ApiFailure,
{
    if status.is_informational() {
        return R::no_content().ok_or_else(unhandled::<R, E>);
    }

    if status.is_redirection() {
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ClientError::Decode(format!("redirect {status} carried no Location header"))
            })?;
        return R::from_location(location).ok_or_else(unhandled::<R, E>);
    }

    if status.is_success() {
        if let Some(value) = R::no_content() {
            return Ok(value);
        }
        if let Some(value) = R::from_raw(body) {
            return Ok(value);
        }
        let text = std::str::from_utf8(body)
            .map_err(|_| ClientError::Decode("response body is not valid UTF-8".to_owned()))?;
        if let Some(value) = R::from_text(text) {
            return Ok(value);
        }
        return match R::from_json(text) {
            Ok(value) => Ok(value),
            Err(JsonDecodeError::Invalid(message)) => Err(ClientError::Decode(message)),
            Err(JsonDecodeError::Unhandled(_)) => parse_fallback
                .and_then(|parse| parse(text))
                .ok_or_else(unhandled::<R, E>),
        };
    }

    // Failure statuses. A declared typed error always wins; otherwise a
    // custom parser may claim the body (some APIs report partial success
    // through failure statuses), with the generic failure as the fallback.
    let text = String::from_utf8_lossy(body);
    if !declared_error {
        if let Some(value) = parse_fallback.and_then(|parse| parse(&text)) {
            return Ok(value);
        }
    }
    Err(ClientError::Api(E::from_response(status, &text)))
}

fn unhandled<R, E>() -> ClientError<E> {
    ClientError::Config(ConfigError::UnhandledResponseType(std::any::type_name::<R>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Balance {
        value: f64,
        #[serde(rename = "autoReload")]
        auto_reload: bool,
    }

    impl FromResponse for Balance {
        fn from_json(json: &str) -> Result<Self, JsonDecodeError> {
            decode_json(json)
        }
    }

    fn run<R: FromResponse>(
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<R, ClientError<ApiError>> {
        dispatch(status, headers, &Bytes::copy_from_slice(body), false, None)
    }

    #[test]
    fn success_json_decodes_into_the_declared_type() {
        let balance: Balance = run(
            StatusCode::OK,
            &HeaderMap::new(),
            br#"{"value": 10.28, "autoReload": false}"#,
        )
        .unwrap();
        assert_eq!(
            balance,
            Balance {
                value: 10.28,
                auto_reload: false
            }
        );
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = run::<Balance>(StatusCode::OK, &HeaderMap::new(), b"{not json").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
    }

    #[test]
    fn no_content_type_absorbs_any_success() {
        run::<()>(StatusCode::NO_CONTENT, &HeaderMap::new(), b"").unwrap();
        run::<()>(StatusCode::OK, &HeaderMap::new(), b"ignored").unwrap();
    }

    #[test]
    fn informational_needs_a_no_content_capable_type() {
        run::<()>(StatusCode::CONTINUE, &HeaderMap::new(), b"").unwrap();

        let err = run::<Balance>(StatusCode::CONTINUE, &HeaderMap::new(), b"").unwrap_err();
        assert!(
            matches!(
                err,
                ClientError::Config(ConfigError::UnhandledResponseType(_))
            ),
            "{err:?}"
        );
    }

    #[test]
    fn redirects_surface_the_location_header() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, "https://example.com/next?page=2".parse().unwrap());

        let location: String = run(StatusCode::FOUND, &headers, b"").unwrap();
        assert_eq!(location, "https://example.com/next?page=2");

        let url: Url = run(StatusCode::MOVED_PERMANENTLY, &headers, b"").unwrap();
        assert_eq!(url.query(), Some("page=2"));
    }

    #[test]
    fn redirect_without_location_is_a_decode_error() {
        let err = run::<String>(StatusCode::FOUND, &HeaderMap::new(), b"").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
    }

    #[test]
    fn redirect_for_a_non_location_type_is_a_config_error() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, "https://example.com/next".parse().unwrap());
        let err = run::<Balance>(StatusCode::FOUND, &headers, b"").unwrap_err();
        assert!(
            matches!(
                err,
                ClientError::Config(ConfigError::UnhandledResponseType(_))
            ),
            "{err:?}"
        );
    }

    #[test]
    fn text_capable_types_take_the_body_verbatim() {
        let text: String = run(StatusCode::OK, &HeaderMap::new(), b"plain text").unwrap();
        assert_eq!(text, "plain text");

        let raw: Bytes = run(StatusCode::OK, &HeaderMap::new(), b"\x00\x01\x02").unwrap();
        assert_eq!(raw.as_ref(), b"\x00\x01\x02");
    }

    #[test]
    fn failure_builds_the_generic_error() {
        let err = run::<Balance>(
            StatusCode::TOO_MANY_REQUESTS,
            &HeaderMap::new(),
            br#"{"title": "Rate Limit Hit"}"#,
        )
        .unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status(), StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(api.title(), Some("Rate Limit Hit"));
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_failure_body_still_reports_the_status() {
        let err = run::<Balance>(
            StatusCode::SERVICE_UNAVAILABLE,
            &HeaderMap::new(),
            b"upstream melted",
        )
        .unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(api.body(), "upstream melted");
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }

    #[test]
    fn custom_parser_claims_unhandled_success_bodies() {
        // A type with no JSON capability of its own.
        #[derive(Debug, PartialEq)]
        struct Legacy(u32);
        impl FromResponse for Legacy {
            fn accept() -> Option<&'static str> {
                None
            }
        }
        fn parse(text: &str) -> Option<Legacy> {
            text.strip_prefix("code=").and_then(|c| c.parse().ok()).map(Legacy)
        }

        let ok: Result<Legacy, ClientError<ApiError>> = dispatch(
            StatusCode::OK,
            &HeaderMap::new(),
            &Bytes::from_static(b"code=7"),
            false,
            Some(parse),
        );
        assert_eq!(ok.unwrap(), Legacy(7));

        // The parser is also consulted for failure statuses when no typed
        // error is declared.
        let claimed: Result<Legacy, ClientError<ApiError>> = dispatch(
            StatusCode::NOT_ACCEPTABLE,
            &HeaderMap::new(),
            &Bytes::from_static(b"code=406"),
            false,
            Some(parse),
        );
        assert_eq!(claimed.unwrap(), Legacy(406));

        // But a body the parser refuses still becomes an API error.
        let refused: Result<Legacy, ClientError<ApiError>> = dispatch(
            StatusCode::NOT_ACCEPTABLE,
            &HeaderMap::new(),
            &Bytes::from_static(b"nope"),
            false,
            Some(parse),
        );
        assert!(refused.unwrap_err().is_api());
    }

    #[test]
    fn declared_error_outranks_the_custom_parser_on_failures() {
        fn parse(_: &str) -> Option<()> {
            Some(())
        }
        let err: Result<(), ClientError<ApiError>> = dispatch(
            StatusCode::BAD_REQUEST,
            &HeaderMap::new(),
            &Bytes::from_static(b"{}"),
            true,
            Some(parse),
        );
        assert!(err.unwrap_err().is_api());
    }

    #[test]
    fn dispatch_is_pure_over_the_buffered_response() {
        let body = Bytes::from_static(br#"{"value": 1.0, "autoReload": true}"#);
        let first: Balance =
            dispatch::<_, ApiError>(StatusCode::OK, &HeaderMap::new(), &body, false, None)
                .unwrap();
        let second: Balance =
            dispatch::<_, ApiError>(StatusCode::OK, &HeaderMap::new(), &body, false, None)
                .unwrap();
        assert_eq!(first, second);
    }
}
