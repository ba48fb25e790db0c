//! Classification of non-2xx responses into typed errors.
//!
//! # Design
//! Services answer failures with an envelope `{exception, error}`; the
//! gateway in front of them answers missing credentials with `{message}`.
//! `map_error_response` handles the parts shared by every service
//! (authorization, unparsable bodies, unknown tags) and hands known tags to
//! the service's `ErrorTaxonomy`. The set of known tags is data owned by each
//! service, so a tag added server-side only needs a taxonomy update.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Marker the gateway puts in `message` when no credentials were sent.
pub const MISSING_AUTHORIZATION: &str = "no Authorization header found";

/// Error body returned by the services and their gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-service mapping of exception tags to typed errors.
pub trait ErrorTaxonomy {
    /// Tags the service is known to emit.
    fn known_exceptions(&self) -> &[&'static str];

    /// Classifies a known tag. `None` means the envelope did not carry what
    /// the tag requires; it is then reported as a server error.
    fn classify(&self, exception: &str, message: &str) -> Option<ApiError>;
}

/// Taxonomy of a service that documents no exception tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTaxonomy;

impl ErrorTaxonomy for NoTaxonomy {
    fn known_exceptions(&self) -> &[&'static str] {
        &[]
    }

    fn classify(&self, _exception: &str, _message: &str) -> Option<ApiError> {
        None
    }
}

/// Maps a failed response to exactly one error.
pub fn map_error_response(response: &HttpResponse, taxonomy: &dyn ErrorTaxonomy) -> ApiError {
    let server_error = || ApiError::Server {
        status: response.status,
        body: response.body.clone(),
    };

    let envelope: ErrorEnvelope = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(_) => return server_error(),
    };

    if let Some(message) = &envelope.message {
        if message.contains(MISSING_AUTHORIZATION) {
            return ApiError::Unauthorized(message.clone());
        }
    }

    let Some(exception) = envelope.exception.as_deref() else {
        return server_error();
    };
    if !taxonomy.known_exceptions().contains(&exception) {
        return server_error();
    }

    let message = envelope.error.as_deref().unwrap_or_default();
    taxonomy
        .classify(exception, message)
        .unwrap_or_else(server_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl ErrorTaxonomy for Fixed {
        fn known_exceptions(&self) -> &[&'static str] {
            &["Known", "Unparsable"]
        }

        fn classify(&self, exception: &str, message: &str) -> Option<ApiError> {
            (exception == "Known").then(|| ApiError::InvalidInput(message.to_string()))
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn known_tag_is_classified() {
        let err = map_error_response(
            &response(400, r#"{"exception":"Known","error":"bad"}"#),
            &Fixed,
        );
        assert!(matches!(err, ApiError::InvalidInput(m) if m == "bad"));
    }

    #[test]
    fn unknown_tag_is_server_error_for_any_status() {
        for status in [400, 401, 415, 500] {
            let err = map_error_response(
                &response(status, r#"{"exception":"Surprise","error":"?"}"#),
                &Fixed,
            );
            assert!(matches!(err, ApiError::Server { status: s, .. } if s == status));
        }
    }

    #[test]
    fn missing_tag_is_server_error() {
        let err = map_error_response(&response(500, r#"{"error":"oops"}"#), &Fixed);
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn non_json_body_is_server_error_with_raw_body() {
        let err = map_error_response(&response(502, "<html>bad gateway</html>"), &Fixed);
        match err {
            ApiError::Server { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn authorization_is_checked_before_the_tag() {
        let body = r#"{"message":"no Authorization header found","exception":"Known","error":"x"}"#;
        let err = map_error_response(&response(401, body), &Fixed);
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn unclassifiable_known_tag_falls_back_to_server_error() {
        let err = map_error_response(
            &response(400, r#"{"exception":"Unparsable","error":""}"#),
            &Fixed,
        );
        assert!(matches!(err, ApiError::Server { status: 400, .. }));
    }

    #[test]
    fn empty_taxonomy_only_knows_authorization() {
        let err = map_error_response(
            &response(400, r#"{"exception":"Known","error":"bad"}"#),
            &NoTaxonomy,
        );
        assert!(matches!(err, ApiError::Server { .. }));

        let err = map_error_response(
            &response(401, r#"{"message":"no Authorization header found"}"#),
            &NoTaxonomy,
        );
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
