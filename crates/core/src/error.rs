//! # LTI Errors
//!
//! This module defines the errors raised by the LTI 1.1 and LTI 1.3
//! consumers. Variants used by the access token endpoint carry their
//! [RFC 6749](https://www.rfc-editor.org/rfc/rfc6749#section-5.2) error code
//! so the HTTP boundary can return the mandated response body verbatim.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors raised while building, signing, or verifying LTI messages.
///
/// Every variant renders as an OAuth-style JSON body. Cryptographic variants
/// deliberately carry no more detail than the protocol response vocabulary
/// allows.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, repeats a parameter, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// Client authentication failed: unknown client id, no client assertion
    /// included, or the assertion did not verify against the Tool's keys.
    #[error(r#"{{"error": "invalid_client", "error_description": "{0}"}}"#)]
    InvalidClient(String),

    /// The provided authorization grant is invalid, expired, or was issued to
    /// another client.
    #[error(r#"{{"error": "invalid_grant", "error_description": "{0}"}}"#)]
    InvalidGrant(String),

    /// The authorization grant type is not supported. The token endpoint only
    /// supports `client_credentials`.
    #[error(r#"{{"error": "unsupported_grant_type", "error_description": "{0}"}}"#)]
    UnsupportedGrantType(String),

    /// The requested scope is invalid, unknown, or malformed.
    #[error(r#"{{"error": "invalid_scope", "error_description": "{0}"}}"#)]
    InvalidScope(String),

    /// The resource owner or authorization server denied the request.
    #[error(r#"{{"error": "access_denied", "error_description": "{0}"}}"#)]
    AccessDenied(String),

    /// An unexpected condition prevented the server from fulfilling the
    /// request, including provider (state store, key store) failures.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),

    /// A launch was generated before its required data (user data, context
    /// data, resource link) was supplied.
    #[error(r#"{{"error": "missing_required_data", "error_description": "{0}"}}"#)]
    MissingRequiredData(String),

    /// A required JWT claim or token request field is absent.
    #[error(r#"{{"error": "missing_required_claim", "error_description": "{0}"}}"#)]
    MissingRequiredClaim(String),

    /// The OIDC preflight response failed validation: `nonce`, `state`,
    /// `redirect_uri` missing, or `client_id`/`redirect_uri` not matching the
    /// registration.
    #[error(r#"{{"error": "preflight_validation_failed", "error_description": "{0}"}}"#)]
    PreflightValidation(String),

    /// A claim is present but its value does not match the expected one.
    #[error(r#"{{"error": "invalid_claim_value", "error_description": "{0}"}}"#)]
    InvalidClaimValue(String),

    /// An OAuth1 body hash or HMAC-SHA1 signature did not verify.
    #[error(r#"{{"error": "signature_verification_failed", "error_description": "{0}"}}"#)]
    SignatureVerification(String),

    /// No verification keys could be resolved for the Tool: the keyset was
    /// empty, or the remote JWKS could not be fetched or parsed.
    #[error(r#"{{"error": "no_suitable_keys", "error_description": "{0}"}}"#)]
    NoSuitableKeys(String),

    /// The token is not a structurally valid compact JWS, or no resolved key
    /// verified its signature.
    #[error(r#"{{"error": "malformed_token", "error_description": "{0}"}}"#)]
    MalformedToken(String),

    /// The token's `exp` claim is in the past.
    #[error(r#"{{"error": "token_expired", "error_description": "{0}"}}"#)]
    TokenExpired(String),

    /// A Deep Linking response carried a content item whose type is not in
    /// the accepted list. The whole batch is rejected.
    #[error(r#"{{"error": "unsupported_content_type", "error_description": "{0}"}}"#)]
    ContentTypeNotSupported(String),

    /// A result score is outside `[0.0, 1.0]` or not numeric.
    #[error(r#"{{"error": "score_out_of_range", "error_description": "{0}"}}"#)]
    ScoreRange(String),

    /// An inbound XML or JSON payload is structurally invalid for its
    /// protocol (missing nodes, wrong envelope, bad types).
    #[error(r#"{{"error": "malformed_request", "error_description": "{0}"}}"#)]
    MalformedRequest(String),

    /// Producing a signature failed, e.g. the launch URL has no scheme.
    #[error(r#"{{"error": "signing_failed", "error_description": "{0}"}}"#)]
    Signing(String),

    /// No signing key is configured for this Platform-Tool pairing.
    #[error(r#"{{"error": "key_not_set", "error_description": "{0}"}}"#)]
    KeyNotSet(String),

    /// Key material was supplied but could not be parsed as an RSA key.
    #[error(r#"{{"error": "invalid_key", "error_description": "{0}"}}"#)]
    InvalidKey(String),
}

/// Error response shape shared by the token endpoint and the launch
/// error pages.
#[derive(Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    pub error_description: String,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as SerdeError;

        let Ok(error) = serde_json::from_str::<ErrorResponse>(&self.to_string()) else {
            return Err(SerdeError::custom("issue deserializing Error"));
        };
        error.serialize(serializer)
    }
}

impl Error {
    /// Transform the error to an OAuth-compatible json format.
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        serde_json::from_str(&self.to_string()).unwrap_or_default()
    }

    /// Transform the error to an OAuth-compatible query string format, for
    /// redirect-based error responses.
    #[must_use]
    pub fn to_querystring(self) -> String {
        serde_qs::to_string(&self).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;

    // Test that error details are returned as json.
    #[test]
    fn err_json() {
        let err = Error::UnsupportedGrantType("grant must be client_credentials".into());
        let ser: Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(
            ser,
            json!({
                "error": "unsupported_grant_type",
                "error_description": "grant must be client_credentials"
            })
        );
    }

    // Test that the error details are returned as an http query string.
    #[test]
    fn err_querystring() {
        let err = Error::InvalidRequest("Invalid request description".into());
        let ser = serde_qs::to_string(&err).unwrap();
        assert_eq!(ser, "error=invalid_request&error_description=Invalid+request+description");
    }

    #[test]
    fn err_serialize() {
        let err = Error::InvalidClient("unknown client_id".into());
        let ser = serde_json::to_value(&err).unwrap();
        assert_eq!(
            ser,
            json!({"error": "invalid_client", "error_description": "unknown client_id"})
        );
    }
}
