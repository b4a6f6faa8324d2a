//! # Token Endpoint
//!
//! Issues client-credential access tokens for the LTI Advantage services,
//! per [RFC6749](https://tools.ietf.org/html/rfc6749#section-4.4) with a
//! Tool-signed JWT as client assertion. Tokens are stateless: a signed JWT
//! bound to the client id and granted scopes, valid for one hour purely by
//! its `iat`/`exp` claims.

use std::collections::HashSet;

use lti_core::error::Error;
use lti_core::Result;
use lti_jose::{jws, Jwks, Jwt, KeyOps, Signer};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::constants::ACCESS_TOKEN_SCOPES;
use crate::registration::Registration;
use crate::state::Expire;
use crate::Provider;

/// Grant type accepted by the token endpoint.
pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// An access token request, as form-decoded by the host.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Must be `client_credentials`.
    pub grant_type: Option<String>,

    /// The client assertion type URN.
    pub client_assertion_type: Option<String>,

    /// The Tool-signed JWT proving client identity.
    pub client_assertion: Option<String>,

    /// Space-separated requested scopes.
    pub scope: Option<String>,
}

/// A successful token response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    /// The signed access token.
    pub access_token: String,

    /// Always `bearer`.
    pub token_type: String,

    /// Token lifetime in seconds.
    pub expires_in: i64,

    /// The granted scopes, space-separated. Requested scopes outside the
    /// supported list have been dropped.
    pub scope: String,
}

/// Claims carried by an access token.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AccessTokenClaims {
    /// The Platform issuer.
    pub iss: String,

    /// The client id the token was minted for.
    pub sub: String,

    /// Space-separated granted scopes.
    pub scopes: String,

    /// Issued-at, injected at signing time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, injected at signing time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

// The subset of client assertion claims the endpoint inspects.
#[derive(Clone, Debug, Default, Deserialize)]
struct AssertionClaims {
    sub: Option<String>,
}

/// Token request handler.
///
/// The client assertion is verified against the Tool's keyset; requested
/// scopes are filtered against the supported list, with unknown scopes
/// silently dropped rather than rejected.
///
/// # Errors
///
/// `Error::MissingRequiredClaim` when a required field is absent,
/// `Error::UnsupportedGrantType` for any grant other than
/// `client_credentials`, and the keyset/verification errors of the client
/// assertion check.
#[instrument(level = "debug", skip(provider, request))]
pub async fn token(
    provider: &impl Provider, reg: &Registration, request: &TokenRequest,
) -> Result<TokenResponse> {
    tracing::debug!("token::token");

    let assertion = verify(reg, request)?;

    let claims: Jwt<AssertionClaims> = reg.tool_keyset.decode(provider, assertion).await?;
    if let Some(sub) = &claims.claims.sub {
        if sub != &reg.client_id {
            return Err(Error::InvalidClient(
                "client assertion was issued for another client".into(),
            ));
        }
    }

    // unknown scopes are filtered out, not rejected
    let requested = request.scope.as_deref().unwrap_or_default();
    let scope = requested
        .split_whitespace()
        .filter(|scope| ACCESS_TOKEN_SCOPES.contains(scope))
        .collect::<Vec<_>>()
        .join(" ");

    let signer = provider
        .signer()
        .map_err(|e| Error::KeyNotSet(format!("no platform signing key: {e}")))?;
    let claims = AccessTokenClaims {
        iss: reg.iss.clone(),
        sub: reg.client_id.clone(),
        scopes: scope.clone(),
        iat: None,
        exp: None,
    };
    let expires_in = Expire::Access.duration().num_seconds();
    let access_token = jws::encode(&claims, Some(expires_in), &signer).await?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        expires_in,
        scope,
    })
}

/// Decode an access token against the Platform's own public key and check
/// its scopes.
///
/// Returns `true` when the token verifies, was issued by this Platform, and
/// either `allowed_scopes` is empty (no restriction) or at least one granted
/// scope is in it.
pub async fn check_token(
    provider: &impl Provider, reg: &Registration, token: &str, allowed_scopes: &[&str],
) -> bool {
    tracing::debug!("token::check_token");

    let Ok(signer) = provider.signer() else {
        return false;
    };
    let Ok(jwk) = signer.public_jwk() else {
        return false;
    };
    let keyset = Jwks { keys: vec![jwk] };

    let jwt = match jws::decode::<AccessTokenClaims>(token, &keyset) {
        Ok(jwt) => jwt,
        Err(e) => {
            tracing::debug!("access token rejected: {e}");
            return false;
        }
    };
    if jwt.claims.iss != reg.iss {
        return false;
    }
    if allowed_scopes.is_empty() {
        return true;
    }

    let granted: HashSet<&str> = jwt.claims.scopes.split_whitespace().collect();
    allowed_scopes.iter().any(|scope| granted.contains(scope))
}

// Field presence and grant type checks, returning the client assertion.
fn verify<'a>(_reg: &Registration, request: &'a TokenRequest) -> Result<&'a str> {
    tracing::debug!("token::verify");

    let Some(grant_type) = request.grant_type.as_deref() else {
        return Err(Error::MissingRequiredClaim("token request has no grant_type".into()));
    };
    if request.client_assertion_type.is_none() {
        return Err(Error::MissingRequiredClaim(
            "token request has no client_assertion_type".into(),
        ));
    }
    let Some(assertion) = request.client_assertion.as_deref() else {
        return Err(Error::MissingRequiredClaim(
            "token request has no client_assertion".into(),
        ));
    };
    if request.scope.is_none() {
        return Err(Error::MissingRequiredClaim("token request has no scope".into()));
    }

    if grant_type != CLIENT_CREDENTIALS_GRANT {
        return Err(Error::UnsupportedGrantType(format!(
            "grant {grant_type} is not supported"
        )));
    }
    Ok(assertion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_requires_every_field() {
        let reg = Registration::default();
        let complete = TokenRequest {
            grant_type: Some(CLIENT_CREDENTIALS_GRANT.into()),
            client_assertion_type: Some(
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer".into(),
            ),
            client_assertion: Some("a.b.c".into()),
            scope: Some(String::new()),
        };
        assert!(verify(&reg, &complete).is_ok());

        for strip in 0..4 {
            let mut request = complete.clone();
            match strip {
                0 => request.grant_type = None,
                1 => request.client_assertion_type = None,
                2 => request.client_assertion = None,
                _ => request.scope = None,
            }
            let err = verify(&reg, &request).expect_err("missing field");
            assert!(matches!(err, Error::MissingRequiredClaim(_)));
        }
    }

    #[test]
    fn verify_rejects_other_grants() {
        let request = TokenRequest {
            grant_type: Some("authorization_code".into()),
            client_assertion_type: Some("urn:x".into()),
            client_assertion: Some("a.b.c".into()),
            scope: Some(String::new()),
        };
        let err = verify(&Registration::default(), &request).expect_err("wrong grant");
        assert!(matches!(err, Error::UnsupportedGrantType(_)));
    }
}
