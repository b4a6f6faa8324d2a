//! # Public Keyset Endpoint
//!
//! Serves the Platform's public JWK Set so Tools can verify `id_token`
//! signatures. An unconfigured signing key yields an empty set rather than
//! an error.

use lti_core::error::Error;
use lti_core::Result;
use lti_jose::{Jwks, KeyOps, Signer};

use crate::Provider;

/// Keyset request handler.
pub async fn jwks(provider: &impl Provider) -> Result<Jwks> {
    tracing::debug!("jwks::jwks");

    let Ok(signer) = provider.signer() else {
        return Ok(Jwks::default());
    };
    let jwk = signer
        .public_jwk()
        .map_err(|e| Error::ServerError(format!("issue exporting public JWK: {e}")))?;
    Ok(Jwks { keys: vec![jwk] })
}
