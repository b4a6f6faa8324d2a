//! # Key Handling for lti-rs
//!
//! RSA key material and compact JWS signing/verification for LTI 1.3
//! messages: the Platform signs `id_token` launches and access tokens with
//! its private key, and verifies Tool-signed JWTs (client assertions, Deep
//! Linking responses, proctoring tokens) against a pinned public key or a
//! remote JWKS.
//!
//! This crate is for internal use within the lti-rs project and is not
//! intended to be used directly.

pub mod jwk;
pub mod jws;
mod keys;

use std::fmt::Display;
use std::future::Future;

use serde::{Deserialize, Serialize};

pub use crate::jwk::{Jwks, PublicKeyJwk};
pub use crate::jws::{Header, Jwt};
pub use crate::keys::{PlatformSigner, ToolKeyset};

/// Signing algorithm used for LTI 1.3 JWTs, as per IANA "JSON Web Signature
/// and Encryption Algorithms". LTI mandates RSA signatures; RS256 is the
/// interoperable baseline.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    #[default]
    #[serde(rename = "RS256")]
    Rs256,

    /// RSASSA-PKCS1-v1_5 using SHA-512.
    #[serde(rename = "RS512")]
    Rs512,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rs256 => write!(f, "RS256"),
            Self::Rs512 => write!(f, "RS512"),
        }
    }
}

/// Signer is implemented by the Platform's signing identity. Exactly one
/// signing identity (kid, key) exists per Platform-Tool pairing.
pub trait Signer: Send + Sync {
    /// Algorithm returns the algorithm used by the signer.
    fn algorithm(&self) -> Algorithm;

    /// The key id placed in the JWS header so Tools can select the matching
    /// JWK from the Platform's keyset endpoint.
    fn key_id(&self) -> String;

    /// Sign the message, returning the raw signature bytes.
    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    /// The public half of the signing key as a JWK.
    fn public_jwk(&self) -> anyhow::Result<PublicKeyJwk>;
}

/// `KeyOps` is implemented by the host to surface the Platform signing key
/// for a request. An error means no key is configured.
pub trait KeyOps: Send + Sync {
    /// Returns the Platform's signer.
    fn signer(&self) -> anyhow::Result<impl Signer>;
}

/// `KeysetResolver` is implemented by the host to fetch a Tool's remote JWKS
/// document.
///
/// Implementations own transport policy: they should impose a short timeout
/// (a few seconds) and may cache, provided the cache uses a short TTL and is
/// invalidated when signature verification fails, so staleness cannot
/// silently admit a revoked key. Fetch failure and timeout both surface to
/// callers as a no-suitable-keys condition.
pub trait KeysetResolver: Send + Sync {
    /// Fetch and parse the JWKS document at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<Jwks>> + Send;
}
