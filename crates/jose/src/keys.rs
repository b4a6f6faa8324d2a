//! Key material for a Platform-Tool pairing.
//!
//! The Platform side owns one RSA private key (plus key id) used to sign
//! outgoing JWTs. The Tool side is either a pinned public JWK, a remote JWKS
//! URL, or both — supporting both lets a Tool rotate keys without
//! Platform-side reconfiguration.

use std::future::Future;

use lti_core::error::Error;
use lti_core::Result;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::RsaPrivateKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::jwk::{Jwks, PublicKeyJwk};
use crate::{jws, Algorithm, Jwt, KeysetResolver, Signer};

/// The Platform's signing identity: one RSA private key and its key id.
#[derive(Clone)]
pub struct PlatformSigner {
    kid: String,
    key: RsaPrivateKey,
}

impl std::fmt::Debug for PlatformSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSigner").field("kid", &self.kid).finish_non_exhaustive()
    }
}

impl PlatformSigner {
    /// Create a signer from an existing RSA private key.
    pub fn new(key: RsaPrivateKey, kid: impl Into<String>) -> Self {
        Self { kid: kid.into(), key }
    }

    /// Create a signer from a PEM-encoded RSA private key (PKCS#8 or
    /// PKCS#1).
    pub fn from_pem(pem: &str, kid: impl Into<String>) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| Error::InvalidKey(format!("issue parsing RSA private key: {e}")))?;
        Ok(Self::new(key, kid))
    }

    /// The public half of the signing key as a JWK Set, for the Platform's
    /// keyset endpoint.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![PublicKeyJwk::from_public_key(
                &self.key.to_public_key(),
                Some(self.kid.clone()),
            )],
        }
    }
}

impl Signer for PlatformSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Rs256
    }

    fn key_id(&self) -> String {
        self.kid.clone()
    }

    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
        let signing_key = SigningKey::<Sha256>::new(self.key.clone());
        let msg = msg.to_vec();
        async move {
            let signature = signing_key.try_sign(&msg)?;
            Ok(signature.to_vec())
        }
    }

    fn public_jwk(&self) -> anyhow::Result<PublicKeyJwk> {
        Ok(PublicKeyJwk::from_public_key(&self.key.to_public_key(), Some(self.kid.clone())))
    }
}

/// The Tool's verification keys: a pinned public key, a remote JWKS URL, or
/// both.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ToolKeyset {
    /// A pinned Tool public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_jwk: Option<PublicKeyJwk>,

    /// URL of the Tool's rotatable JWKS document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_url: Option<String>,
}

impl ToolKeyset {
    /// Resolve the verification keyset for an inbound token.
    ///
    /// A configured JWKS URL is fetched through the resolver (failure is a
    /// no-suitable-keys condition). A pinned key is tagged with the
    /// requested `kid` — verifiers that match keys strictly by `kid` would
    /// otherwise reject it — and appended after any fetched keys.
    pub async fn resolve(
        &self, resolver: &impl KeysetResolver, kid: Option<&str>,
    ) -> Result<Jwks> {
        let mut keys = Vec::new();

        if let Some(url) = &self.jwks_url {
            let fetched = resolver.fetch(url).await.map_err(|e| {
                tracing::debug!("JWKS fetch failed for {url}: {e}");
                Error::NoSuitableKeys(format!("issue fetching JWKS from {url}: {e}"))
            })?;
            keys.extend(fetched.keys);
        }

        if let Some(jwk) = &self.public_jwk {
            let mut jwk = jwk.clone();
            if let Some(kid) = kid {
                jwk.kid = Some(kid.to_string());
            }
            keys.push(jwk);
        }

        if keys.is_empty() {
            return Err(Error::NoSuitableKeys("no keys configured for the tool".into()));
        }
        Ok(Jwks { keys })
    }

    /// Verify and decode a Tool-signed token against the resolved keyset.
    pub async fn decode<T>(&self, resolver: &impl KeysetResolver, token: &str) -> Result<Jwt<T>>
    where
        T: DeserializeOwned,
    {
        let kid = jws::peek_kid(token)?;
        let keyset = self.resolve(resolver, kid.as_deref()).await?;
        jws::decode(token, &keyset)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use serde_json::{json, Value};

    use super::*;

    struct Resolver(Option<Jwks>);

    impl KeysetResolver for Resolver {
        async fn fetch(&self, _url: &str) -> anyhow::Result<Jwks> {
            self.0.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn tool_signer() -> PlatformSigner {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        PlatformSigner::new(key, "tool-kid")
    }

    #[tokio::test]
    async fn pinned_key_is_tagged_with_requested_kid() {
        let signer = tool_signer();
        let mut jwk = signer.public_jwk().expect("jwk");
        jwk.kid = None;

        let keyset = ToolKeyset { public_jwk: Some(jwk), jwks_url: None };
        let token = jws::encode(&json!({"iss": "tool"}), None, &signer).await.expect("signed");

        let jwt: Jwt<Value> =
            keyset.decode(&Resolver(None), &token).await.expect("should verify");
        assert_eq!(jwt.claims["iss"], "tool");

        let resolved =
            keyset.resolve(&Resolver(None), Some("tool-kid")).await.expect("resolved");
        assert_eq!(resolved.keys[0].kid.as_deref(), Some("tool-kid"));
    }

    #[tokio::test]
    async fn fetch_failure_is_no_suitable_keys() {
        let keyset = ToolKeyset {
            public_jwk: None,
            jwks_url: Some("https://tool.example/jwks.json".into()),
        };
        let err = keyset.resolve(&Resolver(None), None).await.expect_err("fetch fails");
        assert!(matches!(err, Error::NoSuitableKeys(_)));
    }

    #[tokio::test]
    async fn empty_configuration_is_no_suitable_keys() {
        let keyset = ToolKeyset::default();
        let err = keyset.resolve(&Resolver(None), None).await.expect_err("no keys");
        assert!(matches!(err, Error::NoSuitableKeys(_)));
    }

    #[tokio::test]
    async fn remote_keys_are_tried_before_pinned_key() {
        let signer = tool_signer();
        let keyset = ToolKeyset {
            public_jwk: Some(signer.public_jwk().expect("jwk")),
            jwks_url: Some("https://tool.example/jwks.json".into()),
        };
        // remote keyset holds an unrelated key; the pinned key still verifies
        let mut rng = ChaCha20Rng::from_seed([4u8; 32]);
        let other = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let remote = Jwks {
            keys: vec![PublicKeyJwk::from_public_key(&other.to_public_key(), None)],
        };

        let token = jws::encode(&json!({"iss": "tool"}), None, &signer).await.expect("signed");
        let jwt: Jwt<Value> =
            keyset.decode(&Resolver(Some(remote)), &token).await.expect("should verify");
        assert_eq!(jwt.claims["iss"], "tool");
    }
}
