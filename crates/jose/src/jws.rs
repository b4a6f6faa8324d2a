//! # JSON Web Signature (JWS)
//!
//! Compact-serialization JWS ([RFC7515]) encode and decode for LTI 1.3
//! messages. Encoding signs with the Platform's key via the [`Signer`]
//! trait; decoding tries every key in the resolved keyset and succeeds on
//! the first valid RS256/RS512 signature.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use lti_core::error::Error;
use lti_core::Result;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Sha256, Sha512};

use crate::jwk::{Jwks, PublicKeyJwk};
use crate::{Algorithm, Signer};

/// Represents the JWS protected header.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Digital signature algorithm identifier.
    pub alg: Algorithm,

    /// Key id of the signing key, so verifiers can select the matching JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Token type, `JWT` for all LTI messages.
    pub typ: String,
}

/// A decoded JWT: header plus claims. The signature has already been
/// verified by the time a `Jwt` exists.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwt<T> {
    /// The JWT header.
    pub header: Header,

    /// The JWT claims.
    pub claims: T,
}

/// Encode the provided claims and sign, returning a JWT in compact JWS form.
///
/// When `expires_in` is set, `iat` and `exp` are injected into the claim set
/// before signing.
pub async fn encode<T>(claims: &T, expires_in: Option<i64>, signer: &impl Signer) -> Result<String>
where
    T: Serialize + Send + Sync,
{
    tracing::debug!("jws::encode");

    let Value::Object(mut claims) = serde_json::to_value(claims)
        .map_err(|e| Error::ServerError(format!("issue serializing claims: {e}")))?
    else {
        return Err(Error::ServerError("claims must serialize to a JSON object".into()));
    };
    if let Some(expires_in) = expires_in {
        let now = Utc::now().timestamp();
        claims.insert("iat".into(), Value::from(now));
        claims.insert("exp".into(), Value::from(now + expires_in));
    }

    let header = Header {
        alg: signer.algorithm(),
        kid: Some(signer.key_id()),
        typ: "JWT".into(),
    };

    let header_enc = Base64UrlUnpadded::encode_string(
        &serde_json::to_vec(&header)
            .map_err(|e| Error::ServerError(format!("issue serializing header: {e}")))?,
    );
    let claims_enc = Base64UrlUnpadded::encode_string(
        &serde_json::to_vec(&claims)
            .map_err(|e| Error::ServerError(format!("issue serializing claims: {e}")))?,
    );
    let payload = format!("{header_enc}.{claims_enc}");

    let sig = signer
        .try_sign(payload.as_bytes())
        .await
        .map_err(|e| Error::Signing(format!("issue signing JWT: {e}")))?;
    let sig_enc = Base64UrlUnpadded::encode_string(&sig);

    Ok(format!("{payload}.{sig_enc}"))
}

/// Decode the token, verifying its signature against the provided keyset and
/// its `exp` claim against the current time.
///
/// Every key in the keyset is tried in order; the first valid signature
/// wins. An empty keyset is a no-suitable-keys condition.
pub fn decode<T>(token: &str, keyset: &Jwks) -> Result<Jwt<T>>
where
    T: DeserializeOwned,
{
    tracing::debug!("jws::decode");

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::MalformedToken("invalid compact JWS format".into()));
    }

    let decoded = Base64UrlUnpadded::decode_vec(parts[0])
        .map_err(|e| Error::MalformedToken(format!("issue decoding header: {e}")))?;
    let header: Header = serde_json::from_slice(&decoded)
        .map_err(|_| Error::MalformedToken("'alg' is not recognised".into()))?;
    let decoded = Base64UrlUnpadded::decode_vec(parts[1])
        .map_err(|e| Error::MalformedToken(format!("issue decoding claims: {e}")))?;
    let claims: Value = serde_json::from_slice(&decoded)
        .map_err(|e| Error::MalformedToken(format!("issue deserializing claims: {e}")))?;
    let sig = Base64UrlUnpadded::decode_vec(parts[2])
        .map_err(|e| Error::MalformedToken(format!("issue decoding signature: {e}")))?;

    if keyset.keys.is_empty() {
        return Err(Error::NoSuitableKeys("keyset is empty".into()));
    }

    let msg = format!("{}.{}", parts[0], parts[1]);
    let mut last_error = None;
    let verified = keyset.keys.iter().any(|jwk| {
        verify(jwk, header.alg, &msg, &sig).map_err(|e| last_error = Some(e)).is_ok()
    });
    if !verified {
        let detail = last_error.map_or_else(String::new, |e| format!(": {e}"));
        return Err(Error::SignatureVerification(format!(
            "no key in the keyset verified the token{detail}"
        )));
    }

    if let Some(exp) = claims.get("exp").and_then(Value::as_i64) {
        if exp < Utc::now().timestamp() {
            return Err(Error::TokenExpired("token 'exp' is in the past".into()));
        }
    }

    let claims = serde_json::from_value::<T>(claims)
        .map_err(|e| Error::MalformedToken(format!("issue deserializing claims: {e}")))?;

    Ok(Jwt { header, claims })
}

/// Read the `kid` from a token's header without verifying the signature.
/// Used to tag a pinned Tool key before keyset resolution.
pub fn peek_kid(token: &str) -> Result<Option<String>> {
    let Some(header) = token.split('.').next() else {
        return Err(Error::MalformedToken("invalid compact JWS format".into()));
    };
    let decoded = Base64UrlUnpadded::decode_vec(header)
        .map_err(|e| Error::MalformedToken(format!("issue decoding header: {e}")))?;
    let header: Header = serde_json::from_slice(&decoded)
        .map_err(|_| Error::MalformedToken("'alg' is not recognised".into()))?;
    Ok(header.kid)
}

// Verify the signature of the provided message using the JWK.
fn verify(jwk: &PublicKeyJwk, alg: Algorithm, msg: &str, sig: &[u8]) -> Result<()> {
    let key = jwk.to_public_key()?;
    let signature = Signature::try_from(sig)
        .map_err(|e| Error::MalformedToken(format!("invalid signature encoding: {e}")))?;

    let verified = match alg {
        Algorithm::Rs256 => VerifyingKey::<Sha256>::new(key).verify(msg.as_bytes(), &signature),
        Algorithm::Rs512 => VerifyingKey::<Sha512>::new(key).verify(msg.as_bytes(), &signature),
    };
    verified.map_err(|e| Error::SignatureVerification(format!("signature mismatch: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::PlatformSigner;

    fn signer(seed: u8) -> PlatformSigner {
        use rand_chacha::rand_core::SeedableRng;
        use rand_chacha::ChaCha20Rng;

        let mut rng = ChaCha20Rng::from_seed([seed; 32]);
        let key = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        PlatformSigner::new(key, format!("kid-{seed}"))
    }

    #[tokio::test]
    async fn encode_decode_round_trip() {
        let signer = signer(1);
        let claims = json!({"iss": "https://lms.example.edu", "sub": "user-1"});

        let token = encode(&claims, Some(3600), &signer).await.expect("should sign");
        let keyset = Jwks { keys: vec![signer.public_jwk().expect("jwk")] };
        let jwt: Jwt<Value> = decode(&token, &keyset).expect("should verify");

        assert_eq!(jwt.header.kid.as_deref(), Some("kid-1"));
        assert_eq!(jwt.claims["iss"], "https://lms.example.edu");
        assert!(jwt.claims.get("iat").is_some() && jwt.claims.get("exp").is_some());
    }

    #[tokio::test]
    async fn decode_fails_with_other_key() {
        let other = signer(2);
        let signer = signer(1);
        let token =
            encode(&json!({"sub": "user-1"}), None, &signer).await.expect("should sign");

        let keyset = Jwks { keys: vec![other.public_jwk().expect("jwk")] };
        let err = decode::<Value>(&token, &keyset).expect_err("wrong key");
        assert!(matches!(err, Error::SignatureVerification(_)));
    }

    #[tokio::test]
    async fn decode_fails_with_empty_keyset() {
        let signer = signer(1);
        let token =
            encode(&json!({"sub": "user-1"}), None, &signer).await.expect("should sign");

        let err = decode::<Value>(&token, &Jwks::default()).expect_err("no keys");
        assert!(matches!(err, Error::NoSuitableKeys(_)));
    }

    #[tokio::test]
    async fn decode_rejects_expired_token() {
        let signer = signer(1);
        let token = encode(&json!({"sub": "user-1"}), Some(-10), &signer)
            .await
            .expect("should sign");

        let keyset = Jwks { keys: vec![signer.public_jwk().expect("jwk")] };
        let err = decode::<Value>(&token, &keyset).expect_err("expired");
        assert!(matches!(err, Error::TokenExpired(_)));
    }

    #[test]
    fn decode_rejects_malformed_token() {
        let keyset = Jwks::default();
        let err = decode::<Value>("not-a-jwt", &keyset).expect_err("malformed");
        assert!(matches!(err, Error::MalformedToken(_)));
    }
}
