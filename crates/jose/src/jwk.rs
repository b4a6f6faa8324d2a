//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key.
//! Additionally, a JWK Set (JWKS) is used to represent a set of JWKs.
//!
//! Only RSA keys are represented: LTI 1.3 mandates RSA (RS256) signatures
//! for launch messages and client assertions.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use base64ct::{Base64UrlUnpadded, Encoding};
use lti_core::error::Error;
use lti_core::Result;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::Algorithm;

/// Simplified JSON Web Key (JWK) key structure for RSA public keys.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicKeyJwk {
    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type.
    pub kty: KeyType,

    /// Algorithm intended for use with the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<Algorithm>,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,

    /// RSA modulus, base64url encoded big-endian bytes.
    pub n: String,

    /// RSA public exponent, base64url encoded big-endian bytes.
    pub e: String,
}

impl PublicKeyJwk {
    /// Build a JWK from an RSA public key.
    #[must_use]
    pub fn from_public_key(key: &RsaPublicKey, kid: Option<String>) -> Self {
        Self {
            kid,
            kty: KeyType::Rsa,
            alg: Some(Algorithm::Rs256),
            use_: Some(KeyUse::Signature),
            n: Base64UrlUnpadded::encode_string(&key.n().to_bytes_be()),
            e: Base64UrlUnpadded::encode_string(&key.e().to_bytes_be()),
        }
    }

    /// Rebuild the RSA public key from the JWK parameters.
    pub fn to_public_key(&self) -> Result<RsaPublicKey> {
        let n = Base64UrlUnpadded::decode_vec(&self.n)
            .map_err(|e| Error::InvalidKey(format!("issue decoding JWK 'n': {e}")))?;
        let e = Base64UrlUnpadded::decode_vec(&self.e)
            .map_err(|e| Error::InvalidKey(format!("issue decoding JWK 'e': {e}")))?;

        RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
            .map_err(|e| Error::InvalidKey(format!("invalid RSA public key: {e}")))
    }
}

/// Cryptographic key type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// RSA key pair.
    #[default]
    #[serde(rename = "RSA")]
    Rsa,
}

/// The intended usage of the public key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyUse {
    /// Public key is to be used for signature verification.
    #[default]
    #[serde(rename = "sig")]
    Signature,

    /// Public key is to be used for encryption.
    #[serde(rename = "enc")]
    Encryption,
}

/// A set of JWKs, as served by the Platform's public keyset endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// The set of public key JWKs.
    pub keys: Vec<PublicKeyJwk>,
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use rsa::RsaPrivateKey;

    use super::*;

    #[test]
    fn public_key_round_trip() {
        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
        let public = key.to_public_key();

        let jwk = PublicKeyJwk::from_public_key(&public, Some("kid-1".into()));
        assert_eq!(jwk.kty, KeyType::Rsa);
        assert_eq!(jwk.to_public_key().expect("valid key"), public);
    }

    #[test]
    fn rejects_garbage_parameters() {
        let jwk = PublicKeyJwk {
            n: "!!not-base64!!".into(),
            e: "AQAB".into(),
            ..PublicKeyJwk::default()
        };
        assert!(matches!(jwk.to_public_key(), Err(Error::InvalidKey(_))));
    }
}
