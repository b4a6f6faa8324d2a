//! Deterministic RSA key material. Keys are derived from a seeded CSPRNG so
//! every test run uses the same pair without checked-in key files, and
//! generated once per process.

use std::sync::OnceLock;

use lti_jose::PlatformSigner;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

const RSA_KEY_BITS: usize = 2048;

static PLATFORM_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
static TOOL_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

fn deterministic_key(seed: &str) -> RsaPrivateKey {
    let hash = Sha256::digest(seed.as_bytes());
    let mut rng = ChaCha20Rng::from_seed(hash.into());
    RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).expect("key generation")
}

/// The Platform's signing identity.
#[must_use]
pub fn platform_signer() -> PlatformSigner {
    let key = PLATFORM_KEY.get_or_init(|| deterministic_key("platform-signing-key"));
    PlatformSigner::new(key.clone(), "platform-kid")
}

/// The test Tool's signing identity, for producing client assertions, Deep
/// Linking responses, and proctoring tokens in tests.
#[must_use]
pub fn tool_signer() -> PlatformSigner {
    let key = TOOL_KEY.get_or_init(|| deterministic_key("tool-signing-key"));
    PlatformSigner::new(key.clone(), "tool-kid")
}
