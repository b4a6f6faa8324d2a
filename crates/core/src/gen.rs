//! # Generate
//!
//! Generate random strings for use in OAuth1 nonces, OIDC state, launch
//! cache keys, and Outcomes message identifiers.

use base64ct::{Base64UrlUnpadded, Encoding};

// "'`+=,./\|:;?><}{][_-
const SAFE_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789)(*&^%$#@!~";
const STATE_LEN: usize = 32;

/// Generates a base64 encoded random string for an OAuth nonce.
#[must_use]
pub fn nonce() -> String {
    let rnd = random_string(STATE_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a base64 encoded random string for OIDC `state`.
#[must_use]
pub fn state() -> String {
    let rnd = random_string(STATE_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a base64 encoded random string used as the launch data cache
/// key, sent to the Tool as `lti_message_hint`.
#[must_use]
pub fn launch_key() -> String {
    let rnd = random_string(STATE_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a base64 encoded random string for an Outcomes response
/// `imsx_messageIdentifier`.
#[must_use]
pub fn message_id() -> String {
    let rnd = random_string(STATE_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

// Generates a random string from a given set of characters. Uses fastrand so
// is not cryptographically secure.
fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    (0..len).map(|_| chars[fastrand::usize(..chars.len())]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_unique() {
        assert_ne!(nonce(), nonce());
    }

    #[test]
    fn launch_key_is_url_safe() {
        let key = launch_key();
        assert!(!key.contains('+') && !key.contains('/') && !key.contains('='));
    }
}
