//! # OAuth1 Signature Engine
//!
//! HMAC-SHA1 signing ([RFC5849]) for outbound LTI 1.1 launches and
//! verification of Tool-originated grade callbacks.
//!
//! Grade callbacks are JSON/XML POST bodies rather than form-encoded
//! parameters, so header-only OAuth1 signing cannot bind them. The OAuth
//! body-hash extension closes that gap: the SHA-1 hash of the raw body is
//! carried as the `oauth_body_hash` parameter and participates in the
//! signature.
//!
//! [RFC5849]: https://www.rfc-editor.org/rfc/rfc5849

use std::collections::BTreeMap;

use base64ct::{Base64, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use lti_core::error::Error;
use lti_core::{gen, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::{Digest, Sha1};
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters are the only ones left unescaped when
/// building signature base strings and header values.
const UNRESERVED: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// An inbound signed request, as seen by the Platform: the externally
/// visible URL, the `Authorization` header, and the raw body bytes.
#[derive(Clone, Copy, Debug)]
pub struct VerifyRequest<'a> {
    /// The URL the request arrived on.
    pub url: &'a str,

    /// The OAuth1 `Authorization` header.
    pub authorization: &'a str,

    /// Raw request body.
    pub body: &'a [u8],
}

/// Build an OAuth1 HMAC-SHA1 `Authorization` header for a POST of the given
/// form parameters.
///
/// # Errors
///
/// Returns `Error::Signing` if the URL has no scheme or host.
pub fn sign(
    key: &str, secret: &str, url: &str, params: &BTreeMap<String, String>,
) -> Result<String> {
    let mut oauth_params = protocol_params(key);
    let all: BTreeMap<String, String> =
        oauth_params.iter().chain(params.iter()).map(|(k, v)| (k.clone(), v.clone())).collect();

    let signature = signature(secret, url, &all)?;
    oauth_params.insert("oauth_signature".into(), signature);

    Ok(authorization_header(&oauth_params))
}

/// Build an OAuth1 `Authorization` header binding the raw request body via
/// the body-hash extension, for POSTs whose body is not form-encoded.
///
/// # Errors
///
/// Returns `Error::Signing` if the URL has no scheme or host.
pub fn sign_body(key: &str, secret: &str, url: &str, body: &[u8]) -> Result<String> {
    let mut oauth_params = protocol_params(key);
    oauth_params.insert("oauth_body_hash".into(), Base64::encode_string(&Sha1::digest(body)));

    let signature = signature(secret, url, &oauth_params)?;
    oauth_params.insert("oauth_signature".into(), signature);

    Ok(authorization_header(&oauth_params))
}

/// Verify an inbound body-signed request.
///
/// The SHA-1 hash of the raw body is recomputed and compared to the
/// `oauth_body_hash` parameter, then the HMAC-SHA1 signature is verified
/// against two candidate URIs: the caller-supplied `service_url` and the
/// request's own URL. Either verifying is accepted — reverse proxies and
/// load balancers can make the externally visible URL differ from the URL
/// the signer used.
pub fn verify_body_signature(
    request: &VerifyRequest<'_>, secret: &str, service_url: &str,
) -> Result<()> {
    tracing::debug!("oauth1::verify_body_signature");

    let mut params = parse_authorization_header(request.authorization);

    let Some(body_hash) = params.get("oauth_body_hash") else {
        return Err(Error::SignatureVerification("request has no oauth_body_hash".into()));
    };
    if body_hash != &Base64::encode_string(&Sha1::digest(request.body)) {
        return Err(Error::SignatureVerification(
            "oauth_body_hash does not match the request body".into(),
        ));
    }

    let Some(provided) = params.remove("oauth_signature") else {
        return Err(Error::SignatureVerification("request has no oauth_signature".into()));
    };
    params.remove("realm");

    for candidate in [service_url, request.url] {
        if verify_signature(secret, candidate, &params, &provided)? {
            return Ok(());
        }
    }
    Err(Error::SignatureVerification(
        "signature did not verify against the service URL or the request URL".into(),
    ))
}

/// Split an OAuth1 `Authorization` header back into its parameters.
///
/// Values are unquoted and percent-decoded once — the signer encoded them
/// once, and leaving them encoded would double-encode on retransmission.
/// The `OAuth ` scheme prefix attached to the first parameter name is
/// stripped.
#[must_use]
pub fn parse_authorization_header(header: &str) -> BTreeMap<String, String> {
    let stripped = header.strip_prefix("OAuth ").unwrap_or(header);

    let mut params = BTreeMap::new();
    for part in stripped.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let key = key.trim().trim_start_matches("OAuth ").trim();
        let value = value.trim().trim_matches('"');
        let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
        params.insert(key.to_string(), value);
    }
    params
}

// Compute the base64 HMAC-SHA1 signature over the base string for `url` and
// `params` (which must not contain `oauth_signature`).
pub(crate) fn signature(
    secret: &str, url: &str, params: &BTreeMap<String, String>,
) -> Result<String> {
    let mut mac = mac(secret)?;
    mac.update(base_string(url, params)?.as_bytes());
    Ok(Base64::encode_string(&mac.finalize().into_bytes()))
}

// Constant-time check of a provided base64 signature for `url` and `params`.
fn verify_signature(
    secret: &str, url: &str, params: &BTreeMap<String, String>, provided: &str,
) -> Result<bool> {
    let Ok(provided) = Base64::decode_vec(provided) else {
        return Ok(false);
    };
    let mut mac = mac(secret)?;
    mac.update(base_string(url, params)?.as_bytes());
    Ok(mac.verify_slice(&provided).is_ok())
}

fn mac(secret: &str) -> Result<HmacSha1> {
    // signing key is enc(consumer_secret)&enc(token_secret); launches carry
    // no token, so the token secret is empty
    let key = format!("{}&", encode(secret));
    HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Signing(format!("issue building HMAC: {e}")))
}

// RFC 5849 §3.4.1: METHOD&enc(base-url)&enc(sorted-params). The method is
// always POST for LTI messages.
fn base_string(url: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let (base_url, query) = normalize_url(url)?;

    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(query.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    pairs.sort();

    let param_str =
        pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    Ok(format!("POST&{}&{}", encode(&base_url), encode(&param_str)))
}

// RFC 5849 §3.4.1.2: lowercase scheme and host, drop default ports, strip
// query and fragment. Query parameters re-enter via the parameter set.
fn normalize_url(url: &str) -> Result<(String, Vec<(String, String)>)> {
    let parsed =
        Url::parse(url).map_err(|e| Error::Signing(format!("invalid signing URL {url}: {e}")))?;
    let Some(host) = parsed.host_str() else {
        return Err(Error::Signing(format!("signing URL {url} has no host")));
    };

    let scheme = parsed.scheme().to_lowercase();
    let port = match parsed.port() {
        Some(p) if !(scheme == "http" && p == 80 || scheme == "https" && p == 443) => {
            format!(":{p}")
        }
        _ => String::new(),
    };
    let base = format!("{scheme}://{}{port}{}", host.to_lowercase(), parsed.path());
    let query =
        parsed.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

    Ok((base, query))
}

fn protocol_params(key: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("oauth_consumer_key".into(), key.to_string()),
        ("oauth_nonce".into(), gen::nonce()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), Utc::now().timestamp().to_string()),
        ("oauth_version".into(), "1.0".into()),
    ])
}

fn authorization_header(params: &BTreeMap<String, String>) -> String {
    let fields = params
        .iter()
        .map(|(k, v)| format!(r#"{k}="{}""#, encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

pub(crate) fn encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}
