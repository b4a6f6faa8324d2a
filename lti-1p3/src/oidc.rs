//! # OIDC Login Initiation
//!
//! The preflight leg of an LTI 1.3 launch: the Platform parks the launch
//! context in the state store under a fresh opaque key and redirects the
//! browser to the Tool's login initiation endpoint. The Tool authenticates
//! back with the key echoed as `lti_message_hint`.

use chrono::Utc;
use lti_core::error::Error;
use lti_core::{gen, Result, StateStore};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::registration::Registration;
use crate::state::{Expire, LaunchData};
use crate::Provider;

/// The Tool's authentication request, POSTed back to the Platform after the
/// login initiation redirect. This is the "preflight response" a launch is
/// validated against.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PreflightResponse {
    /// Nonce to be echoed in the `id_token`.
    pub nonce: Option<String>,

    /// Opaque state the Tool round-trips.
    pub state: Option<String>,

    /// Where the Tool wants the `id_token` posted.
    pub redirect_uri: Option<String>,

    /// The client id the Tool believes it is.
    pub client_id: Option<String>,

    /// The launch data cache key, echoed from the login initiation URL.
    pub lti_message_hint: Option<String>,

    /// The login hint, echoed from the login initiation URL.
    pub login_hint: Option<String>,
}

/// Cache the launch data and build the OIDC login initiation URL.
///
/// # Errors
///
/// Returns `Error::ServerError` if the launch data cannot be stored.
#[instrument(level = "debug", skip(provider, data))]
pub async fn login_url(
    provider: &impl Provider, reg: &Registration, data: &LaunchData,
) -> Result<String> {
    tracing::debug!("oidc::login_url");

    let key = gen::launch_key();
    StateStore::put(provider, &key, data.to_vec()?, Utc::now() + Expire::Launch.duration())
        .await
        .map_err(|e| Error::ServerError(format!("issue saving launch data: {e}")))?;

    let login_hint = data.external_user_id.as_ref().unwrap_or(&data.user_id);
    let query = [
        ("iss", reg.iss.as_str()),
        ("client_id", reg.client_id.as_str()),
        ("lti_deployment_id", reg.deployment_id.as_str()),
        ("target_link_uri", reg.launch_url.as_str()),
        ("login_hint", login_hint.as_str()),
        ("lti_message_hint", key.as_str()),
    ]
    .iter()
    .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, NON_ALPHANUMERIC)))
    .collect::<Vec<_>>()
    .join("&");

    let separator = if reg.oidc_url.contains('?') { '&' } else { '?' };
    Ok(format!("{}{separator}{query}", reg.oidc_url))
}

/// Validate the Tool's authentication request before answering with a
/// launch.
///
/// All four of `nonce`, `state`, `redirect_uri`, and a matching `client_id`
/// are required; any missing or mismatched field fails the launch with no
/// retry.
pub(crate) fn validate_preflight_response(
    reg: &Registration, response: &PreflightResponse,
) -> Result<()> {
    if response.nonce.as_deref().unwrap_or_default().is_empty() {
        return Err(Error::PreflightValidation("missing nonce".into()));
    }
    if response.state.as_deref().unwrap_or_default().is_empty() {
        return Err(Error::PreflightValidation("missing state".into()));
    }
    let Some(redirect_uri) = response.redirect_uri.as_deref().filter(|u| !u.is_empty()) else {
        return Err(Error::PreflightValidation("missing redirect_uri".into()));
    };
    if !reg.redirect_uris().contains(&redirect_uri) {
        return Err(Error::PreflightValidation(format!(
            "redirect_uri {redirect_uri} is not registered for this tool"
        )));
    }
    if response.client_id.as_deref() != Some(reg.client_id.as_str()) {
        return Err(Error::PreflightValidation(
            "client_id does not match the registration".into(),
        ));
    }
    Ok(())
}
