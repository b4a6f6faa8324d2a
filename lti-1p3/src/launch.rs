//! # Launch Endpoint
//!
//! Answers the Tool's authentication request with a signed `id_token`. The
//! preflight response is validated, the cached launch data restored, and the
//! claim set assembled according to the launch mode the flow was initiated
//! for — a resource link launch, a Deep Linking content selection, or a
//! proctoring start/end message.

use lti_core::error::Error;
use lti_core::{Result, StateStore};
use lti_jose::{jws, KeyOps};
use tracing::instrument;

use crate::constants::{self, MessageType, DEEP_LINKING_ACCEPTED_TYPES};
use crate::message::{launch_claims, LaunchClaims};
use crate::oidc::{validate_preflight_response, PreflightResponse};
use crate::proctoring;
use crate::registration::Registration;
use crate::state::{Expire, LaunchData};
use crate::Provider;

/// The launch response: `state` and `id_token` for the auto-submit form
/// POSTed to the Tool's `redirect_uri`.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct LaunchResponse {
    /// The `state` echoed from the authentication request.
    pub state: String,

    /// The signed launch JWT.
    pub id_token: String,
}

/// Launch request handler.
///
/// # Errors
///
/// `Error::PreflightValidation` if the authentication request is incomplete
/// or mismatched, `Error::InvalidRequest` if the cached launch data is
/// missing or expired (the flow can be restarted by the user), and
/// `Error::KeyNotSet`/`Error::Signing` if the `id_token` cannot be signed.
#[instrument(level = "debug", skip(provider))]
pub async fn launch(
    provider: &impl Provider, reg: &Registration, request: &PreflightResponse,
) -> Result<LaunchResponse> {
    tracing::debug!("launch::launch");

    validate_preflight_response(reg, request)?;

    let Some(hint) = request.lti_message_hint.as_deref() else {
        return Err(Error::InvalidRequest("missing lti_message_hint".into()));
    };
    let Ok(cached) = StateStore::get(provider, hint).await else {
        tracing::info!("no launch data cached under key {hint}");
        return Err(Error::InvalidRequest(
            "launch data not found or expired, please retry the launch".into(),
        ));
    };
    let data = LaunchData::try_from(cached.as_slice())?;

    let mut claims = assemble(reg, &data)?;
    claims.nonce.clone_from(&request.nonce);

    let signer = provider
        .signer()
        .map_err(|e| Error::KeyNotSet(format!("no platform signing key: {e}")))?;
    let id_token =
        jws::encode(&claims, Some(Expire::Access.duration().num_seconds()), &signer).await?;

    Ok(LaunchResponse {
        state: request.state.clone().unwrap_or_default(),
        id_token,
    })
}

// Dispatch claim assembly on the launch mode recorded when the flow was
// initiated.
fn assemble(reg: &Registration, data: &LaunchData) -> Result<LaunchClaims> {
    match data.message_type {
        MessageType::LtiResourceLinkRequest => launch_claims(reg, data, true),

        MessageType::LtiDeepLinkingRequest => {
            let Some(deep_linking) = &reg.advantage.deep_linking else {
                return Err(Error::InvalidRequest(
                    "deep linking is not configured for this tool".into(),
                ));
            };
            // a Deep Linking launch swaps in its own claim set: no optional
            // or service claims, just the settings claim and its own target
            let mut claims = launch_claims(reg, data, false)?;
            claims.target_link_uri.clone_from(&deep_linking.launch_url);
            claims.extra.insert(
                constants::CLAIM_DL_SETTINGS.into(),
                deep_linking.settings_claim(None, None, &DEEP_LINKING_ACCEPTED_TYPES, None)?,
            );
            Ok(claims)
        }

        MessageType::LtiStartProctoring | MessageType::LtiEndAssessment => {
            let Some(proctoring_data) = &data.proctoring else {
                return Err(Error::MissingRequiredData(
                    "proctoring data is not set for this launch".into(),
                ));
            };
            let mut claims = launch_claims(reg, data, true)?;
            if data.message_type == MessageType::LtiStartProctoring {
                proctoring::start_claims(&mut claims.extra, proctoring_data);
            } else {
                proctoring::end_claims(&mut claims.extra, proctoring_data);
            }
            Ok(claims)
        }

        other => Err(Error::InvalidRequest(format!(
            "{other} is not a launchable message type"
        ))),
    }
}
