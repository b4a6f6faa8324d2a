//! Per-Tool configuration, supplied by the host for every request.

use lti_jose::ToolKeyset;
use serde::{Deserialize, Serialize};

use crate::ags::LtiAgs;
use crate::deep_linking::LtiDeepLinking;
use crate::nrps::LtiNrps;

/// One Platform-Tool pairing: identifiers, endpoints, key material, and the
/// Advantage services enabled for it.
///
/// A `Registration` is immutable configuration captured before a request is
/// handled; handlers never mutate it, so instances can be shared freely
/// across request-handling workers.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Registration {
    /// Platform issuer identifier, the `iss` of every message this Platform
    /// signs.
    pub iss: String,

    /// The client id issued to the Tool.
    pub client_id: String,

    /// The deployment id for this placement.
    pub deployment_id: String,

    /// The Tool's launch URL (`target_link_uri`).
    pub launch_url: String,

    /// The Tool's OIDC login initiation URL.
    pub oidc_url: String,

    /// The Tool's verification keys.
    pub tool_keyset: ToolKeyset,

    /// LTI Advantage services enabled for this pairing.
    #[serde(default)]
    pub advantage: Advantage,
}

impl Registration {
    // URLs the Tool may name as redirect_uri in its authentication request.
    pub(crate) fn redirect_uris(&self) -> Vec<&str> {
        let mut uris = vec![self.launch_url.as_str()];
        if let Some(deep_linking) = &self.advantage.deep_linking {
            uris.push(deep_linking.launch_url.as_str());
        }
        uris
    }
}

/// LTI Advantage configuration. Each enabled service contributes its claim
/// to every resource link launch.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Advantage {
    /// Assignment and Grades Service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ags: Option<LtiAgs>,

    /// Deep Linking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_linking: Option<LtiDeepLinking>,

    /// Names and Role Provisioning Service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrps: Option<LtiNrps>,
}
