//! # Launch Message Assembly
//!
//! The typed claim set of an LTI 1.3 launch `id_token`, and the one assembly
//! function every launch mode goes through. Registered JWT claims use their
//! plain names; LTI claims live under their full claim URIs.

use lti_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{self, MessageType};
use crate::registration::Registration;
use crate::state::LaunchData;

/// The `resource_link` claim object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceLinkClaim {
    /// Resource link id.
    pub id: String,

    /// Optional title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `context` claim object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContextClaim {
    /// Context (course) id.
    pub id: String,

    /// Context title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Context label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Context type URIs.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Vec<String>>,
}

/// The `launch_presentation` claim object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationClaim {
    /// BCP 47 locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Where the Tool is displayed: `iframe`, `frame`, or `window`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_target: Option<String>,

    /// URL the Tool can return the user to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// The claim set of a launch `id_token`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LaunchClaims {
    /// Issuer: the Platform.
    pub iss: String,

    /// Audience: the Tool's client id.
    pub aud: String,

    /// Subject: the launching user.
    pub sub: String,

    /// The nonce from the Tool's authentication request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// The message type claim.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    pub message_type: MessageType,

    /// The LTI version claim, always `1.3.0`.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version")]
    pub version: String,

    /// The deployment id claim.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/deployment_id")]
    pub deployment_id: String,

    /// The target link URI claim.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/target_link_uri")]
    pub target_link_uri: String,

    /// The roles claim. An empty list is sent as-is, meaning "no roles".
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/roles")]
    pub roles: Vec<String>,

    /// The resource link claim.
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/resource_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_link: Option<ResourceLinkClaim>,

    /// The context claim.
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/context",
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<ContextClaim>,

    /// The launch presentation claim.
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/launch_presentation",
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_presentation: Option<PresentationClaim>,

    /// The custom parameters claim.
    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti/claim/custom",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom: Option<std::collections::BTreeMap<String, String>>,

    /// Extension claims keyed by claim URI: AGS endpoint, NRPS membership,
    /// Deep Linking settings, proctoring claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Assemble the claim set for a launch.
///
/// `include_extra_claims` controls the optional and extension claims
/// (context, presentation, custom, AGS, NRPS). Deep Linking launches pass
/// `false` so they can swap in their own claim set while reusing the rest
/// of the assembly.
pub(crate) fn launch_claims(
    reg: &Registration, data: &LaunchData, include_extra_claims: bool,
) -> Result<LaunchClaims> {
    let mut claims = LaunchClaims {
        iss: reg.iss.clone(),
        aud: reg.client_id.clone(),
        sub: data.user_id.clone(),
        nonce: None,
        message_type: data.message_type,
        version: constants::LTI_VERSION.into(),
        deployment_id: reg.deployment_id.clone(),
        target_link_uri: reg.launch_url.clone(),
        roles: constants::role_uris(&data.role)?,
        resource_link: Some(ResourceLinkClaim {
            id: data.resource_link_id.clone(),
            ..ResourceLinkClaim::default()
        }),
        context: None,
        launch_presentation: None,
        custom: None,
        extra: Map::new(),
    };

    if include_extra_claims {
        claims.context = data.context.clone();
        if data.locale.is_some() {
            claims.launch_presentation = Some(PresentationClaim {
                locale: data.locale.clone(),
                ..PresentationClaim::default()
            });
        }
        claims.custom = data.custom.clone();

        if let Some(ags) = &reg.advantage.ags {
            claims.extra.insert(constants::CLAIM_AGS_ENDPOINT.into(), ags.launch_claim());
        }
        if let Some(nrps) = &reg.advantage.nrps {
            claims.extra.insert(constants::CLAIM_NRPS.into(), nrps.launch_claim());
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ags::LtiAgs;

    fn registration() -> Registration {
        Registration {
            iss: "https://lms.example.edu".into(),
            client_id: "client-1".into(),
            deployment_id: "deployment-1".into(),
            launch_url: "https://tool.example/launch".into(),
            oidc_url: "https://tool.example/oidc".into(),
            ..Registration::default()
        }
    }

    fn launch_data() -> LaunchData {
        LaunchData::builder()
            .user_id("u1")
            .role("instructor")
            .resource_link_id("rl1")
            .locale("en-US")
            .build()
            .expect("complete")
    }

    #[test]
    fn serializes_claims_under_their_uris() {
        let claims = launch_claims(&registration(), &launch_data(), true).expect("assembles");
        let value = serde_json::to_value(&claims).expect("serializes");

        assert_eq!(value["iss"], "https://lms.example.edu");
        assert_eq!(value["aud"], "client-1");
        assert_eq!(value["sub"], "u1");
        assert_eq!(
            value["https://purl.imsglobal.org/spec/lti/claim/message_type"],
            "LtiResourceLinkRequest"
        );
        assert_eq!(value["https://purl.imsglobal.org/spec/lti/claim/version"], "1.3.0");
        assert_eq!(
            value["https://purl.imsglobal.org/spec/lti/claim/resource_link"]["id"],
            "rl1"
        );
        assert_eq!(
            value["https://purl.imsglobal.org/spec/lti/claim/launch_presentation"]["locale"],
            "en-US"
        );
    }

    #[test]
    fn extra_claims_are_omitted_when_disabled() {
        let mut reg = registration();
        reg.advantage.ags = Some(LtiAgs {
            lineitems_url: "https://lms.example.edu/lineitems".into(),
            ..LtiAgs::default()
        });

        let claims = launch_claims(&reg, &launch_data(), false).expect("assembles");
        assert!(claims.extra.is_empty());
        assert!(claims.launch_presentation.is_none());

        let claims = launch_claims(&reg, &launch_data(), true).expect("assembles");
        let endpoint = claims.extra.get(constants::CLAIM_AGS_ENDPOINT).expect("ags claim");
        assert_eq!(endpoint["lineitems"], json!("https://lms.example.edu/lineitems"));
    }

    #[test]
    fn unknown_role_fails_assembly() {
        let mut data = launch_data();
        data.role = "superuser".into();
        assert!(launch_claims(&registration(), &data, true).is_err());
    }

    #[test]
    fn empty_role_sends_empty_roles_claim() {
        let mut data = launch_data();
        data.role = String::new();
        let claims = launch_claims(&registration(), &data, true).expect("assembles");
        assert!(claims.roles.is_empty());
    }
}
