//! Protocol constants: claim URIs, message types, the role-to-URI table,
//! and the fixed scope and content-type allow-lists. All immutable static
//! configuration, fixed at process start.

use lti_core::error::Error;
use lti_core::Result;
use serde::{Deserialize, Serialize};

/// LTI version carried in every launch message.
pub const LTI_VERSION: &str = "1.3.0";

/// `message_type` claim URI.
pub const CLAIM_MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
/// `version` claim URI.
pub const CLAIM_VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
/// `deployment_id` claim URI.
pub const CLAIM_DEPLOYMENT_ID: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
/// `target_link_uri` claim URI.
pub const CLAIM_TARGET_LINK_URI: &str =
    "https://purl.imsglobal.org/spec/lti/claim/target_link_uri";
/// `roles` claim URI.
pub const CLAIM_ROLES: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
/// `resource_link` claim URI.
pub const CLAIM_RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
/// `context` claim URI.
pub const CLAIM_CONTEXT: &str = "https://purl.imsglobal.org/spec/lti/claim/context";
/// `launch_presentation` claim URI.
pub const CLAIM_LAUNCH_PRESENTATION: &str =
    "https://purl.imsglobal.org/spec/lti/claim/launch_presentation";
/// `custom` claim URI.
pub const CLAIM_CUSTOM: &str = "https://purl.imsglobal.org/spec/lti/claim/custom";

/// AGS `endpoint` claim URI.
pub const CLAIM_AGS_ENDPOINT: &str = "https://purl.imsglobal.org/spec/lti-ags/claim/endpoint";
/// Deep Linking settings claim URI.
pub const CLAIM_DL_SETTINGS: &str =
    "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings";
/// Deep Linking response content items claim URI.
pub const CLAIM_DL_CONTENT_ITEMS: &str =
    "https://purl.imsglobal.org/spec/lti-dl/claim/content_items";
/// NRPS membership service claim URI.
pub const CLAIM_NRPS: &str =
    "https://purl.imsglobal.org/spec/lti-nrps/claim/namesroleservice";

/// Proctoring `session_data` claim URI.
pub const CLAIM_SESSION_DATA: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/session_data";
/// Proctoring `start_assessment_url` claim URI.
pub const CLAIM_START_ASSESSMENT_URL: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/start_assessment_url";
/// Proctoring `attempt_number` claim URI.
pub const CLAIM_ATTEMPT_NUMBER: &str =
    "https://purl.imsglobal.org/spec/lti-ap/claim/attempt_number";
/// Proctoring assessment control service (ACS) claim URI.
pub const CLAIM_ACS: &str = "https://purl.imsglobal.org/spec/lti-ap/claim/acs";

/// AGS scope: manage line items.
pub const SCOPE_AGS_LINEITEM: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem";
/// AGS scope: read line items.
pub const SCOPE_AGS_LINEITEM_READONLY: &str =
    "https://purl.imsglobal.org/spec/lti-ags/scope/lineitem.readonly";
/// AGS scope: read results.
pub const SCOPE_AGS_RESULT_READONLY: &str =
    "https://purl.imsglobal.org/spec/lti-ags/scope/result.readonly";
/// AGS scope: post scores.
pub const SCOPE_AGS_SCORE: &str = "https://purl.imsglobal.org/spec/lti-ags/scope/score";
/// NRPS scope: read context membership.
pub const SCOPE_NRPS_MEMBERSHIP: &str =
    "https://purl.imsglobal.org/spec/lti-nrps/scope/contextmembership.readonly";

/// The scopes the access token endpoint will grant. Requested scopes outside
/// this list are silently dropped, not rejected.
pub const ACCESS_TOKEN_SCOPES: [&str; 5] = [
    SCOPE_AGS_LINEITEM,
    SCOPE_AGS_LINEITEM_READONLY,
    SCOPE_AGS_RESULT_READONLY,
    SCOPE_AGS_SCORE,
    SCOPE_NRPS_MEMBERSHIP,
];

/// Content item types a Deep Linking response may carry.
pub const DEEP_LINKING_ACCEPTED_TYPES: [&str; 4] = ["ltiResourceLink", "link", "html", "image"];

/// LTI message types exchanged with Tools.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum MessageType {
    /// A standard resource link launch.
    #[default]
    LtiResourceLinkRequest,

    /// A Deep Linking content selection launch.
    LtiDeepLinkingRequest,

    /// The Tool's Deep Linking response message.
    LtiDeepLinkingResponse,

    /// A proctored assessment entry launch.
    LtiStartProctoring,

    /// The proctoring Tool's start assessment message.
    LtiStartAssessment,

    /// A proctored assessment exit launch.
    LtiEndAssessment,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Map a platform role to the LIS role URIs sent in the `roles` claim.
///
/// The empty role is valid and yields no role URIs, which is intentionally
/// different from an unknown role: unknown roles are an error.
pub fn role_uris(role: &str) -> Result<Vec<String>> {
    let uris: &[&str] = match role {
        "staff" => &[
            "http://purl.imsglobal.org/vocab/lis/v2/membership#Administrator",
            "http://purl.imsglobal.org/vocab/lis/v2/system/person#Administrator",
        ],
        "instructor" => &["http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor"],
        "student" => &["http://purl.imsglobal.org/vocab/lis/v2/membership#Learner"],
        "guest" => &["http://purl.imsglobal.org/vocab/lis/v2/membership#Guest"],
        "" => &[],
        other => {
            return Err(Error::InvalidRequest(format!("unknown platform role: {other}")));
        }
    };
    Ok(uris.iter().map(ToString::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_map_to_uris() {
        for role in ["staff", "instructor", "student", "guest"] {
            let uris = role_uris(role).expect("known role");
            assert!(!uris.is_empty(), "{role} should map to at least one URI");
        }
    }

    #[test]
    fn empty_role_yields_no_uris() {
        assert!(role_uris("").expect("empty role is valid").is_empty());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = role_uris("superuser").expect_err("unknown role");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn message_type_serializes_to_wire_name() {
        let json = serde_json::to_string(&MessageType::LtiDeepLinkingRequest).unwrap();
        assert_eq!(json, "\"LtiDeepLinkingRequest\"");
    }
}
