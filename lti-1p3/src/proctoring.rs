//! # Proctoring Services
//!
//! The assessment proctoring extension: the Platform launches the
//! proctoring Tool with `LtiStartProctoring` (or `LtiEndAssessment`), and
//! the Tool sends the browser back with a signed `LtiStartAssessment` JWT
//! that must match the launch it answers — session data (an anti-CSRF
//! value), resource link, and attempt number are all checked.

use lti_core::error::Error;
use lti_core::Result;
use lti_jose::Jwt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::constants::{
    self, MessageType, CLAIM_ACS, CLAIM_ATTEMPT_NUMBER, CLAIM_SESSION_DATA,
    CLAIM_START_ASSESSMENT_URL,
};
use crate::message::ResourceLinkClaim;
use crate::registration::Registration;
use crate::Provider;

/// Proctoring context for one launch.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProctoringData {
    /// The attempt this proctoring session covers.
    pub attempt_number: u32,

    /// Opaque anti-CSRF value the Tool must echo in `LtiStartAssessment`.
    pub session_data: String,

    /// The Platform URL the Tool posts the start assessment JWT to.
    pub start_assessment_url: String,

    /// Assessment control service URL, when the Platform supports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_control_url: Option<String>,

    /// Assessment control actions the Platform supports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assessment_control_actions: Vec<String>,
}

/// Claims of the Tool's `LtiStartAssessment` message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StartAssessmentClaims {
    /// The message type claim.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    pub message_type: Option<MessageType>,

    /// The LTI version claim.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/version")]
    pub version: Option<String>,

    /// The echoed session data.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-ap/claim/session_data")]
    pub session_data: Option<String>,

    /// The resource link the assessment belongs to.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/resource_link")]
    pub resource_link: Option<ResourceLinkClaim>,

    /// The attempt number.
    #[serde(rename = "https://purl.imsglobal.org/spec/lti-ap/claim/attempt_number")]
    pub attempt_number: Option<u32>,
}

// Merge the LtiStartProctoring claims into a launch claim set.
pub(crate) fn start_claims(extra: &mut Map<String, Value>, data: &ProctoringData) {
    extra.insert(CLAIM_SESSION_DATA.into(), json!(data.session_data));
    extra.insert(CLAIM_START_ASSESSMENT_URL.into(), json!(data.start_assessment_url));
    extra.insert(CLAIM_ATTEMPT_NUMBER.into(), json!(data.attempt_number));
    if let Some(control_url) = &data.assessment_control_url {
        extra.insert(
            CLAIM_ACS.into(),
            json!({
                "assessment_control_url": control_url,
                "actions": data.assessment_control_actions,
            }),
        );
    }
}

// Merge the LtiEndAssessment claims into a launch claim set.
pub(crate) fn end_claims(extra: &mut Map<String, Value>, data: &ProctoringData) {
    extra.insert(CLAIM_ATTEMPT_NUMBER.into(), json!(data.attempt_number));
}

/// Verify and decode the Tool's `LtiStartAssessment` message against the
/// proctoring launch it answers.
///
/// The checks run in a fixed sequence — message type, version, session
/// data, resource link, attempt number — and each mismatch is its own
/// `InvalidClaimValue`; an absent claim is a `MissingRequiredClaim`.
#[instrument(level = "debug", skip(provider, token, expected))]
pub async fn decode_start_assessment(
    provider: &impl Provider, reg: &Registration, token: &str, expected: &ProctoringData,
    resource_link_id: &str,
) -> Result<Jwt<StartAssessmentClaims>> {
    tracing::debug!("proctoring::decode_start_assessment");

    let jwt: Jwt<StartAssessmentClaims> = reg.tool_keyset.decode(provider, token).await?;
    let claims = &jwt.claims;

    let Some(message_type) = claims.message_type else {
        return Err(Error::MissingRequiredClaim("token has no message_type claim".into()));
    };
    if message_type != MessageType::LtiStartAssessment {
        return Err(Error::InvalidClaimValue(format!(
            "message_type must be LtiStartAssessment, got {message_type}"
        )));
    }

    let Some(version) = claims.version.as_deref() else {
        return Err(Error::MissingRequiredClaim("token has no version claim".into()));
    };
    if version != constants::LTI_VERSION {
        return Err(Error::InvalidClaimValue(format!(
            "version must be {}, got {version}",
            constants::LTI_VERSION
        )));
    }

    let Some(session_data) = claims.session_data.as_deref() else {
        return Err(Error::MissingRequiredClaim("token has no session_data claim".into()));
    };
    if session_data != expected.session_data {
        return Err(Error::InvalidClaimValue(
            "session_data does not match the proctoring launch".into(),
        ));
    }

    let Some(resource_link) = &claims.resource_link else {
        return Err(Error::MissingRequiredClaim("token has no resource_link claim".into()));
    };
    if resource_link.id != resource_link_id {
        return Err(Error::InvalidClaimValue(format!(
            "resource_link id must be {resource_link_id}, got {}",
            resource_link.id
        )));
    }

    let Some(attempt_number) = claims.attempt_number else {
        return Err(Error::MissingRequiredClaim("token has no attempt_number claim".into()));
    };
    if attempt_number != expected.attempt_number {
        return Err(Error::InvalidClaimValue(format!(
            "attempt_number must be {}, got {attempt_number}",
            expected.attempt_number
        )));
    }

    Ok(jwt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_claims_include_acs_only_when_configured() {
        let mut extra = Map::new();
        let mut data = ProctoringData {
            attempt_number: 2,
            session_data: "csrf-1".into(),
            start_assessment_url: "https://lms.example.edu/start".into(),
            ..ProctoringData::default()
        };
        start_claims(&mut extra, &data);
        assert_eq!(extra[CLAIM_ATTEMPT_NUMBER], json!(2));
        assert!(!extra.contains_key(CLAIM_ACS));

        extra.clear();
        data.assessment_control_url = Some("https://lms.example.edu/acs".into());
        data.assessment_control_actions = vec!["flagRequest".into(), "terminateRequest".into()];
        start_claims(&mut extra, &data);
        assert_eq!(extra[CLAIM_ACS]["actions"], json!(["flagRequest", "terminateRequest"]));
    }

    #[test]
    fn end_claims_carry_the_attempt_number() {
        let mut extra = Map::new();
        end_claims(&mut extra, &ProctoringData { attempt_number: 3, ..ProctoringData::default() });
        assert_eq!(extra[CLAIM_ATTEMPT_NUMBER], json!(3));
        assert!(!extra.contains_key(CLAIM_SESSION_DATA));
    }
}
