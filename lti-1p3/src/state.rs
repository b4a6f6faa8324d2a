//! State is used by the library to persist launch context between the OIDC
//! preflight leg and the launch leg of an LTI 1.3 flow.

use chrono::Duration;
use derive_builder::Builder;
use lti_core::error::Error;
use lti_core::Result;
use serde::{Deserialize, Serialize};

use crate::constants::MessageType;
use crate::message::ContextClaim;
use crate::proctoring::ProctoringData;

pub(crate) enum Expire {
    Launch,
    Access,
}

impl Expire {
    pub(crate) fn duration(&self) -> Duration {
        match self {
            Self::Launch => Duration::minutes(10),
            Self::Access => Duration::hours(1),
        }
    }
}

/// The launch context cached between the preflight and launch legs. Lives
/// for one launch round-trip under an opaque key the Tool echoes back as
/// `lti_message_hint`.
///
/// `user_id` and `resource_link_id` are required; [`LaunchData::builder`]
/// refuses to build without them.
#[derive(Builder, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LaunchData {
    /// Platform user id, the launch `sub`.
    #[builder(setter(into))]
    pub user_id: String,

    /// External user id preferred as `login_hint` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option), default)]
    pub external_user_id: Option<String>,

    /// Platform role name, mapped through the role table at assembly time.
    /// Empty means "send no roles content".
    #[builder(setter(into), default)]
    pub role: String,

    /// Resource link id of the placement being launched.
    #[builder(setter(into))]
    pub resource_link_id: String,

    /// The launch mode this flow was initiated for.
    #[builder(default)]
    pub message_type: MessageType,

    /// Course context data.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option), default)]
    pub context: Option<ContextClaim>,

    /// `launch_presentation` locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option), default)]
    pub locale: Option<String>,

    /// Custom parameters passed through to the Tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option), default)]
    pub custom: Option<std::collections::BTreeMap<String, String>>,

    /// Proctoring context, required for proctoring launch modes.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(setter(strip_option), default)]
    pub proctoring: Option<ProctoringData>,
}

impl LaunchData {
    /// Returns a new [`LaunchDataBuilder`].
    #[must_use]
    pub fn builder() -> LaunchDataBuilder {
        LaunchDataBuilder::default()
    }

    /// Serializes this launch data for the state store.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| Error::ServerError(format!("issue serializing launch data: {e}")))
    }
}

impl TryFrom<&[u8]> for LaunchData {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        serde_json::from_slice(value)
            .map_err(|e| Error::ServerError(format!("issue deserializing launch data: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_user_and_resource_link() {
        let err = LaunchData::builder().user_id("u1").build().expect_err("no resource link");
        assert!(err.to_string().contains("resource_link_id"));

        let err = LaunchData::builder().resource_link_id("rl1").build().expect_err("no user");
        assert!(err.to_string().contains("user_id"));
    }

    #[test]
    fn round_trips_through_the_state_store_encoding() {
        let data = LaunchData::builder()
            .user_id("u1")
            .role("instructor")
            .resource_link_id("rl1")
            .message_type(MessageType::LtiDeepLinkingRequest)
            .build()
            .expect("complete");

        let restored = LaunchData::try_from(data.to_vec().expect("serializes").as_slice())
            .expect("deserializes");
        assert_eq!(restored, data);
    }
}
