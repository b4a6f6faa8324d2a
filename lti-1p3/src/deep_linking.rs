//! # Deep Linking
//!
//! The content-selection extension: the Platform launches the Tool with a
//! `LtiDeepLinkingRequest` carrying a settings claim, and the Tool answers
//! with a signed `LtiDeepLinkingResponse` listing the content items the user
//! picked.

use lti_core::error::Error;
use lti_core::Result;
use lti_jose::Jwt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::constants::{MessageType, DEEP_LINKING_ACCEPTED_TYPES};
use crate::registration::Registration;
use crate::Provider;

/// Deep Linking configuration for one placement.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LtiDeepLinking {
    /// The Tool's Deep Linking launch URL.
    pub launch_url: String,

    /// The Platform URL the Tool posts its response JWT back to.
    pub return_url: String,
}

impl LtiDeepLinking {
    /// Build the `deep_linking_settings` claim.
    ///
    /// `accept_multiple` and `auto_create` are policy, not configuration:
    /// both are always on.
    ///
    /// # Errors
    ///
    /// `Error::ContentTypeNotSupported` if any requested accept type is not
    /// in the global accepted list.
    pub fn settings_claim(
        &self, title: Option<&str>, description: Option<&str>, accept_types: &[&str],
        extra_data: Option<&str>,
    ) -> Result<Value> {
        for accept_type in accept_types {
            if !DEEP_LINKING_ACCEPTED_TYPES.contains(accept_type) {
                return Err(Error::ContentTypeNotSupported(format!(
                    "accept type {accept_type} is not supported"
                )));
            }
        }

        let mut claim = json!({
            "accept_types": accept_types,
            "accept_presentation_document_targets": ["iframe", "window", "embed"],
            "accept_multiple": true,
            "auto_create": true,
            "deep_link_return_url": self.return_url,
        });
        if let Some(title) = title {
            claim["title"] = json!(title);
        }
        if let Some(description) = description {
            claim["text"] = json!(description);
        }
        if let Some(extra_data) = extra_data {
            claim["data"] = json!(extra_data);
        }
        Ok(claim)
    }
}

/// A content item returned by the Tool. Properties beyond `type` are passed
/// through untouched for the host to persist.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ContentItem {
    /// Content item type, e.g. `ltiResourceLink`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Remaining item properties (url, title, custom, ...).
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

// The claims of a LtiDeepLinkingResponse JWT.
#[derive(Debug, Deserialize)]
struct ResponseClaims {
    #[serde(rename = "https://purl.imsglobal.org/spec/lti/claim/message_type")]
    message_type: Option<MessageType>,

    #[serde(
        rename = "https://purl.imsglobal.org/spec/lti-dl/claim/content_items",
        default
    )]
    content_items: Vec<ContentItem>,
}

/// Verify and decode the Tool's Deep Linking response.
///
/// Every content item's type must be in the accepted list; one unsupported
/// item rejects the whole batch, not just that item.
///
/// # Errors
///
/// Keyset and signature errors from token verification,
/// `Error::MissingRequiredClaim`/`Error::InvalidClaimValue` for a wrong
/// message type, and `Error::ContentTypeNotSupported` for an unsupported
/// item type.
#[instrument(level = "debug", skip(provider, token))]
pub async fn decode_response(
    provider: &impl Provider, reg: &Registration, token: &str,
) -> Result<Vec<ContentItem>> {
    tracing::debug!("deep_linking::decode_response");

    let jwt: Jwt<ResponseClaims> = reg.tool_keyset.decode(provider, token).await?;

    let Some(message_type) = jwt.claims.message_type else {
        return Err(Error::MissingRequiredClaim("response has no message_type claim".into()));
    };
    if message_type != MessageType::LtiDeepLinkingResponse {
        return Err(Error::InvalidClaimValue(format!(
            "message_type must be LtiDeepLinkingResponse, got {message_type}"
        )));
    }

    for item in &jwt.claims.content_items {
        if !DEEP_LINKING_ACCEPTED_TYPES.contains(&item.type_.as_str()) {
            return Err(Error::ContentTypeNotSupported(format!(
                "content item type {} is not supported",
                item.type_
            )));
        }
    }

    Ok(jwt.claims.content_items)
}
