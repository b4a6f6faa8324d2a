//! # Names and Role Provisioning Service (NRPS)
//!
//! Advertises the Platform's context membership endpoint to the Tool.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// NRPS configuration for one placement.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LtiNrps {
    /// The context membership URL.
    pub context_memberships_url: String,
}

impl LtiNrps {
    /// The membership service claim merged into launches.
    #[must_use]
    pub fn launch_claim(&self) -> Value {
        json!({
            "context_memberships_url": self.context_memberships_url,
            "service_versions": ["2.0"],
        })
    }
}
