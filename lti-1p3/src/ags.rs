//! # Assignment and Grades Service (AGS)
//!
//! Builds the `endpoint` claim advertising the Platform's line item
//! endpoints and the scopes the Tool may request for them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{
    SCOPE_AGS_LINEITEM, SCOPE_AGS_LINEITEM_READONLY, SCOPE_AGS_RESULT_READONLY, SCOPE_AGS_SCORE,
};

/// AGS configuration for one placement.
///
/// Line item reading is always advertised; writing line items, reading
/// results, and posting scores are each gated by their own flag. A
/// declarative-grades placement leaves `allow_scores_write` off so the Tool
/// can only see what the Platform created for it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LtiAgs {
    /// The line item collection URL.
    pub lineitems_url: String,

    /// The single line item coupled to this placement, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineitem_url: Option<String>,

    /// Allow the Tool to create and update line items.
    #[serde(default)]
    pub allow_lineitem_write: bool,

    /// Allow the Tool to read results.
    #[serde(default)]
    pub allow_results_read: bool,

    /// Allow the Tool to post scores.
    #[serde(default)]
    pub allow_scores_write: bool,
}

impl LtiAgs {
    /// The OAuth2 scopes this configuration makes available.
    #[must_use]
    pub fn available_scopes(&self) -> Vec<String> {
        let mut scopes = vec![SCOPE_AGS_LINEITEM_READONLY.to_string()];
        if self.allow_lineitem_write {
            scopes.push(SCOPE_AGS_LINEITEM.to_string());
        }
        if self.allow_results_read {
            scopes.push(SCOPE_AGS_RESULT_READONLY.to_string());
        }
        if self.allow_scores_write {
            scopes.push(SCOPE_AGS_SCORE.to_string());
        }
        scopes
    }

    /// The `endpoint` claim merged into launches.
    #[must_use]
    pub fn launch_claim(&self) -> Value {
        let mut claim = json!({
            "scope": self.available_scopes(),
            "lineitems": self.lineitems_url,
        });
        if let Some(lineitem) = &self.lineitem_url {
            claim["lineitem"] = json!(lineitem);
        }
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_scope_is_always_available() {
        let ags = LtiAgs {
            lineitems_url: "https://lms.example.edu/lineitems".into(),
            ..LtiAgs::default()
        };
        assert_eq!(ags.available_scopes(), vec![SCOPE_AGS_LINEITEM_READONLY.to_string()]);
    }

    #[test]
    fn flags_gate_their_scopes_independently() {
        let ags = LtiAgs {
            lineitems_url: "https://lms.example.edu/lineitems".into(),
            allow_lineitem_write: true,
            allow_results_read: true,
            allow_scores_write: true,
            ..LtiAgs::default()
        };
        let scopes = ags.available_scopes();
        assert!(scopes.contains(&SCOPE_AGS_LINEITEM.to_string()));
        assert!(scopes.contains(&SCOPE_AGS_RESULT_READONLY.to_string()));
        assert!(scopes.contains(&SCOPE_AGS_SCORE.to_string()));
    }

    #[test]
    fn claim_includes_lineitem_only_when_set() {
        let mut ags = LtiAgs {
            lineitems_url: "https://lms.example.edu/lineitems".into(),
            ..LtiAgs::default()
        };
        assert!(ags.launch_claim().get("lineitem").is_none());

        ags.lineitem_url = Some("https://lms.example.edu/lineitems/7".into());
        assert_eq!(ags.launch_claim()["lineitem"], "https://lms.example.edu/lineitems/7");
    }
}
