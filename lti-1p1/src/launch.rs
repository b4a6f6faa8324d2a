//! # LTI 1.1 Launch
//!
//! Assembles the signed parameter set for a basic LTI launch. The Platform
//! renders these parameters into a browser auto-submit form POSTed to the
//! Tool's launch URL.

use std::collections::BTreeMap;

use lti_core::error::Error;
use lti_core::Result;

use crate::oauth1;

/// The flat launch parameter map: protocol parameters, user/context data,
/// custom parameters, and the `oauth_*` signature fields. Created fresh per
/// launch and never persisted.
pub type LaunchParameters = BTreeMap<String, String>;

/// OAuth1 credentials and launch target for one Platform-Tool pairing.
#[derive(Clone, Debug, Default)]
pub struct ToolConfig {
    /// OAuth1 consumer key shared with the Tool.
    pub key: String,

    /// OAuth1 consumer secret shared with the Tool.
    pub secret: String,

    /// The Tool's launch URL.
    pub launch_url: String,
}

/// Identity of the launching user, as the LIS parameter set expects it.
#[derive(Clone, Debug, Default)]
pub struct UserData {
    /// Opaque Platform user id.
    pub user_id: String,

    /// Comma-separated LIS role names, e.g. `Instructor`.
    pub roles: String,

    /// The `lis_result_sourcedid` the Tool echoes back in grade callbacks.
    pub result_sourcedid: String,

    /// Optional LIS person sourced id.
    pub person_sourcedid: Option<String>,

    /// Optional contact email.
    pub person_email: Option<String>,

    /// Optional full name.
    pub person_name: Option<String>,
}

/// The course context the launch happens in.
#[derive(Clone, Debug, Default)]
pub struct ContextData {
    /// Context (course) id.
    pub id: String,

    /// Context title.
    pub title: String,

    /// Context label, e.g. a course code.
    pub label: String,
}

/// Builder for one launch. User data and context data are both required;
/// [`LaunchBuilder::generate`] refuses to produce parameters until both have
/// been supplied.
#[derive(Clone, Debug, Default)]
pub struct LaunchBuilder {
    user: Option<UserData>,
    context: Option<ContextData>,
    outcome_service_url: Option<String>,
    locale: Option<String>,
    custom: BTreeMap<String, String>,
    extra: BTreeMap<String, String>,
}

impl LaunchBuilder {
    /// Returns a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the launching user. Required.
    #[must_use]
    pub fn user_data(mut self, user: UserData) -> Self {
        self.user = Some(user);
        self
    }

    /// Set the course context. Required.
    #[must_use]
    pub fn context_data(mut self, context: ContextData) -> Self {
        self.context = Some(context);
        self
    }

    /// Advertise the Platform's Outcomes endpoint to the Tool.
    #[must_use]
    pub fn outcome_service_url(mut self, url: impl Into<String>) -> Self {
        self.outcome_service_url = Some(url.into());
        self
    }

    /// Set `launch_presentation_locale`.
    #[must_use]
    pub fn presentation_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the custom parameters. Keys are given the `custom_` prefix at
    /// generation time unless already carrying it.
    #[must_use]
    pub fn custom_parameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.custom = params;
        self
    }

    /// Merge additional parameters verbatim, e.g. best-effort enrichments
    /// produced by parameter processors.
    #[must_use]
    pub fn extra_parameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.extra.extend(params);
        self
    }

    /// Assemble and sign the launch parameters for `resource_link_id`.
    ///
    /// The signed `Authorization` header is flattened back into individual
    /// `oauth_*` form parameters, with values percent-decoded once so they
    /// are not double-encoded when the browser submits the form.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingRequiredData` if user or context data is
    /// unset, and `Error::Signing` if the launch URL cannot be signed.
    pub fn generate(&self, config: &ToolConfig, resource_link_id: &str) -> Result<LaunchParameters> {
        tracing::debug!("launch::generate");

        let Some(user) = &self.user else {
            return Err(Error::MissingRequiredData("user data has not been set".into()));
        };
        let Some(context) = &self.context else {
            return Err(Error::MissingRequiredData("context data has not been set".into()));
        };

        let mut params = LaunchParameters::new();
        params.insert("lti_message_type".into(), "basic-lti-launch-request".into());
        params.insert("lti_version".into(), "LTI-1p0".into());
        params.insert("oauth_callback".into(), "about:blank".into());
        params.insert("resource_link_id".into(), resource_link_id.into());

        params.insert("user_id".into(), user.user_id.clone());
        params.insert("roles".into(), user.roles.clone());
        params.insert("lis_result_sourcedid".into(), user.result_sourcedid.clone());
        if let Some(sourcedid) = &user.person_sourcedid {
            params.insert("lis_person_sourcedid".into(), sourcedid.clone());
        }
        if let Some(email) = &user.person_email {
            params.insert("lis_person_contact_email_primary".into(), email.clone());
        }
        if let Some(name) = &user.person_name {
            params.insert("lis_person_name_full".into(), name.clone());
        }

        params.insert("context_id".into(), context.id.clone());
        params.insert("context_title".into(), context.title.clone());
        params.insert("context_label".into(), context.label.clone());

        if let Some(url) = &self.outcome_service_url {
            params.insert("lis_outcome_service_url".into(), url.clone());
        }
        if let Some(locale) = &self.locale {
            params.insert("launch_presentation_locale".into(), locale.clone());
        }

        for (key, value) in &self.custom {
            let key = if key.starts_with("custom_") {
                key.clone()
            } else {
                format!("custom_{key}")
            };
            params.insert(key, value.clone());
        }
        params.extend(self.extra.clone());

        let header = oauth1::sign(&config.key, &config.secret, &config.launch_url, &params)?;
        params.extend(oauth1::parse_authorization_header(&header));

        Ok(params)
    }
}
