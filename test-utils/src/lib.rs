//! # Test Utilities for lti-rs
//!
//! Hard-coded provider trait implementations and deterministic key material
//! for tests and examples.
//!
//! This crate provides common utilities for the lti-rs project and is not
//! intended to be used directly.

#![allow(missing_docs)]

pub mod keystore;
pub mod provider;

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub use crate::provider::{Provider, Store};

pub const ISSUER: &str = "https://lms.example.edu";
pub const CLIENT_ID: &str = "a7d41a0e-1a6b-47c9-9b0e-4c60c1f218d4";
pub const DEPLOYMENT_ID: &str = "deployment-1";
pub const LAUNCH_URL: &str = "https://tool.example/launch";
pub const OIDC_URL: &str = "https://tool.example/oidc/login";
pub const JWKS_URL: &str = "https://tool.example/.well-known/jwks.json";

/// A registration for the test Tool, verifying client assertions against
/// the keyset served by the test provider's resolver.
#[must_use]
pub fn registration() -> lti_1p3::Registration {
    lti_1p3::Registration {
        iss: ISSUER.into(),
        client_id: CLIENT_ID.into(),
        deployment_id: DEPLOYMENT_ID.into(),
        launch_url: LAUNCH_URL.into(),
        oidc_url: OIDC_URL.into(),
        tool_keyset: lti_jose::ToolKeyset {
            public_jwk: None,
            jwks_url: Some(JWKS_URL.into()),
        },
        advantage: lti_1p3::Advantage::default(),
    }
}

// initialise tracing once for all tests
static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// # Panics
///
/// Panics if the tracing subscriber cannot be set.
pub fn init_tracer() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        tracing::subscriber::set_global_default(subscriber).expect("subscriber set");
    });
}
