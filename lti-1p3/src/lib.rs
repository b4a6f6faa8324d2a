//! An implementation of the Platform side of the [LTI 1.3] specification
//! and its LTI Advantage extensions.
//!
//! # LTI 1.3
//!
//! An LTI 1.3 launch is an [OpenID Connect] third-party-initiated login: the
//! Platform directs the browser to the Tool's login initiation endpoint (the
//! "preflight" leg), the Tool authenticates back against the Platform, and
//! the Platform answers with a signed `id_token` carrying the launch claims.
//! Between the two legs the launch context is parked in an external cache,
//! keyed by an opaque value sent to the Tool as `lti_message_hint`.
//!
//! Services (grade passback via AGS, content selection via Deep Linking,
//! roster access via NRPS) are authorized by client-credential access tokens
//! minted by the [`token`] endpoint against a Tool-signed JWT assertion.
//!
//! # Design
//!
//! The library is architected around endpoint handler functions, each with
//! its own request and response types. The handlers are designed to be
//! surfaced by Rust-based HTTP servers, such as
//! [axum](https://docs.rs/axum/latest/axum/), with a few lines of wrapper
//! code per endpoint.
//!
//! Implementors provide a [`Provider`] handling externals: the launch data
//! cache, the Platform signing key, and Tool JWKS retrieval. Per-Tool
//! configuration crosses the boundary as an explicit [`Registration`] value.
//!
//! [LTI 1.3]: https://www.imsglobal.org/spec/lti/v1p3
//! [OpenID Connect]: https://openid.net/specs/openid-connect-core-1_0.html

pub mod ags;
pub mod constants;
pub mod deep_linking;
pub mod jwks;
pub mod launch;
pub mod message;
pub mod nrps;
pub mod oidc;
pub mod proctoring;
mod registration;
pub mod state;
pub mod token;

use lti_core::StateStore;
use lti_jose::{KeyOps, KeysetResolver};

pub use lti_core::{error::Error, Result};

pub use crate::ags::LtiAgs;
pub use crate::constants::MessageType;
pub use crate::deep_linking::{ContentItem, LtiDeepLinking};
pub use crate::launch::LaunchResponse;
pub use crate::message::{ContextClaim, LaunchClaims, PresentationClaim, ResourceLinkClaim};
pub use crate::nrps::LtiNrps;
pub use crate::oidc::PreflightResponse;
pub use crate::proctoring::ProctoringData;
pub use crate::registration::{Advantage, Registration};
pub use crate::state::LaunchData;
pub use crate::token::{TokenRequest, TokenResponse};

/// The provider trait implemented by the host: launch data cache, Platform
/// signing key, and Tool JWKS retrieval.
pub trait Provider: StateStore + KeyOps + KeysetResolver + Clone {}
