//! An implementation of the Platform ("Tool Consumer") side of the
//! [LTI 1.1] specification.
//!
//! # LTI 1.1
//!
//! An LTI 1.1 launch is a browser-submitted POST form whose parameters are
//! signed with OAuth1 HMAC-SHA1 under a key/secret shared between Platform
//! and Tool. On the return path the Tool calls back into the Platform with
//! grade data — either the LTI 1.1 Outcomes XML service or the LTI 2.0
//! Result JSON service — signing the request body with the OAuth1 body-hash
//! extension.
//!
//! This crate covers the protocol core only: parameter assembly and signing
//! ([`launch`]), signature and body-hash verification ([`oauth1`]), and the
//! two grade callback payload formats ([`result`], [`outcome`]). HTTP
//! transport and grade persistence belong to the host.
//!
//! [LTI 1.1]: https://www.imsglobal.org/specs/ltiv1p1

pub mod launch;
pub mod oauth1;
pub mod outcome;
pub mod result;

pub use lti_core::{error::Error, Result};

pub use crate::launch::{ContextData, LaunchBuilder, LaunchParameters, ToolConfig, UserData};
pub use crate::oauth1::VerifyRequest;
