//! # LTI Core
//!
//! Shared plumbing for the lti-rs crates: the error taxonomy, random string
//! generation, and the state store used to carry launch context between the
//! two legs of an LTI 1.3 flow.
//!
//! This crate is for internal use within the lti-rs project and is not
//! intended to be used directly. Public types are re-exported through the
//! `lti-1p1` and `lti-1p3` crates.

pub mod error;
pub mod gen;
mod provider;

pub use self::error::Error;
pub use self::provider::StateStore;

/// Result type for LTI endpoint handlers and consumers.
pub type Result<T, E = Error> = std::result::Result<T, E>;
