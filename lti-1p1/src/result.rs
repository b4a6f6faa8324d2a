//! # LTI 2.0 Result Service
//!
//! JSON bodies for the `user/<id>` result REST endpoint. A PUT carrying no
//! `resultScore` means "clear the score" — callers treat it as a DELETE.

use lti_core::error::Error;
use lti_core::Result;
use serde_json::{json, Value};

use crate::oauth1::{self, VerifyRequest};

/// Content type for LTI 2.0 Result bodies.
pub const CONTENT_TYPE_RESULT: &str = "application/vnd.ims.lis.v2.result+json";

const RESULT_CONTEXT: &str = "http://purl.imsglobal.org/ctx/lis/v2/Result";

/// Build a Result body, for GET responses and outbound PUTs.
#[must_use]
pub fn result_body(score: Option<f64>, comment: Option<&str>) -> Value {
    let mut body = json!({
        "@context": RESULT_CONTEXT,
        "@type": "Result",
    });
    if let Some(score) = score {
        body["resultScore"] = json!(score);
    }
    if let Some(comment) = comment {
        body["comment"] = json!(comment);
    }
    body
}

/// Parse an inbound Result body into `(score, comment)`.
///
/// The body is either a JSON object or a one-element array containing one.
/// `@context` must be present and `@type` must be `Result`. A missing
/// `resultScore` is valid and means "no score".
///
/// # Errors
///
/// `Error::MalformedRequest` for structural problems, `Error::ScoreRange`
/// when `resultScore` is non-numeric or outside `[0.0, 1.0]`.
pub fn parse_result_json(body: &str) -> Result<(Option<f64>, String)> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::MalformedRequest(format!("issue parsing result JSON: {e}")))?;

    let value = match value {
        Value::Array(mut items) => {
            if items.len() != 1 {
                return Err(Error::MalformedRequest(
                    "result array must contain exactly one object".into(),
                ));
            }
            items.remove(0)
        }
        value => value,
    };
    let Value::Object(object) = value else {
        return Err(Error::MalformedRequest("result must be a JSON object".into()));
    };

    if !object.contains_key("@context") {
        return Err(Error::MalformedRequest("result is missing @context".into()));
    }
    if object.get("@type").and_then(Value::as_str) != Some("Result") {
        return Err(Error::MalformedRequest("result @type must be \"Result\"".into()));
    }

    let score = match object.get("resultScore") {
        None => None,
        Some(value) => {
            let score = value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| {
                    Error::ScoreRange(format!("resultScore is not a number: {value}"))
                })?;
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::ScoreRange(format!(
                    "resultScore {score} is outside [0.0, 1.0]"
                )));
            }
            Some(score)
        }
    };

    let comment = object.get("comment").and_then(Value::as_str).unwrap_or_default().to_string();
    Ok((score, comment))
}

/// Verify an inbound Result request: optionally its `Content-Type`, then the
/// OAuth1 body signature.
pub fn verify_result_headers(
    request: &VerifyRequest<'_>, content_type: Option<&str>, verify_content_type: bool,
    secret: &str, service_url: &str,
) -> Result<()> {
    if verify_content_type && content_type != Some(CONTENT_TYPE_RESULT) {
        return Err(Error::InvalidRequest(format!(
            "Content-Type must be {CONTENT_TYPE_RESULT}"
        )));
    }
    oauth1::verify_body_signature(request, secret, service_url)
}
