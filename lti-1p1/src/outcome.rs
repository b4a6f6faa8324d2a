//! # LTI 1.1 Outcomes Service
//!
//! Parses the `imsx_POXEnvelopeRequest` XML a Tool POSTs to report a grade,
//! and renders the fixed response envelope. Only `replaceResultRequest` is
//! handled; any other action receives the protocol's "unsupported" response
//! rather than an error.

use lti_core::error::Error;
use lti_core::{gen, Result};
use roxmltree::Document;

/// XML namespace of the Outcomes POX envelope.
pub const OUTCOMES_NAMESPACE: &str =
    "http://www.imsglobal.org/services/ltiv1p1/xsd/imsoms_v1p0";

/// The one action this Platform handles semantically.
pub const REPLACE_RESULT: &str = "replaceResultRequest";

/// `imsx_codeMajor` values for the response envelope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodeMajor {
    /// The request was processed.
    Success,

    /// The request could not be processed.
    Failure,

    /// The action is not implemented by this Platform.
    Unsupported,
}

impl std::fmt::Display for CodeMajor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// A parsed Outcomes request.
#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeRequest {
    /// The Tool's `imsx_messageIdentifier`, echoed back in the response.
    pub message_identifier: String,

    /// The action element name, e.g. `replaceResultRequest`.
    pub action: String,

    /// The `lis_result_sourcedid` the grade applies to.
    pub sourced_id: String,

    /// The score, present for `replaceResultRequest`.
    pub score: Option<f64>,
}

impl OutcomeRequest {
    /// Whether this Platform implements the requested action.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.action == REPLACE_RESULT
    }
}

/// Parse an inbound POX envelope.
///
/// # Errors
///
/// `Error::MalformedRequest` when the document does not parse or a required
/// node is missing, `Error::ScoreRange` when the score is outside
/// `[0.0, 1.0]`.
pub fn parse_request(xml: &str) -> Result<OutcomeRequest> {
    tracing::debug!("outcome::parse_request");

    let doc = Document::parse(xml)
        .map_err(|e| Error::MalformedRequest(format!("issue parsing outcome XML: {e}")))?;

    let text = |name: &str| {
        doc.descendants()
            .find(|n| n.tag_name().name() == name)
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
    };

    let Some(message_identifier) = text("imsx_messageIdentifier") else {
        return Err(Error::MalformedRequest("missing imsx_messageIdentifier".into()));
    };
    let Some(body) = doc.descendants().find(|n| n.tag_name().name() == "imsx_POXBody") else {
        return Err(Error::MalformedRequest("missing imsx_POXBody".into()));
    };
    let Some(action_node) = body.children().find(roxmltree::Node::is_element) else {
        return Err(Error::MalformedRequest("missing action element".into()));
    };
    let action = action_node.tag_name().name().to_string();

    let Some(sourced_id) = text("sourcedId") else {
        return Err(Error::MalformedRequest("missing sourcedId".into()));
    };

    let score = if action == REPLACE_RESULT {
        let Some(raw) = text("textString") else {
            return Err(Error::MalformedRequest("missing textString".into()));
        };
        let score: f64 = raw
            .parse()
            .map_err(|_| Error::MalformedRequest(format!("textString is not a number: {raw}")))?;
        if !(0.0..=1.0).contains(&score) {
            return Err(Error::ScoreRange(format!("score {score} is outside [0.0, 1.0]")));
        }
        Some(score)
    } else {
        None
    };

    Ok(OutcomeRequest { message_identifier, action, sourced_id, score })
}

/// Render the response envelope for a processed (or rejected, or
/// unsupported) request.
#[must_use]
pub fn response_xml(code: CodeMajor, description: &str, request: &OutcomeRequest) -> String {
    let operation = request.action.strip_suffix("Request").unwrap_or(&request.action);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<imsx_POXEnvelopeResponse xmlns="{OUTCOMES_NAMESPACE}">
  <imsx_POXHeader>
    <imsx_POXResponseHeaderInfo>
      <imsx_version>V1.0</imsx_version>
      <imsx_messageIdentifier>{message_id}</imsx_messageIdentifier>
      <imsx_statusInfo>
        <imsx_codeMajor>{code}</imsx_codeMajor>
        <imsx_severity>status</imsx_severity>
        <imsx_description>{description}</imsx_description>
        <imsx_messageRefIdentifier>{ref_id}</imsx_messageRefIdentifier>
        <imsx_operationRefIdentifier>{operation}</imsx_operationRefIdentifier>
      </imsx_statusInfo>
    </imsx_POXResponseHeaderInfo>
  </imsx_POXHeader>
  <imsx_POXBody>
    <{operation}Response/>
  </imsx_POXBody>
</imsx_POXEnvelopeResponse>"#,
        message_id = gen::message_id(),
        description = escape(description),
        ref_id = escape(&request.message_identifier),
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(action: &str, sourced_id: &str, score: Option<&str>) -> String {
        let result = score.map_or_else(String::new, |s| {
            format!("<result><resultScore><language>en</language><textString>{s}</textString></resultScore></result>")
        });
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<imsx_POXEnvelopeRequest xmlns="{OUTCOMES_NAMESPACE}">
  <imsx_POXHeader>
    <imsx_POXRequestHeaderInfo>
      <imsx_version>V1.0</imsx_version>
      <imsx_messageIdentifier>msg-123</imsx_messageIdentifier>
    </imsx_POXRequestHeaderInfo>
  </imsx_POXHeader>
  <imsx_POXBody>
    <{action}>
      <resultRecord>
        <sourcedGUID><sourcedId>{sourced_id}</sourcedId></sourcedGUID>
        {result}
      </resultRecord>
    </{action}>
  </imsx_POXBody>
</imsx_POXEnvelopeRequest>"#
        )
    }

    #[test]
    fn parses_replace_result() {
        let xml = envelope(REPLACE_RESULT, "rsid-1", Some("0.92"));
        let request = parse_request(&xml).expect("valid envelope");

        assert_eq!(request.message_identifier, "msg-123");
        assert_eq!(request.action, REPLACE_RESULT);
        assert_eq!(request.sourced_id, "rsid-1");
        assert_eq!(request.score, Some(0.92));
        assert!(request.is_supported());
    }

    #[test]
    fn other_actions_parse_without_score() {
        let xml = envelope("readResultRequest", "rsid-1", None);
        let request = parse_request(&xml).expect("valid envelope");

        assert_eq!(request.action, "readResultRequest");
        assert_eq!(request.score, None);
        assert!(!request.is_supported());

        let response = response_xml(CodeMajor::Unsupported, "readResult is not supported", &request);
        assert!(response.contains("<imsx_codeMajor>unsupported</imsx_codeMajor>"));
        assert!(response.contains("<readResultResponse/>"));
    }

    #[test]
    fn missing_sourced_id_is_malformed() {
        let xml = envelope(REPLACE_RESULT, "", Some("0.5"));
        let err = parse_request(&xml).expect_err("empty sourcedId");
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn missing_score_is_malformed_for_replace_result() {
        let xml = envelope(REPLACE_RESULT, "rsid-1", None);
        let err = parse_request(&xml).expect_err("no textString");
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn score_out_of_range_is_rejected() {
        let xml = envelope(REPLACE_RESULT, "rsid-1", Some("1.5"));
        let err = parse_request(&xml).expect_err("score too large");
        assert!(matches!(err, Error::ScoreRange(_)));
    }

    #[test]
    fn unparseable_document_is_malformed() {
        let err = parse_request("<imsx_POXEnvelopeRequest>").expect_err("broken xml");
        assert!(matches!(err, Error::MalformedRequest(_)));
    }

    #[test]
    fn response_echoes_message_identifier() {
        let request = OutcomeRequest {
            message_identifier: "msg-123".into(),
            action: REPLACE_RESULT.into(),
            sourced_id: "rsid-1".into(),
            score: Some(1.0),
        };
        let response = response_xml(CodeMajor::Success, "Score saved", &request);

        assert!(response.contains("<imsx_messageRefIdentifier>msg-123</imsx_messageRefIdentifier>"));
        assert!(response.contains("<imsx_operationRefIdentifier>replaceResult</imsx_operationRefIdentifier>"));
        assert!(response.contains("<replaceResultResponse/>"));
        assert!(response.contains(OUTCOMES_NAMESPACE));
    }
}
