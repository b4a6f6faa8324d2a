//! Inbound Tool-signed messages: Deep Linking responses and proctoring
//! start assessment tokens.

use lti_1p3::{deep_linking, proctoring, Error, ProctoringData};
use lti_jose::jws;
use lti_test_utils::{keystore, registration, Provider};
use serde_json::{json, Value};

const MESSAGE_TYPE: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
const CONTENT_ITEMS: &str = "https://purl.imsglobal.org/spec/lti-dl/claim/content_items";
const VERSION: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
const SESSION_DATA: &str = "https://purl.imsglobal.org/spec/lti-ap/claim/session_data";
const RESOURCE_LINK: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
const ATTEMPT_NUMBER: &str = "https://purl.imsglobal.org/spec/lti-ap/claim/attempt_number";

async fn tool_token(claims: &Value) -> String {
    jws::encode(claims, Some(300), &keystore::tool_signer()).await.expect("tool signs")
}

#[tokio::test]
async fn deep_linking_response_with_accepted_types() {
    lti_test_utils::init_tracer();

    let provider = Provider::new();
    let reg = registration();

    let token = tool_token(&json!({
        MESSAGE_TYPE: "LtiDeepLinkingResponse",
        CONTENT_ITEMS: [
            {"type": "ltiResourceLink", "url": "https://tool.example/content/1", "title": "Quiz 1"},
            {"type": "html", "html": "<p>hello</p>"},
        ],
    }))
    .await;

    let items =
        deep_linking::decode_response(&provider, &reg, &token).await.expect("accepted");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].type_, "ltiResourceLink");
    assert_eq!(items[0].properties["title"], "Quiz 1");
}

#[tokio::test]
async fn one_unsupported_item_rejects_the_whole_batch() {
    lti_test_utils::init_tracer();

    let provider = Provider::new();
    let reg = registration();

    let token = tool_token(&json!({
        MESSAGE_TYPE: "LtiDeepLinkingResponse",
        CONTENT_ITEMS: [
            {"type": "ltiResourceLink", "url": "https://tool.example/content/1"},
            {"type": "file", "url": "https://tool.example/files/1"},
        ],
    }))
    .await;

    let err = deep_linking::decode_response(&provider, &reg, &token)
        .await
        .expect_err("file type is not accepted");
    assert!(matches!(err, Error::ContentTypeNotSupported(_)));
}

#[tokio::test]
async fn deep_linking_response_requires_its_message_type() {
    lti_test_utils::init_tracer();

    let provider = Provider::new();
    let reg = registration();

    let token = tool_token(&json!({
        MESSAGE_TYPE: "LtiResourceLinkRequest",
        CONTENT_ITEMS: [],
    }))
    .await;

    let err = deep_linking::decode_response(&provider, &reg, &token)
        .await
        .expect_err("wrong message type");
    assert!(matches!(err, Error::InvalidClaimValue(_)));
}

fn expected_proctoring() -> ProctoringData {
    ProctoringData {
        attempt_number: 2,
        session_data: "csrf-1".into(),
        start_assessment_url: "https://lms.example.edu/start".into(),
        assessment_control_url: None,
        assessment_control_actions: vec![],
    }
}

fn start_assessment_claims() -> Value {
    json!({
        MESSAGE_TYPE: "LtiStartAssessment",
        VERSION: "1.3.0",
        SESSION_DATA: "csrf-1",
        RESOURCE_LINK: {"id": "rl1"},
        ATTEMPT_NUMBER: 2,
    })
}

#[tokio::test]
async fn start_assessment_token_round_trip() {
    lti_test_utils::init_tracer();

    let provider = Provider::new();
    let reg = registration();

    let token = tool_token(&start_assessment_claims()).await;
    let jwt = proctoring::decode_start_assessment(
        &provider,
        &reg,
        &token,
        &expected_proctoring(),
        "rl1",
    )
    .await
    .expect("all claims match");

    assert_eq!(jwt.claims.attempt_number, Some(2));
    assert_eq!(jwt.claims.session_data.as_deref(), Some("csrf-1"));
}

#[tokio::test]
async fn start_assessment_claim_mismatches_are_distinct_errors() {
    lti_test_utils::init_tracer();

    let provider = Provider::new();
    let reg = registration();
    let expected = expected_proctoring();

    // session_data mismatch
    let mut claims = start_assessment_claims();
    claims[SESSION_DATA] = json!("someone-elses-csrf");
    let err =
        proctoring::decode_start_assessment(&provider, &reg, &tool_token(&claims).await, &expected, "rl1")
            .await
            .expect_err("wrong session_data");
    assert!(matches!(err, Error::InvalidClaimValue(_)));

    // resource link mismatch
    let mut claims = start_assessment_claims();
    claims[RESOURCE_LINK] = json!({"id": "other-resource"});
    let err =
        proctoring::decode_start_assessment(&provider, &reg, &tool_token(&claims).await, &expected, "rl1")
            .await
            .expect_err("wrong resource link");
    assert!(matches!(err, Error::InvalidClaimValue(_)));

    // attempt number mismatch
    let mut claims = start_assessment_claims();
    claims[ATTEMPT_NUMBER] = json!(9);
    let err =
        proctoring::decode_start_assessment(&provider, &reg, &tool_token(&claims).await, &expected, "rl1")
            .await
            .expect_err("wrong attempt");
    assert!(matches!(err, Error::InvalidClaimValue(_)));

    // version mismatch
    let mut claims = start_assessment_claims();
    claims[VERSION] = json!("1.1.0");
    let err =
        proctoring::decode_start_assessment(&provider, &reg, &tool_token(&claims).await, &expected, "rl1")
            .await
            .expect_err("wrong version");
    assert!(matches!(err, Error::InvalidClaimValue(_)));

    // absent claim
    let mut claims = start_assessment_claims();
    claims.as_object_mut().unwrap().remove(ATTEMPT_NUMBER);
    let err =
        proctoring::decode_start_assessment(&provider, &reg, &tool_token(&claims).await, &expected, "rl1")
            .await
            .expect_err("missing attempt");
    assert!(matches!(err, Error::MissingRequiredClaim(_)));
}
