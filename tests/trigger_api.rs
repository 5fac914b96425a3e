use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sfida::{
    challenge::{
        catalog::SequenceWordPicker, notify::NotifyFuture, ChallengeCatalog, ChallengeConfig,
        LoginNotification, MemorySecurityQuestionStore, Notifier, Orchestrator, SecurityQuestion,
        SecurityQuestionStore,
    },
    sfida::router,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tower::ServiceExt;

const DEFINE: &str = "DefineAuthChallenge_Authentication";
const CREATE: &str = "CreateAuthChallenge_Authentication";
const VERIFY: &str = "VerifyAuthChallengeResponse_Authentication";

struct RecordingNotifier {
    tx: mpsc::UnboundedSender<LoginNotification>,
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, notification: &'a LoginNotification) -> NotifyFuture<'a> {
        Box::pin(async move {
            self.tx
                .send(notification.clone())
                .map_err(|_| anyhow::anyhow!("receiver dropped"))
        })
    }
}

fn app() -> (Router, mpsc::UnboundedReceiver<LoginNotification>) {
    let store: Arc<dyn SecurityQuestionStore> = Arc::new(
        MemorySecurityQuestionStore::new()
            .with_record("u1", SecurityQuestion::new("pet name?", "Rex")),
    );
    let catalog = ChallengeCatalog::new(store.clone(), &ChallengeConfig::new())
        .with_word_picker(Arc::new(SequenceWordPicker::new(vec![1])));

    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(catalog, Arc::new(RecordingNotifier { tx }));

    (router(Arc::new(orchestrator), store), rx)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    Ok((status, value))
}

async fn trigger(app: &Router, event: Value) -> Result<Value> {
    let (status, body) = send(app, Method::POST, "/v1/triggers", Some(event)).await?;
    assert_eq!(status, StatusCode::OK);
    body.get("response").cloned().context("missing response")
}

fn record(metadata: &str, result: bool) -> Value {
    json!({
        "challengeName": "CUSTOM_CHALLENGE",
        "challengeResult": result,
        "challengeMetadata": metadata
    })
}

#[tokio::test]
async fn full_login_over_http() -> Result<()> {
    let (app, mut rx) = app();

    let response = trigger(
        &app,
        json!({"triggerSource": DEFINE, "userName": "u1", "request": {"session": []}}),
    )
    .await?;
    assert_eq!(
        response,
        json!({"issueTokens": false, "failAuthentication": false, "challengeName": "CUSTOM_CHALLENGE"})
    );

    let response = trigger(
        &app,
        json!({"triggerSource": CREATE, "userName": "u1", "request": {"session": []}}),
    )
    .await?;
    assert_eq!(response["publicChallengeParameters"], json!({"question": "pet name?"}));
    assert_eq!(response["challengeMetadata"], json!("QNA_CHALLENGE"));
    let private = response["privateChallengeParameters"].clone();
    assert_eq!(private["answer"], json!("Rex"));

    let response = trigger(
        &app,
        json!({
            "triggerSource": VERIFY,
            "userName": "u1",
            "request": {"privateChallengeParameters": private, "challengeAnswer": " rex "}
        }),
    )
    .await?;
    assert_eq!(response, json!({"answerCorrect": true}));

    let session = json!([record("QNA_CHALLENGE", true)]);
    let response = trigger(
        &app,
        json!({"triggerSource": CREATE, "userName": "u1", "request": {"session": session}}),
    )
    .await?;
    assert_eq!(response["publicChallengeParameters"], json!({"cipherText": "wudlq"}));
    assert_eq!(response["challengeMetadata"], json!("CIPHER_CHALLENGE"));
    let private = response["privateChallengeParameters"].clone();

    let response = trigger(
        &app,
        json!({
            "triggerSource": VERIFY,
            "userName": "u1",
            "request": {"privateChallengeParameters": private, "challengeAnswer": "TRAIN"}
        }),
    )
    .await?;
    assert_eq!(response, json!({"answerCorrect": true}));

    let session = json!([record("QNA_CHALLENGE", true), record("CIPHER_CHALLENGE", true)]);
    let response = trigger(
        &app,
        json!({
            "triggerSource": DEFINE,
            "userName": "u1",
            "request": {"session": session, "userAttributes": {"email": "rider@example.com"}}
        }),
    )
    .await?;
    assert_eq!(response["issueTokens"], json!(true));
    assert_eq!(response["failAuthentication"], json!(false));

    let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await?
        .context("notification channel closed")?;
    assert_eq!(notification.contact, "rider@example.com");
    Ok(())
}

#[tokio::test]
async fn echo_never_leaks_private_parameters() -> Result<()> {
    let (app, _rx) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/triggers",
        Some(json!({
            "triggerSource": VERIFY,
            "userName": "u1",
            "request": {
                "privateChallengeParameters": {"answer": "delta", "challenge": "CIPHER_CHALLENGE"},
                "challengeAnswer": "Delta"
            }
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userName"], json!("u1"));
    assert_eq!(body["response"], json!({"answerCorrect": true}));
    assert!(body["request"].get("privateChallengeParameters").is_none());
    assert!(body["request"].get("challengeAnswer").is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_trigger_fails_authentication() -> Result<()> {
    let (app, _rx) = app();

    let response = trigger(
        &app,
        json!({"triggerSource": "PreSignUp_SignUp", "userName": "u1"}),
    )
    .await?;

    assert_eq!(response["issueTokens"], json!(false));
    assert_eq!(response["failAuthentication"], json!(true));
    Ok(())
}

#[tokio::test]
async fn malformed_history_fails_authentication() -> Result<()> {
    let (app, _rx) = app();

    let session = json!([record("CIPHER_CHALLENGE", true)]);
    let response = trigger(
        &app,
        json!({"triggerSource": DEFINE, "userName": "u1", "request": {"session": session}}),
    )
    .await?;

    assert_eq!(response["failAuthentication"], json!(true));
    Ok(())
}

#[tokio::test]
async fn missing_security_question_returns_500() -> Result<()> {
    let (app, _rx) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/triggers",
        Some(json!({"triggerSource": CREATE, "userName": "u2", "request": {"session": []}})),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, Value::Null);
    Ok(())
}

#[tokio::test]
async fn enrolled_security_question_is_issued() -> Result<()> {
    let (app, _rx) = app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/security-questions/u2",
        Some(json!({"question": "first car?", "answer": "Beetle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = trigger(
        &app,
        json!({"triggerSource": "Create", "userName": "u2", "request": {"session": []}}),
    )
    .await?;
    assert_eq!(response["publicChallengeParameters"], json!({"question": "first car?"}));
    Ok(())
}

#[tokio::test]
async fn blank_security_question_is_rejected() -> Result<()> {
    let (app, _rx) = app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/security-questions/u2",
        Some(json!({"question": "  ", "answer": "Beetle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/v1/security-questions/u2", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_trigger_payload_is_rejected() -> Result<()> {
    let (app, _rx) = app();

    let (status, _) = send(&app, Method::POST, "/v1/triggers", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_trigger_event_is_rejected() -> Result<()> {
    let (app, _rx) = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/triggers")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(
            &json!({"triggerSource": DEFINE, "request": {"session": []}}),
        )?))?;
    let response = app.clone().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(std::str::from_utf8(&bytes)?, "Missing or malformed event");
    Ok(())
}

#[tokio::test]
async fn health_reports_store_status() -> Result<()> {
    let (app, _rx) = app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let x_app = response
        .headers()
        .get("X-App")
        .and_then(|value| value.to_str().ok())
        .context("missing X-App header")?;
    assert!(x_app.starts_with(env!("CARGO_PKG_NAME")));

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["store"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let (app, _rx) = app();

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/v1/triggers").is_some());
    Ok(())
}
