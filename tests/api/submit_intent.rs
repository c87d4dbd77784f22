use std::time::Duration;
use std::time::Instant;

use intent_notifier::startup::Application;
use serde_json::json;
use serde_json::Value;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with_failure;
use crate::helpers::spawn_app_with_smtp;
use crate::helpers::spawn_app_with_unreachable_smtp;
use crate::helpers::spawn_app_without_email_client;
use crate::helpers::test_configuration;
use crate::helpers::tokenize_body;
use crate::helpers::Failure;
use crate::helpers::FakeSmtpServer;
use crate::helpers::SmtpBehaviour;

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("JSON body");
    body["error"].as_str().expect("error field").to_string()
}

#[tokio::test]
async fn tokenize_ok() {
    let app = spawn_app().await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Submission successful" }));

    let sent = app.sent_emails();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert!(email.subject.contains("Tokenize my own assets"));
    let recipients: Vec<&str> = email.recipients.iter().map(|r| r.as_ref()).collect();
    assert_eq!(recipients, vec!["charliebc@vaulto.ai", "david@vaulto.ai"]);
    assert_eq!(
        email.sender.to_string(),
        r#""Vaulto Notifier" <noreply@vaulto.ai>"#
    );
    assert!(email.html_body.contains("<p><strong>Full Name:</strong> Jane Doe</p>"));
    assert!(email.html_body.contains("<p><strong>Asset Type:</strong> Real Estate</p>"));

    // verified before sending
    assert_eq!(app.email_client.as_ref().unwrap().verify_calls(), 1);
}

#[tokio::test]
async fn invest_ok() {
    let app = spawn_app().await;

    let body = json!({
        "goal": "invest",
        "fullName": "John Roe",
        "email": "john@roe.io",
        "company": "Roe Capital",
        "investment": "$10K - $25K",
    });
    let resp = app.post_submit_intent(&body).await;
    assert_eq!(resp.status().as_u16(), 200);

    let sent = app.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New Submission: Invest in tokenized assets");
    assert!(sent[0]
        .html_body
        .contains("<p><strong>Intended Investment (USD):</strong> $10K - $25K</p>"));
    assert!(sent[0].html_body.contains("<p><strong>Company:</strong> Roe Capital</p>"));
}

#[tokio::test]
async fn missing_required_fields() {
    let app = spawn_app().await;

    for (field, msg) in [
        ("goal", "no goal"),
        ("fullName", "no name"),
        ("email", "no email"),
    ] {
        let mut body = tokenize_body();
        body.as_object_mut().unwrap().remove(field);
        let resp = app.post_submit_intent(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        assert_eq!(error_of(resp).await, "Missing required fields", "{msg}");

        // empty counts as missing
        let mut body = tokenize_body();
        body[field] = json!("");
        let resp = app.post_submit_intent(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "empty {field}");
    }

    let resp = app.post_submit_intent(&json!({})).await;
    assert_eq!(resp.status().as_u16(), 400, "empty object");

    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn invalid_email() {
    let app = spawn_app().await;

    for email in ["foo", "a@b", "jane doe@x.com", "@x.com"] {
        let mut body = tokenize_body();
        body["email"] = json!(email);
        let resp = app.post_submit_intent(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{email}");
        assert_eq!(error_of(resp).await, "Invalid email format", "{email}");
    }
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn unknown_goal() {
    let app = spawn_app().await;

    let mut body = tokenize_body();
    body["goal"] = json!("speculate");
    let resp = app.post_submit_intent(&body).await;
    assert_eq!(resp.status().as_u16(), 400);
    // the raw value is not echoed back
    assert_eq!(error_of(resp).await, "Invalid goal");
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn any_non_empty_name_is_accepted() {
    let app = spawn_app().await;

    for name in ["   ".to_string(), "a".repeat(300)] {
        let mut body = tokenize_body();
        body["fullName"] = json!(name);
        let resp = app.post_submit_intent(&body).await;
        assert_eq!(resp.status().as_u16(), 200, "{name:?}");
    }
    assert_eq!(app.sent_emails().len(), 2);
}

#[tokio::test]
async fn validation_comes_before_configuration() {
    let app = spawn_app_without_email_client().await;

    let resp = app.post_submit_intent(&json!({ "goal": "invest" })).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_email_configuration() {
    let app = spawn_app_without_email_client().await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(error_of(resp).await, "Email service configuration error");
}

#[tokio::test]
async fn connection_refused() {
    let app = spawn_app_with_failure(Failure::Refused).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 503);
    assert_eq!(error_of(resp).await, "Email service temporarily unavailable");
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn invalid_login_is_a_configuration_error() {
    let app = spawn_app_with_failure(Failure::InvalidLogin).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(error_of(resp).await, "Email service configuration error");
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn other_transport_failure() {
    let app = spawn_app_with_failure(Failure::Rejected).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(
        error_of(resp).await,
        "An error occurred while sending the email."
    );
}

#[tokio::test]
async fn malformed_json_is_a_generic_failure() {
    let app = spawn_app().await;

    for (body, msg) in [
        ("".to_string(), "empty body"),
        ("{\"goal\": \"tokenize\",".to_string(), "truncated"),
        ("[1, 2, 3]".to_string(), "not an object"),
        (r#"{"goal": 42, "fullName": "Jane", "email": "jane@x.com"}"#.to_string(), "wrong type"),
    ] {
        let resp = app.post_raw_submit_intent(body).await;
        assert_eq!(resp.status().as_u16(), 500, "{msg}");
        assert_eq!(
            error_of(resp).await,
            "An error occurred while sending the email.",
            "{msg}"
        );
    }
    assert!(app.sent_emails().is_empty());
}

#[tokio::test]
async fn resubmission_sends_twice() {
    let app = spawn_app().await;

    for _ in 0..2 {
        let resp = app.post_submit_intent(&tokenize_body()).await;
        assert_eq!(resp.status().as_u16(), 200);
    }

    // no dedup: same payload, two emails
    let sent = app.sent_emails();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, sent[1].subject);
}

#[tokio::test]
async fn concurrent_submissions() {
    let app = spawn_app().await;

    let body = tokenize_body();
    let (a, b) = tokio::join!(
        app.post_submit_intent(&body),
        app.post_submit_intent(&body)
    );
    assert_eq!(a.status().as_u16(), 200);
    assert_eq!(b.status().as_u16(), 200);
    assert_eq!(app.sent_emails().len(), 2);
}

#[tokio::test]
async fn unreachable_smtp_server() {
    let app = spawn_app_with_unreachable_smtp().await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 503);
    assert_eq!(error_of(resp).await, "Email service temporarily unavailable");
}

#[tokio::test]
async fn plaintext_smtp_server() {
    let smtp = FakeSmtpServer::start(SmtpBehaviour::Accept).await;
    let app = spawn_app_with_smtp(smtp.port).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 200);

    // no STARTTLS on offer, so the login and the message go in plaintext
    assert_eq!(smtp.received("STARTTLS"), 0);
    assert!(smtp.received("AUTH") >= 1);
    assert_eq!(smtp.received("RCPT"), 2);
    assert_eq!(smtp.received("DATA"), 1);
}

#[tokio::test]
async fn smtp_login_rejected() {
    let smtp = FakeSmtpServer::start(SmtpBehaviour::RejectLogin).await;
    let app = spawn_app_with_smtp(smtp.port).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(error_of(resp).await, "Email service configuration error");
    assert_eq!(smtp.received("DATA"), 0);
}

#[tokio::test]
async fn smtp_message_rejected() {
    let smtp = FakeSmtpServer::start(SmtpBehaviour::RejectData).await;
    let app = spawn_app_with_smtp(smtp.port).await;

    let resp = app.post_submit_intent(&tokenize_body()).await;
    assert_eq!(resp.status().as_u16(), 500);
    assert_eq!(
        error_of(resp).await,
        "An error occurred while sending the email."
    );
}

#[tokio::test]
async fn silent_smtp_server_times_out() {
    let smtp = FakeSmtpServer::start(SmtpBehaviour::Silent).await;
    let app = spawn_app_with_smtp(smtp.port).await;

    // connection + greeting timeouts are 3s in total
    let start = Instant::now();
    let resp = tokio::time::timeout(
        Duration::from_secs(15),
        app.post_submit_intent(&tokenize_body()),
    )
    .await
    .expect("request hung");
    assert_eq!(resp.status().as_u16(), 503);
    assert_eq!(error_of(resp).await, "Email service temporarily unavailable");
    assert!(start.elapsed() < Duration::from_secs(10), "{:?}", start.elapsed());
}

#[tokio::test]
async fn undeliverable_recipient_fails_startup() {
    let mut cfg = test_configuration();
    cfg.email_client.recipients = vec!["david@vaulto.ai".to_string(), "a,b@x.com".to_string()];

    let app = Application::build_with_email_client(cfg, None).await;
    assert!(app.is_err());
}
