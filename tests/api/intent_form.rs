use std::time::Duration;

use intent_notifier::domain::Goal;
use intent_notifier::intent_form::Field;
use intent_notifier::intent_form::FormState;
use intent_notifier::intent_form::IntentClient;
use intent_notifier::intent_form::IntentForm;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_without_email_client;
use crate::helpers::Failure;
use crate::helpers::TestApp;

fn client(app: &TestApp) -> IntentClient {
    IntentClient::new(app.addr.clone(), Duration::from_secs(10)).expect("build client")
}

fn invest_form() -> IntentForm {
    let mut form = IntentForm::new();
    form.select_goal(Goal::Invest).unwrap();
    form.set(Field::FullName, "Jane Doe").unwrap();
    form.set(Field::Email, "jane@x.com").unwrap();
    form.set(Field::Phone, "+1 555 0100").unwrap();
    form.set(Field::Investment, "$5K - $10K").unwrap();
    form
}

#[tokio::test]
async fn form_submission_ok() {
    let app = spawn_app().await;
    let mut form = invest_form();

    form.submit(&client(&app)).await.unwrap();

    assert_eq!(form.state(), &FormState::Success);
    let sent = app.sent_emails();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Invest in tokenized assets"));
    assert!(sent[0]
        .html_body
        .contains("<p><strong>Phone:</strong> +1 555 0100</p>"));
}

#[tokio::test]
async fn form_shows_server_error_and_retries() {
    let app = spawn_app().await;
    let email_client = app.email_client.clone().unwrap();
    let client = client(&app);
    let mut form = invest_form();

    email_client.fail_with(Some(Failure::Refused));
    form.submit(&client).await.unwrap();
    assert_eq!(
        form.state(),
        &FormState::Failed {
            goal: Goal::Invest,
            message: "Email service temporarily unavailable".to_string()
        }
    );
    assert_eq!(form.value(Field::FullName), "Jane Doe");

    // mail server is back; the user just hits submit again
    email_client.fail_with(None);
    form.submit(&client).await.unwrap();
    assert_eq!(form.state(), &FormState::Success);
    assert_eq!(app.sent_emails().len(), 1);
}

#[tokio::test]
async fn form_shows_configuration_error() {
    let app = spawn_app_without_email_client().await;
    let mut form = invest_form();

    form.submit(&client(&app)).await.unwrap();
    assert_eq!(
        form.state(),
        &FormState::Failed {
            goal: Goal::Invest,
            message: "Email service configuration error".to_string()
        }
    );
}

#[tokio::test]
async fn form_falls_back_when_server_is_gone() {
    // nothing listens here
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = IntentClient::new(format!("http://127.0.0.1:{closed}"), Duration::from_secs(5))
        .expect("build client");
    let mut form = invest_form();

    form.submit(&client).await.unwrap();
    assert_eq!(
        form.state(),
        &FormState::Failed {
            goal: Goal::Invest,
            message: "Something went wrong. Please try again.".to_string()
        }
    );
}
