use std::fmt::Debug;
use std::sync::Arc;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use htmlescape::encode_minimal;

use crate::domain::EmailAddress;
use crate::domain::Goal;
use crate::domain::Interest;
use crate::domain::Submission;
use crate::email_client::Envelope;
use crate::email_client::MailTransport;
use crate::email_client::Mailbox;
use crate::email_client::TransportError;
use crate::utils::error_chain_fmt;

/// Goal-specific values the prospect skipped are still listed, so the reader
/// of the email can tell "not asked" from "not answered"
const NOT_PROVIDED: &str = "Not provided";

#[derive(thiserror::Error)]
pub enum NotifyError {
    /// Host, username or password was not configured; nothing was attempted
    #[error("Email configuration missing")]
    MissingConfiguration,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Debug for NotifyError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Turns a `Submission` into an email and hands it to the mail transport.
///
/// Built once at startup from `EmailClientSettings` and shared (read-only)
/// between all workers. `email_client` is `None` when the SMTP settings are
/// incomplete; every notification then fails with `MissingConfiguration`.
pub struct IntentNotifier {
    email_client: Option<Arc<dyn MailTransport>>,
    sender: Mailbox,
    recipients: Vec<EmailAddress>,
}

impl IntentNotifier {
    pub fn new(
        email_client: Option<Arc<dyn MailTransport>>,
        sender: Mailbox,
        recipients: Vec<EmailAddress>,
    ) -> Self {
        Self {
            email_client,
            sender,
            recipients,
        }
    }

    pub fn is_configured(&self) -> bool { self.email_client.is_some() }

    pub fn envelope(
        &self,
        submission: &Submission,
        submitted_at: DateTime<Utc>,
    ) -> Envelope {
        Envelope {
            sender: self.sender.clone(),
            recipients: self.recipients.clone(),
            subject: subject(submission.goal()),
            html_body: html_body(submission, submitted_at),
        }
    }

    /// Verify the transport, then send exactly one email. No retries; a
    /// second call with the same submission sends a second email.
    #[tracing::instrument(name = "Notifying about new submission", skip_all)]
    pub async fn notify(
        &self,
        submission: &Submission,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        let email_client = self
            .email_client
            .as_ref()
            .ok_or(NotifyError::MissingConfiguration)?;
        let envelope = self.envelope(submission, submitted_at);
        email_client.verify().await?;
        email_client.send_email(&envelope).await?;
        Ok(())
    }
}

pub fn subject(goal: Goal) -> String { format!("New Submission: {}", goal.label()) }

fn push_field(
    body: &mut String,
    label: &str,
    value: &str,
) {
    body.push_str(&format!(
        "<p><strong>{label}:</strong> {}</p>",
        encode_minimal(value)
    ));
}

/// Every user-supplied value is HTML-escaped; the timestamp is ISO-8601 in
/// UTC with milliseconds, e.g. `2026-10-17T09:30:00.000Z`.
pub fn html_body(
    submission: &Submission,
    submitted_at: DateTime<Utc>,
) -> String {
    let mut body = "<h1>New Intent to Tokenize Submission</h1>".to_string();
    push_field(&mut body, "Goal", submission.goal().label());
    push_field(&mut body, "Full Name", submission.name.as_ref());
    push_field(&mut body, "Email", submission.email.as_ref());
    if let Some(company) = &submission.company {
        push_field(&mut body, "Company", company);
    }
    if let Some(phone) = &submission.phone {
        push_field(&mut body, "Phone", phone);
    }

    match &submission.interest {
        Interest::Tokenize {
            asset_type,
            other_asset_type,
            asset_value,
        } => {
            push_field(
                &mut body,
                "Asset Type",
                asset_type.as_deref().unwrap_or(NOT_PROVIDED),
            );
            if let Some(other) = other_asset_type {
                push_field(&mut body, "Other Asset Type", other);
            }
            push_field(
                &mut body,
                "Estimated Asset Value (USD)",
                asset_value.as_deref().unwrap_or(NOT_PROVIDED),
            );
        }
        Interest::Invest { investment } => push_field(
            &mut body,
            "Intended Investment (USD)",
            investment.as_deref().unwrap_or(NOT_PROVIDED),
        ),
    }

    body.push_str(&format!(
        "<hr><p><small>Submitted at: {}</small></p>",
        submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    body
}
