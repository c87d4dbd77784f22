use std::fmt::Debug;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use chrono::Utc;

use crate::domain::IntentPayload;
use crate::domain::Submission;
use crate::email_client::TransportError;
use crate::notification::IntentNotifier;
use crate::notification::NotifyError;
use crate::utils::error_chain_fmt;
use crate::utils::ResponseErrorMessage;
use crate::utils::ResponseMessage;

/// Everything that can go wrong while handling a submission. The `#[error]`
/// strings are sent to the browser as `{"error": ...}` and shown verbatim by
/// the form, so they must not leak internals; causes only go to the logs.
#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    ValidationError(String),
    /// Missing SMTP settings, or the SMTP server rejected our login. Either
    /// way an operator has to fix the config.
    #[error("Email service configuration error")]
    ConfigurationError(#[source] anyhow::Error),
    #[error("Email service temporarily unavailable")]
    ConnectivityError(#[source] anyhow::Error),
    /// Includes malformed JSON bodies, which are not told apart from other
    /// failures
    #[error("An error occurred while sending the email.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SubmitError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::ConnectivityError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigurationError(_) | Self::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::json())
            .json(ResponseErrorMessage {
                error: self.to_string(),
            })
    }
}

impl From<NotifyError> for SubmitError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::MissingConfiguration => Self::ConfigurationError(e.into()),
            NotifyError::Transport(TransportError::Auth(_)) => Self::ConfigurationError(e.into()),
            NotifyError::Transport(TransportError::Connectivity(_)) => {
                Self::ConnectivityError(e.into())
            }
            NotifyError::Transport(TransportError::Other(_)) => Self::UnexpectedError(e.into()),
        }
    }
}

/// `POST /api/submit-intent`
///
/// Validate the JSON body, email the configured recipients, answer with
/// `{"message": ...}` (200) or `{"error": ...}` (400/500/503).
///
/// The body is taken as raw bytes rather than `web::Json` so that a broken
/// body goes through `SubmitError` like every other failure (500, JSON error)
/// instead of actix's default plain-text 400.
///
/// # Request example
///
/// ```sh
///     curl -v -H 'Content-Type: application/json' \
///         -d '{"goal":"invest","fullName":"Jane Doe","email":"jane@x.com","investment":"$1K - $5K"}' \
///         http://127.0.0.1:8000/api/submit-intent
/// ```
#[tracing::instrument(
    name = "Submitting intent",
    skip(body, notifier),
    fields(
        goal=tracing::field::Empty,
        prospect_email=tracing::field::Empty,
    )
)]
pub async fn submit_intent(
    body: web::Bytes,
    notifier: web::Data<IntentNotifier>,
) -> Result<HttpResponse, SubmitError> {
    let payload: IntentPayload =
        serde_json::from_slice(&body).context("Failed to parse submission body")?;
    let submission: Submission = payload.try_into().map_err(SubmitError::ValidationError)?;

    tracing::Span::current()
        .record("goal", tracing::field::display(submission.goal()))
        .record("prospect_email", tracing::field::display(&submission.email));

    if let Err(e) = notifier.notify(&submission, Utc::now()).await {
        tracing::error!(
            error.cause_chain=?e,
            error.message=%e,
            "Email sending error"
        );
        return Err(e.into());
    }

    Ok(HttpResponse::Ok().json(ResponseMessage {
        message: "Submission successful".to_string(),
    }))
}
