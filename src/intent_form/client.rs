use std::fmt::Debug;
use std::time::Duration;

use reqwest::Client;

use crate::domain::IntentPayload;
use crate::utils::error_chain_fmt;
use crate::utils::ResponseErrorMessage;
use crate::utils::ResponseMessage;

/// What the form shows when the server gave no usable error message
pub const FALLBACK_ERROR: &str = "Something went wrong. Please try again.";

#[derive(thiserror::Error)]
pub enum SubmissionFailure {
    /// The server answered, but not with 2xx. `message` is its `error` field,
    /// if the body had one.
    #[error("Submission rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("Could not reach the server")]
    Network(#[source] reqwest::Error),
}

impl Debug for SubmissionFailure {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl SubmissionFailure {
    /// Text for the person filling in the form: the server's own message when
    /// there is one, a generic one otherwise
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            _ => FALLBACK_ERROR.to_string(),
        }
    }
}

/// HTTP client for `POST /api/submit-intent`.
///
/// Holds a single `reqwest::Client`, which pools connections, so one
/// `IntentClient` should be reused across submissions.
pub struct IntentClient {
    http_client: Client,
    base_url: String,
}

impl IntentClient {
    /// `base_url` without trailing slash, e.g. `https://vaulto.ai`
    pub fn new(
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Returns the server's success message
    #[tracing::instrument(name = "Posting intent", skip_all)]
    pub async fn submit_intent(
        &self,
        payload: &IntentPayload,
    ) -> Result<String, SubmissionFailure> {
        let resp = self
            .http_client
            .post(format!("{}/api/submit-intent", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(SubmissionFailure::Network)?;

        let status = resp.status();
        if status.is_success() {
            // the email is out at this point; an odd body does not change that
            let message = resp
                .json::<ResponseMessage>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "Submission successful".to_string());
            Ok(message)
        } else {
            let message = resp
                .json::<ResponseErrorMessage>()
                .await
                .ok()
                .map(|body| body.error);
            Err(SubmissionFailure::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}
