use std::fmt::Debug;
use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::address::AddressError;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::Tls;
use lettre::transport::smtp::client::TlsParameters;
use lettre::transport::smtp::response::Category;
use lettre::transport::smtp::response::Code;
use lettre::transport::smtp::response::Severity;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;
use secrecy::ExposeSecret;
use secrecy::Secret;

use crate::domain::EmailAddress;
use crate::utils::error_chain_fmt;

/// A display name plus an address, i.e. `"Vaulto Notifier" <noreply@vaulto.ai>`
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: EmailAddress,
}

impl Display for Mailbox {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name:?} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// A fully assembled outbound message, handed as-is to a `MailTransport`
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: Mailbox,
    pub recipients: Vec<EmailAddress>,
    pub subject: String,
    pub html_body: String,
}

/// Failures a `MailTransport` can report. The variant (not the message) is
/// what decides the status code returned to the form.
#[derive(thiserror::Error)]
pub enum TransportError {
    /// DNS resolution, refused connection, TLS handshake, timeouts
    #[error("Could not reach the mail server")]
    Connectivity(#[source] anyhow::Error),
    #[error("The mail server rejected our credentials")]
    Auth(#[source] anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Debug for TransportError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Anything that can deliver an `Envelope`. In production this is
/// `SmtpEmailClient`; tests swap in an in-memory implementation.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Confirm that the server is reachable and accepts our credentials
    async fn verify(&self) -> Result<(), TransportError>;

    async fn send_email(
        &self,
        envelope: &Envelope,
    ) -> Result<(), TransportError>;
}

/// Where and as whom to log in. Only exists if all three were configured.
pub struct SmtpCredentials {
    pub host: String,
    pub username: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SmtpTimeouts {
    /// TCP connect (and TLS handshake)
    pub connection: Duration,
    /// Waiting for the server's greeting once connected
    pub greeting: Duration,
    /// Any single read/write on an established session
    pub socket: Duration,
}

/// SMTP implementation of `MailTransport`.
///
/// There is no connection pool; `verify` and `send_email` each open (and
/// close) their own session, so concurrent requests never share state.
pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeouts: SmtpTimeouts,
}

impl SmtpEmailClient {
    /// Port 465 means implicit TLS ("secure"); any other port uses STARTTLS
    /// when the server offers it.
    pub fn new(
        credentials: SmtpCredentials,
        port: u16,
        timeouts: SmtpTimeouts,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let host = credentials.host;
        let builder = match port {
            465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&host)?,
            // upgrade if the server offers STARTTLS, carry on in plaintext if
            // it does not
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
                .tls(Tls::Opportunistic(TlsParameters::new(host.clone())?)),
        };
        let transport = builder
            .port(port)
            .credentials(Credentials::new(
                credentials.username,
                credentials.password.expose_secret().to_owned(),
            ))
            .timeout(Some(timeouts.socket))
            .build();
        Ok(Self {
            transport,
            timeouts,
        })
    }

    /// Time allowed to get a session up: connect, then greeting
    fn session_timeout(&self) -> Duration { self.timeouts.connection + self.timeouts.greeting }
}

#[async_trait]
impl MailTransport for SmtpEmailClient {
    #[tracing::instrument(name = "Verifying SMTP connection", skip_all)]
    async fn verify(&self) -> Result<(), TransportError> {
        let connected = tokio::time::timeout(self.session_timeout(), self.transport.test_connection())
            .await
            .context("Timed out connecting to the mail server")
            .map_err(TransportError::Connectivity)?
            .map_err(classify)?;
        match connected {
            true => Ok(()),
            false => Err(TransportError::Other(anyhow::anyhow!(
                "Mail server did not answer NOOP"
            ))),
        }
    }

    #[tracing::instrument(
        name = "Sending notification email",
        skip_all,
        fields(subject = %envelope.subject)
    )]
    async fn send_email(
        &self,
        envelope: &Envelope,
    ) -> Result<(), TransportError> {
        let message = to_message(envelope)?;
        let limit = self.session_timeout() + self.timeouts.socket;
        tokio::time::timeout(limit, self.transport.send(message))
            .await
            .context("Timed out sending to the mail server")
            .map_err(TransportError::Connectivity)?
            .map_err(classify)?;
        Ok(())
    }
}

/// The form's email check is looser than what SMTP accepts (e.g.
/// `jane,doe@x.com` passes the former)
pub fn smtp_address(address: &EmailAddress) -> Result<lettre::Address, AddressError> {
    address.as_ref().parse::<lettre::Address>()
}

fn to_mailbox(
    name: Option<String>,
    address: &EmailAddress,
) -> Result<lettre::message::Mailbox, anyhow::Error> {
    let address =
        smtp_address(address).with_context(|| format!("SMTP rejects address {address}"))?;
    Ok(lettre::message::Mailbox::new(name, address))
}

fn to_message(envelope: &Envelope) -> Result<Message, anyhow::Error> {
    let mut builder = Message::builder()
        .from(to_mailbox(
            envelope.sender.name.clone(),
            &envelope.sender.address,
        )?)
        .subject(envelope.subject.clone())
        .header(ContentType::TEXT_HTML);
    for recipient in &envelope.recipients {
        builder = builder.to(to_mailbox(None, recipient)?);
    }
    builder
        .body(envelope.html_body.clone())
        .context("Failed to build email message")
}

/// 530, 534, 535: authentication required / too weak / credentials invalid
fn is_auth_rejection(code: Code) -> bool {
    code.severity == Severity::PermanentNegativeCompletion
        && code.category == Category::Unspecified3
}

fn classify(e: lettre::transport::smtp::Error) -> TransportError {
    if e.is_timeout() {
        return TransportError::Connectivity(e.into());
    }
    match e.status() {
        Some(code) if is_auth_rejection(code) => TransportError::Auth(e.into()),
        Some(_) => TransportError::Other(e.into()),
        // no SMTP reply at all and not a protocol/client bug: we never got a
        // working connection
        None if e.is_client() || e.is_response() => TransportError::Other(e.into()),
        None => TransportError::Connectivity(e.into()),
    }
}
