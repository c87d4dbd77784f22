use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::email_client::MailTransport;
use crate::notification::IntentNotifier;
use crate::routes::health_check;
use crate::routes::submit_intent;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Build the SMTP client from `cfg` and start listening.
    ///
    /// Bad sender/recipient settings are fatal here; missing SMTP credentials
    /// are not (see `EmailClientSettings`).
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let email_client: Option<Arc<dyn MailTransport>> = match cfg.email_client.client()? {
            Some(client) => Some(Arc::new(client)),
            None => {
                tracing::error!(
                    "Email configuration missing; every submission will be rejected until \
                     host, username and password are set"
                );
                None
            }
        };
        Self::build_with_email_client(cfg, email_client).await
    }

    /// Like `build`, but with a caller-supplied transport (`None` meaning
    /// "not configured"). `cfg.email_client`'s SMTP fields are ignored.
    pub async fn build_with_email_client(
        cfg: Settings,
        email_client: Option<Arc<dyn MailTransport>>,
    ) -> Result<Self, anyhow::Error> {
        let sender = cfg
            .email_client
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender")?;
        let recipients = cfg
            .email_client
            .recipients()
            .map_err(anyhow::Error::msg)
            .context("Invalid recipients")?;
        let notifier = IntentNotifier::new(email_client, sender, recipients);

        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // get the randomised port assigned by OS, if port 0 was requested
        let port = listener.local_addr()?.port();

        let server = run(listener, notifier)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    notifier: IntentNotifier,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`; every worker gets a clone of the same notifier
    let notifier = web::Data::new(notifier);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/api/submit-intent", web::post().to(submit_intent))
            .app_data(notifier.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
