use intent_notifier::configuration::get_configuration;
use intent_notifier::startup::Application;
use intent_notifier::telemetry::get_subscriber;
use intent_notifier::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("intent-notifier", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration()?;
    let server = Application::build(cfg).await?;
    tracing::info!("listening on port {}", server.get_port());
    server.run_until_stopped().await?;

    Ok(())
}
