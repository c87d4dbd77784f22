use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::EmailAddress;
use crate::email_client::smtp_address;
use crate::email_client::Mailbox;
use crate::email_client::SmtpCredentials;
use crate::email_client::SmtpEmailClient;
use crate::email_client::SmtpTimeouts;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    /// 0 lets the OS pick (tests)
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

fn default_smtp_port() -> u16 { 587 }

/// Configured addresses must pass both the form's check and SMTP's, so that a
/// typo stops the server at startup instead of failing every submission
fn deliverable(address: &str) -> Result<EmailAddress, String> {
    let address = EmailAddress::parse(address.to_string())?;
    smtp_address(&address).map_err(|e| format!("Undeliverable address {address}: {e}"))?;
    Ok(address)
}

/// Outbound mail configuration.
///
/// `host`, `username` and `password` are optional so that the server can
/// still start (and answer 400s, health checks) without them; their absence
/// is reported on every valid submission instead.
#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    pub host: Option<String>,

    /// 465 -> implicit TLS, anything else -> STARTTLS
    #[serde(
        default = "default_smtp_port",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub port: u16,

    pub username: Option<String>,
    pub password: Option<Secret<String>>,

    /// Display name in the `From` header
    pub sender_name: String,
    pub sender_email: String,

    /// Who gets notified. Same list for every submission.
    pub recipients: Vec<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub connection_timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub greeting_timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub socket_timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<Mailbox, String> {
        let address = deliverable(&self.sender_email)?;
        let name = Some(self.sender_name.clone()).filter(|n| !n.trim().is_empty());
        Ok(Mailbox { name, address })
    }

    pub fn recipients(&self) -> Result<Vec<EmailAddress>, String> {
        if self.recipients.is_empty() {
            return Err("At least one recipient must be configured".to_string());
        }
        self.recipients.iter().map(|r| deliverable(r)).collect()
    }

    pub fn timeouts(&self) -> SmtpTimeouts {
        SmtpTimeouts {
            connection: Duration::from_millis(self.connection_timeout_milliseconds),
            greeting: Duration::from_millis(self.greeting_timeout_milliseconds),
            socket: Duration::from_millis(self.socket_timeout_milliseconds),
        }
    }

    /// `None` unless host, username and password are all present and
    /// non-empty. An env var that is set but empty counts as missing.
    pub fn credentials(&self) -> Option<SmtpCredentials> {
        fn present(s: &Option<String>) -> Option<String> {
            s.clone().filter(|s| !s.trim().is_empty())
        }
        let password = self
            .password
            .clone()
            .filter(|p| !p.expose_secret().is_empty())?;
        Some(SmtpCredentials {
            host: present(&self.host)?,
            username: present(&self.username)?,
            password,
        })
    }

    /// Build the SMTP client, or `None` if credentials are incomplete
    pub fn client(&self) -> Result<Option<SmtpEmailClient>, anyhow::Error> {
        match self.credentials() {
            Some(credentials) => Ok(Some(SmtpEmailClient::new(
                credentials,
                self.port,
                self.timeouts(),
            )?)),
            None => Ok(None),
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// overlay `APP_*` env vars.
///
/// Fields without a default must be present in these files, otherwise
/// initialisation fails immediately and the server does not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- strings, hence `deserialize_number_from_string` above.
            //
            // `APP_EMAIL_CLIENT__HOST=smtp.example.com` -> `Settings.email_client.host`
            // `APP_EMAIL_CLIENT__RECIPIENTS=a@x.com,b@x.com` -> `Settings.email_client.recipients`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("email_client.recipients")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
