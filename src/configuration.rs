use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::SubscriberEmail;

/// Global configuration, loaded from the `configuration` directory. See
/// `get_configuration`.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub sheet_store: SheetStoreSettings,
    pub news: NewsSettings,
    pub verification: VerificationSettings,
    pub rate_limit: RateLimitSettings,
}

/// Server configuration
#[derive(Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Key used to sign session and flash-message cookies; must be at least
    /// 64 bytes long
    pub hmac_secret: Secret<String>,
}

/// HTTP email relay (Postmark-style API)
#[derive(Clone, Deserialize)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }
}

/// Spreadsheet-backed subscriber store, addressed over HTTP. The sheet itself
/// is opaque to us; `sheet_id` names the spreadsheet holding the subscriber
/// rows.
#[derive(Clone, Deserialize)]
pub struct SheetStoreSettings {
    pub base_url: String,
    pub sheet_id: String,
    pub api_token: Secret<String>,
}

/// Third-party news aggregator
#[derive(Clone, Deserialize)]
pub struct NewsSettings {
    pub base_url: String,
    pub api_key: Secret<String>,

    /// How long fetched articles stay fresh in the in-memory cache
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub cache_ttl_seconds: i64,

    /// Articles per topic on the trending page
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub trending_page_size: u32,
}

/// OTP issuance/verification knobs
#[derive(Clone, Deserialize)]
pub struct VerificationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub otp_ttl_seconds: i64,

    /// Wrong guesses tolerated before the pending code is invalidated
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u32,
}

/// Fixed-window rate limiting, keyed by client IP
#[derive(Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_requests: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_seconds: i64,
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
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`.
///
/// All fields must be present in these files, otherwise initialisation will
/// fail immediately, and the server will not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .expect("could not get current dir")
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .expect("could not initiate Environment struct");

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are always parsed as String; `serde-aux` coerces the numeric fields.
            //
            // `APP_APPLICATION__PORT=5001` -> `Settings.application.port`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
