use std::collections::HashMap;

use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    pub auth: AuthSettings,
    /// Role name -> module names. `None` selects the built-in school matrix.
    #[serde(default)]
    pub permissions: Option<HashMap<String, Vec<String>>>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub store: StoreBackend,
}

/// Which data-access backend the server runs against
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Bearer token and password hashing settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_expire_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
}

// Hand-written so the secret never reaches a log line through `{:?}`.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret_key", &"[redacted]")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("password_hash_cost", &self.password_hash_cost)
            .finish()
    }
}

impl AuthSettings {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_expire_minutes(),
            password_hash_cost: default_hash_cost(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_expire_minutes() -> i64 {
    60
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Loads settings from an optional `configuration` file, `APP__*` variables,
/// and the `SECRET_KEY`, `ALGORITHM` and `ACCESS_TOKEN_EXPIRE_MINUTES`
/// variables, in increasing order of precedence.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("auth.secret_key", std::env::var("SECRET_KEY").ok())?
        .set_override_option("auth.algorithm", std::env::var("ALGORITHM").ok())?
        .set_override_option(
            "auth.access_token_expire_minutes",
            std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES").ok(),
        )?
        .build()?;
    settings.try_deserialize::<Settings>()
}
