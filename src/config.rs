use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub region: String,
    /// Set for DynamoDB Local and other non-AWS endpoints.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub backoff: BackoffKind,
    pub readiness_attempts: u32,
    pub readiness_poll_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
    pub bootstrap: BootstrapConfig,
}

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Parses `key` when set; a present but malformed value is an error.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

impl StoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".into()),
            endpoint: lookup("DYNAMODB_ENDPOINT"),
            access_key: lookup("AWS_ACCESS_KEY_ID"),
            secret_key: lookup("AWS_SECRET_ACCESS_KEY"),
            timeout_secs: parse_or(lookup, "STORE_TIMEOUT_SECS", 10)?,
        })
    }
}

impl BootstrapConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backoff = match lookup("BOOTSTRAP_BACKOFF").as_deref().map(str::trim) {
            None | Some("fixed") => BackoffKind::Fixed,
            Some("exponential") => BackoffKind::Exponential,
            Some(other) => anyhow::bail!(
                "BOOTSTRAP_BACKOFF must be \"fixed\" or \"exponential\", got {:?}",
                other
            ),
        };
        Ok(Self {
            max_attempts: parse_or(lookup, "BOOTSTRAP_MAX_ATTEMPTS", 5)?,
            retry_delay_secs: parse_or(lookup, "BOOTSTRAP_RETRY_DELAY_SECS", 3)?,
            backoff,
            readiness_attempts: parse_or(lookup, "READINESS_MAX_ATTEMPTS", 10)?,
            readiness_poll_secs: parse_or(lookup, "READINESS_POLL_SECS", 2)?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .context("APP_PORT must be a port number")?,
            None => 3000,
        };

        let ttl_minutes = parse_or(&lookup, "JWT_TTL_MINUTES", 60 * 24)?;
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {}, got {}",
                MAX_TTL_MINUTES,
                ttl_minutes
            );
        }
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is required")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "taskboard".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "taskboard-users".into()),
            ttl_minutes,
        };

        let store = StoreConfig::from_lookup(&lookup)?;
        let bootstrap = BootstrapConfig::from_lookup(&lookup)?;

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            store,
            bootstrap,
        })
    }

    /// Defaults for tests and local fakes; never reads the environment.
    pub fn fake() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            store: StoreConfig {
                region: "us-east-1".into(),
                endpoint: Some("http://localhost:8000".into()),
                access_key: Some("local".into()),
                secret_key: Some("local".into()),
                timeout_secs: 2,
            },
            bootstrap: BootstrapConfig {
                max_attempts: 5,
                retry_delay_secs: 3,
                backoff: BackoffKind::Fixed,
                readiness_attempts: 10,
                readiness_poll_secs: 2,
            },
        }
    }
}
