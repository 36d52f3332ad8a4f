use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub telemetry: TelemetryConfig,
}

/// Connection settings plus pool ceilings and recycling intervals.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Endpoint that receives error reports. `None` disables reporting.
    pub report_url: Option<String>,
    /// Shared secret for the `x-report-signature` header.
    pub signing_secret: Option<String>,
    pub environment: String,
    pub release: Option<String>,
    /// Upper bound on draining queued reports at shutdown.
    pub flush_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            report_url: None,
            signing_secret: None,
            environment: "production".to_string(),
            release: None,
            flush_timeout: Duration::from_secs(2),
        }
    }
}

/// The individual `DB_*` settings used when `DATABASE_URL` is absent.
#[derive(Debug, Clone)]
pub struct DatabaseParts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

impl DatabaseParts {
    pub fn to_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.dbname),
            self.sslmode,
        )
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let url = match env_opt("DATABASE_URL") {
        Some(url) => url,
        None => DatabaseParts {
            host: env_or("DB_HOST", "localhost".to_string()),
            port: env_or("DB_PORT", 5432),
            user: env_or("DB_USER", "postgres".to_string()),
            password: env_or("DB_PASSWORD", String::new()),
            dbname: env_or("DB_NAME", "logging_api".to_string()),
            sslmode: env_or("DB_SSLMODE", "disable".to_string()),
        }
        .to_url(),
    };

    let environment = env_opt("APP_ENVIRONMENT").unwrap_or_else(|| "production".to_string());
    if environment == "production" && env_opt("ERROR_REPORT_URL").is_none() {
        eprintln!("⚠️  ERROR_REPORT_URL is not set; error reporting is disabled.");
    }

    Ok(Config {
        host: env_or("LOGGING_API_HOST", "0.0.0.0".to_string()),
        port: env_or("LOGGING_API_PORT", 8080),
        database: DatabaseConfig {
            url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 100),
            max_lifetime: Duration::from_secs(env_or("DB_MAX_LIFETIME_SECS", 3600)),
            idle_timeout: Duration::from_secs(env_or("DB_IDLE_TIMEOUT_SECS", 600)),
            acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", 30)),
        },
        telemetry: TelemetryConfig {
            report_url: env_opt("ERROR_REPORT_URL"),
            signing_secret: env_opt("ERROR_REPORT_SECRET"),
            environment,
            release: env_opt("APP_RELEASE"),
            flush_timeout: Duration::from_millis(env_or("ERROR_REPORT_FLUSH_TIMEOUT_MS", 2000)),
        },
    })
}
