//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8082").
    pub listen_addr: String,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Maximum pooled database connections (default: 10).
    pub database_max_connections: u32,

    /// HS256 secret used to verify caller JWTs.
    pub jwt_secret: String,

    /// Chapa secret API key (optional; purchases fail without it).
    pub chapa_secret: Option<String>,

    /// Chapa API base URL (default: `<https://api.chapa.co/v1>`).
    pub chapa_base_url: String,

    /// Where Chapa posts payment notifications.
    pub chapa_callback_url: String,

    /// Where Chapa sends the buyer after checkout.
    pub chapa_return_url: String,

    /// Shared secret for webhook signatures (optional).
    pub chapa_webhook_secret: Option<String>,

    /// ISO currency code sent with every session.
    pub currency: String,

    /// Timeout for outbound gateway calls, in seconds.
    pub gateway_timeout_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Chapa secrets file structure.
#[derive(Debug, Deserialize)]
struct ChapaSecrets {
    secret_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Try to load Chapa secrets from file first, then fall back to env vars
        let (chapa_secret, chapa_webhook_secret) = load_chapa_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            chapa_secret,
            chapa_base_url: std::env::var("CHAPA_BASE_URL").unwrap_or(defaults.chapa_base_url),
            chapa_callback_url: std::env::var("CHAPA_CALLBACK_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.chapa_callback_url),
            chapa_return_url: std::env::var("CHAPA_RETURN_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.chapa_return_url),
            chapa_webhook_secret,
            currency: std::env::var("PAYMENT_CURRENCY").unwrap_or(defaults.currency),
            gateway_timeout_seconds: env_parse("GATEWAY_TIMEOUT_SECONDS")
                .unwrap_or(defaults.gateway_timeout_seconds),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Load Chapa secrets from file or environment.
fn load_chapa_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/chapa.json",
        "boxoffice/.secrets/chapa.json",
        "../.secrets/chapa.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<ChapaSecrets>(path) {
            tracing::info!(path = %path, "Loaded Chapa secrets from file");
            return (Some(secrets.secret_key), secrets.webhook_secret);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Chapa secrets file not found, using environment variables");
    (
        std::env::var("CHAPA_SECRET").ok().filter(|s| !s.is_empty()),
        std::env::var("CHAPA_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty()),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8082".into(),
            database_url: "postgres://postgres@localhost:5432/postgres".into(),
            database_max_connections: 10,
            jwt_secret: String::new(),
            chapa_secret: None,
            chapa_base_url: "https://api.chapa.co/v1".into(),
            chapa_callback_url: "http://localhost:8082/webhooks/chapa".into(),
            chapa_return_url: "http://localhost:3000/events/reserved".into(),
            chapa_webhook_secret: None,
            currency: "ETB".into(),
            gateway_timeout_seconds: 10,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_gateway_contract() {
        let config = ServiceConfig::default();
        assert_eq!(config.gateway_timeout_seconds, 10);
        assert_eq!(config.currency, "ETB");
        assert!(config.chapa_webhook_secret.is_none());
        assert!(config.chapa_callback_url.ends_with("/webhooks/chapa"));
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<ChapaSecrets>("does/not/exist.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
