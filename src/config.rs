//! Service configuration, built from environment variables.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Trigger keywords used when `TRIGGER_KEYWORDS` is not set.
pub const DEFAULT_TRIGGER_KEYWORDS: &[&str] = &["form", "register", "sign up", "info", "information"];

/// Runtime configuration for the webhook server and the BlueBubbles
/// bridge connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind the HTTP server on. Defaults to `::` (dual-stack).
    pub bind_host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// Base URL of the BlueBubbles server, without a trailing slash.
    pub bluebubbles_url: String,
    /// BlueBubbles server password, sent as a query parameter.
    pub server_password: SecretString,
    /// Send method passed to BlueBubbles (`apple-script` unless the
    /// private API is enabled on the server).
    pub send_method: String,
    /// Optional shared secret the webhook caller must present.
    pub webhook_secret: Option<SecretString>,
    /// Lowercased keywords that start a new flow when no flow is active.
    pub trigger_keywords: Vec<String>,
}

impl Config {
    /// Build config from environment variables.
    /// Fails if `SERVER_PASSWORD` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_password = std::env::var("SERVER_PASSWORD")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("SERVER_PASSWORD".to_string()))?;

        let bind_host = std::env::var("BIND_HOST").unwrap_or_else(|_| "::".to_string());

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("{raw} is not a valid port number"),
            })?,
            Err(_) => 8000,
        };

        let bluebubbles_url = std::env::var("BLUEBUBBLES_URL")
            .unwrap_or_else(|_| "http://localhost:1234".to_string())
            .trim_end_matches('/')
            .to_string();

        let send_method =
            std::env::var("BLUEBUBBLES_METHOD").unwrap_or_else(|_| "apple-script".to_string());

        let webhook_secret = std::env::var("WEBHOOK_SECRET").ok().map(SecretString::from);

        let trigger_keywords = match std::env::var("TRIGGER_KEYWORDS") {
            Ok(raw) => parse_trigger_keywords(&raw),
            Err(_) => DEFAULT_TRIGGER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        };

        Ok(Self {
            bind_host,
            port,
            bluebubbles_url,
            server_password,
            send_method,
            webhook_secret,
            trigger_keywords,
        })
    }

    /// Socket address string for the HTTP listener. IPv6 hosts are
    /// bracketed so the string parses as a `SocketAddr`.
    pub fn bind_addr(&self) -> String {
        if self.bind_host.contains(':') {
            format!("[{}]:{}", self.bind_host, self.port)
        } else {
            format!("{}:{}", self.bind_host, self.port)
        }
    }
}

/// Split a comma-separated keyword list, lowercasing and dropping
/// empty entries.
pub fn parse_trigger_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
