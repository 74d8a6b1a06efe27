//! Configuration types.

/// Default listening port when none (or an unparsable one) is configured.
pub const DEFAULT_PORT: u16 = 8000;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Verbose logging.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables.
    ///
    /// - `MAIL_TRIAGE_HOST` (default `0.0.0.0`)
    /// - `PORT`, then `MAIL_TRIAGE_PORT` (default 8000)
    /// - `MAIL_TRIAGE_DEBUG=true` enables debug logging
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty("MAIL_TRIAGE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_port(
            non_empty("PORT").or_else(|| non_empty("MAIL_TRIAGE_PORT")).as_deref(),
            DEFAULT_PORT,
        );
        let debug = lookup("MAIL_TRIAGE_DEBUG")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self { host, port, debug }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

/// Parse a port, falling back when absent or invalid.
pub fn parse_port(raw: Option<&str>, fallback: u16) -> u16 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(fallback)
}
