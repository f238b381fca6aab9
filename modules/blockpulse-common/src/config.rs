use std::path::PathBuf;

use anyhow::Result;

use crate::error::IngestError;

/// Application configuration loaded from environment variables.
/// All credentials are optional: a missing search token selects synthetic
/// data, and each sink is skipped when its credentials are absent. The only
/// hard requirement is that at least one sink is configured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Sinks
    pub database_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_role: Option<String>,

    // Search
    pub twitter_bearer_token: Option<String>,

    // Query
    pub keywords: String,
    pub since_hours: i64,
    pub limit: u32,

    // Run guard
    pub min_run_interval_secs: u64,
    pub force_run: bool,
    pub cursor_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_service_role: std::env::var("SUPABASE_SERVICE_ROLE").ok(),
            twitter_bearer_token: std::env::var("TWITTER_BEARER_TOKEN").ok(),
            keywords: std::env::var("SCRAPE_KEYWORDS")
                .unwrap_or_else(|_| "blockfest OR #blockfest OR #blockfestafrica".to_string()),
            since_hours: parse_env("SCRAPE_SINCE_HOURS", 24),
            limit: parse_env("SCRAPE_LIMIT", 100),
            min_run_interval_secs: parse_env("MIN_RUN_INTERVAL_SECS", 86_400),
            force_run: std::env::var("FORCE_RUN").map(|v| v == "1").unwrap_or(false),
            cursor_path: std::env::var("LAST_RUN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".last_ingest_at")),
        };

        Ok(config)
    }

    /// True when a direct Postgres connection string is configured.
    pub fn has_pg_sink(&self) -> bool {
        self.database_url.is_some()
    }

    /// True when the HTTP upsert endpoint and its service key are both configured.
    pub fn has_rest_sink(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_role.is_some()
    }

    /// A run with no usable sink is a fatal configuration error, not a no-op.
    pub fn require_sink(&self) -> Result<(), IngestError> {
        if !self.has_pg_sink() && !self.has_rest_sink() {
            return Err(IngestError::Config(
                "no sink configured: set DATABASE_URL or SUPABASE_URL + SUPABASE_SERVICE_ROLE"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_redacted(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    // Truncate on char boundaries; a byte slice could split
                    // a multi-byte character and panic.
                    let head: String = v.chars().take(5).collect();
                    format!("{}...({} chars)", head, v.len())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  SUPABASE_URL: {}", preview(&self.supabase_url));
        tracing::info!(
            "  SUPABASE_SERVICE_ROLE: {}",
            preview(&self.supabase_service_role)
        );
        tracing::info!(
            "  TWITTER_BEARER_TOKEN: {}",
            preview(&self.twitter_bearer_token)
        );
        tracing::info!("  keywords: {}", self.keywords);
        tracing::info!(
            "  since_hours: {}, limit: {}, min_interval: {}s, force_run: {}",
            self.since_hours,
            self.limit,
            self.min_run_interval_secs,
            self.force_run
        );
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> AppConfig {
        AppConfig {
            database_url: None,
            supabase_url: None,
            supabase_service_role: None,
            twitter_bearer_token: None,
            keywords: "blockfest".to_string(),
            since_hours: 24,
            limit: 5,
            min_run_interval_secs: 3600,
            force_run: false,
            cursor_path: PathBuf::from(".last_ingest_at"),
        }
    }

    #[test]
    fn log_redacted_handles_multibyte_secrets() {
        let config = AppConfig {
            database_url: Some("pöstgrés://user@localhost/db".to_string()),
            supabase_service_role: Some("ключ-сервиса".to_string()),
            ..bare_config()
        };
        // Must not panic on char boundaries when truncating the preview.
        config.log_redacted();
    }

    #[test]
    fn no_sink_is_a_config_error() {
        let config = bare_config();
        assert!(matches!(
            config.require_sink(),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn pg_alone_satisfies_sink_requirement() {
        let config = AppConfig {
            database_url: Some("postgres://localhost/blockpulse".to_string()),
            ..bare_config()
        };
        assert!(config.require_sink().is_ok());
    }

    #[test]
    fn rest_requires_both_url_and_key() {
        let config = AppConfig {
            supabase_url: Some("https://project.supabase.co".to_string()),
            ..bare_config()
        };
        assert!(config.require_sink().is_err());

        let config = AppConfig {
            supabase_url: Some("https://project.supabase.co".to_string()),
            supabase_service_role: Some("service-key".to_string()),
            ..bare_config()
        };
        assert!(config.require_sink().is_ok());
    }
}
