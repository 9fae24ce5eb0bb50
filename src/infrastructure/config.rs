use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub run_migrations: bool,
    pub server_host: String,
    pub server_port: u16,
    /// Header carrying the account id set by the authenticating gateway.
    pub account_header: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("BIOLINK").try_parsing(true))
            .set_default("store_backend", "memory")?
            .set_default("run_migrations", true)?
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8080)?
            .set_default("account_header", "x-account-id")?
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_backend == StoreBackend::Postgres
            && self.database_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "database_url is required when store_backend is postgres".to_string(),
            ));
        }
        if self.account_header.trim().is_empty() {
            return Err(ConfigError::Message("account_header must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            database_url: None,
            run_migrations: true,
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            account_header: "x-account-id".to_string(),
        }
    }

    #[test]
    fn memory_backend_needs_no_database() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let cfg = AppConfig {
            store_backend: StoreBackend::Postgres,
            ..base()
        };
        assert!(cfg.validate().is_err());

        let cfg = AppConfig {
            store_backend: StoreBackend::Postgres,
            database_url: Some("postgres://localhost/biolink".to_string()),
            ..base()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_account_header_is_rejected() {
        let cfg = AppConfig {
            account_header: "  ".to_string(),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }
}
