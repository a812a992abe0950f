use crate::error::AppError;
use crate::grouping::BaseNameRule;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub api_key: String,
    pub recursive: bool,
    pub copy_metadata: bool,
    pub dry_run: bool,
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub retry_mutations: bool,
    pub raw_extensions: HashSet<String>,
    pub base_name_rule: BaseNameRule,
    pub log_level: String,
}

/// Values given on the command line. They take precedence over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub recursive: bool,
    pub copy_metadata: bool,
    pub dry_run: bool,
}

impl AppConfig {
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("host", "")?
            .set_default("api_key", "")?
            .set_default("recursive", false)?
            .set_default("copy_metadata", false)?
            .set_default("dry_run", false)?
            .set_default("max_concurrency", 5)?
            .set_default("max_retries", 3)?
            .set_default("retry_base_delay_ms", 100)?
            .set_default("request_timeout_secs", 30)?
            .set_default("retry_mutations", true)?
            .set_default("raw_extensions", vec![".cr2", ".cr3", ".dng"])?
            .set_default("base_name_rule", "letters")?
            .set_default("log_level", "warn")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Env values stay strings; typed fields are converted on deserialize.
            .add_source(Environment::with_prefix("IMMICH"));

        if let Some(host) = overrides.host {
            builder = builder.set_override("host", host)?;
        }
        if let Some(api_key) = overrides.api_key {
            builder = builder.set_override("api_key", api_key)?;
        }
        if overrides.recursive {
            builder = builder.set_override("recursive", true)?;
        }
        if overrides.copy_metadata {
            builder = builder.set_override("copy_metadata", true)?;
        }
        if overrides.dry_run {
            builder = builder.set_override("dry_run", true)?;
        }

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.raw_extensions = normalize_extensions(&config.raw_extensions);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.host.trim().is_empty() {
            return Err(AppError::Config(ConfigError::Message(
                "host is required (--host or IMMICH_HOST)".into(),
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config(ConfigError::Message(
                "api key is required (--api-key or IMMICH_API_KEY)".into(),
            )));
        }
        if self.max_concurrency == 0 {
            return Err(AppError::Config(ConfigError::Message(
                "max_concurrency must be at least 1".into(),
            )));
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Lowercases entries and makes sure each one starts with a dot.
pub fn normalize_extensions(extensions: &HashSet<String>) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty() && e != ".")
        .map(|e| if e.starts_with('.') { e } else { format!(".{}", e) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            host: "http://immich.local:2283".into(),
            api_key: "secret".into(),
            recursive: false,
            copy_metadata: false,
            dry_run: false,
            max_concurrency: 5,
            max_retries: 3,
            retry_base_delay_ms: 100,
            request_timeout_secs: 30,
            retry_mutations: true,
            raw_extensions: [".cr2".to_string()].into_iter().collect(),
            base_name_rule: BaseNameRule::Letters,
            log_level: "warn".into(),
        }
    }

    #[test]
    fn extensions_are_normalized() {
        let raw: HashSet<String> = ["CR2", ".Dng", " .cr3 ", ""]
            .into_iter()
            .map(String::from)
            .collect();
        let normalized = normalize_extensions(&raw);
        assert_eq!(normalized.len(), 3);
        assert!(normalized.contains(".cr2"));
        assert!(normalized.contains(".dng"));
        assert!(normalized.contains(".cr3"));
    }

    #[test]
    fn validate_requires_credentials_and_concurrency() {
        assert!(sample().validate().is_ok());

        let mut missing_host = sample();
        missing_host.host = " ".into();
        assert!(matches!(missing_host.validate(), Err(AppError::Config(_))));

        let mut missing_key = sample();
        missing_key.api_key = String::new();
        assert!(missing_key.validate().is_err());

        let mut no_permits = sample();
        no_permits.max_concurrency = 0;
        assert!(no_permits.validate().is_err());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = AppConfig::load(Overrides {
            host: Some("http://override:2283".into()),
            api_key: Some("k".into()),
            recursive: true,
            copy_metadata: false,
            dry_run: true,
        })
        .unwrap();
        assert_eq!(config.host, "http://override:2283");
        assert_eq!(config.api_key, "k");
        assert!(config.recursive);
        assert!(config.dry_run);
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.max_retries, 3);
        assert!(config.raw_extensions.contains(".dng"));
        assert_eq!(config.retry_base_delay(), Duration::from_millis(100));
    }

    #[test]
    fn numeric_looking_env_strings_are_kept_verbatim() {
        std::env::set_var("IMMICH_API_KEY", "00123");
        std::env::set_var("IMMICH_RETRY_MUTATIONS", "false");
        let loaded = AppConfig::load(Overrides::default());
        std::env::remove_var("IMMICH_API_KEY");
        std::env::remove_var("IMMICH_RETRY_MUTATIONS");

        let config = loaded.unwrap();
        assert_eq!(config.api_key, "00123");
        assert!(!config.retry_mutations);
    }
}
