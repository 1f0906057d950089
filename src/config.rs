//! Application configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;
use tracing::warn;

use crate::errors::FleetError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS, empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Accepted `Host` header values, empty accepts any
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    /// Geoapify API key; geocoding is disabled when missing
    pub api_key: Option<String>,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_geocoding_timeout")]
    pub timeout: Duration,
    /// Only alarms younger than this are sent to the external geocoder
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_recent_window")]
    pub recent_window: Duration,
    /// Search radius in decimal degrees for reusing a known address
    #[serde(default = "default_nearby_epsilon")]
    pub nearby_epsilon: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_geocoding_url() -> String {
    "https://api.geoapify.com/v1/geocode/reverse".to_string()
}

fn default_geocoding_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_recent_window() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_nearby_epsilon() -> f64 {
    0.0001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            allowed_hosts: Vec::new(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            api_key: None,
            timeout: default_geocoding_timeout(),
            recent_window: default_recent_window(),
            nearby_epsilon: default_nearby_epsilon(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/default")
    }

    /// Load configuration from an optional file, overridden by environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FLEET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("server.allowed_hosts"),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), FleetError> {
        self.database.validate()?;
        self.geocoding.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), FleetError> {
        if self.url.trim().is_empty() {
            return Err(FleetError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(FleetError::ConfigurationError {
                message: "Database pool needs at least one connection".to_string(),
            });
        }
        Ok(())
    }
}

impl GeocodingConfig {
    pub fn validate(&self) -> Result<(), FleetError> {
        if self.timeout.is_zero() {
            return Err(FleetError::ConfigurationError {
                message: "Geocoding timeout must be greater than zero".to_string(),
            });
        }
        if !(self.nearby_epsilon >= 0.0 && self.nearby_epsilon < 1.0) {
            return Err(FleetError::ConfigurationError {
                message: format!("Nearby epsilon {} is out of range", self.nearby_epsilon),
            });
        }
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            warn!("No geocoding API key configured, reverse geocoding is disabled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn test_load_config() {
        env::set_var("FLEET__DATABASE__URL", "postgres://localhost/fleet");
        env::set_var("FLEET__SERVER__PORT", "9000");
        env::set_var("FLEET__SERVER__CORS_ORIGINS", "http://a.test,http://b.test");
        env::set_var("FLEET__GEOCODING__API_KEY", "secret");
        env::set_var("FLEET__GEOCODING__TIMEOUT", "3");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgres://localhost/fleet");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(config.geocoding.api_key.as_deref(), Some("secret"));
        assert_eq!(config.geocoding.timeout, Duration::from_secs(3));
        assert_eq!(config.geocoding.recent_window, Duration::from_secs(86400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[database]\nurl = \"postgres://db/fleet\"\nmax_connections = 3\n\n\
             [geocoding]\nnearby_epsilon = 0.0002"
        )
        .unwrap();

        let stem = path.with_extension("");
        let config = AppConfig::load_from(stem.to_str().unwrap()).unwrap();
        // Environment variables from other tests may override the URL
        assert!(!config.database.url.is_empty());
        assert_eq!(config.geocoding.nearby_epsilon, 0.0002);
    }

    #[test]
    fn test_database_config_validate() {
        let config = DatabaseConfig {
            url: "postgres://localhost/fleet".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_config_validate_empty_url() {
        let config = DatabaseConfig {
            url: " ".to_string(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_geocoding_config_validate_zero_timeout() {
        let config = GeocodingConfig {
            timeout: Duration::ZERO,
            ..GeocodingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
