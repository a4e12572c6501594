//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `plugsched.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use plugsched_adapter_virtual::VirtualPlug;
use plugsched_app::actuator::RetryPolicy;
use plugsched_app::resolver::ResolverConfig;
use plugsched_app::schedule_engine::EngineConfig;
use plugsched_domain::time::TimeOfDay;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Trigger timing and override settings.
    pub schedule: ScheduleConfig,
    /// Plug command settings.
    pub actuator: ActuatorConfig,
    /// External oracle endpoints.
    pub oracles: OraclesConfig,
    /// Simulated plug inventory.
    pub plugs: Vec<VirtualPlug>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of the daily rebuild.
    pub rebuild_at: TimeOfDay,
    /// Minutes subtracted from sunrise/sunset.
    pub lead_minutes: u32,
    pub sunset_floor: TimeOfDay,
    pub sunset_ceiling: TimeOfDay,
    pub sunrise_floor: Option<TimeOfDay>,
    pub sunrise_ceiling: Option<TimeOfDay>,
    /// Rooms whose switch-on schedules always consult the occupancy oracle.
    pub gated_rooms: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub discovery_window_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OraclesConfig {
    /// Base URL serving `/sunrise` and `/sunset`; solar overrides fall back
    /// to the literal time when unset.
    pub solar_url: Option<String>,
    /// Occupancy endpoint; gated schedules are suppressed when unset.
    pub occupancy_url: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from `plugsched.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("plugsched.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("PLUGSCHED_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("PLUGSCHED_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("PLUGSCHED_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("PLUGSCHED_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("PLUGSCHED_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("PLUGSCHED_SOLAR_URL") {
            self.oracles.solar_url = Some(val);
        }
        if let Some(val) = var("PLUGSCHED_OCCUPANCY_URL") {
            self.oracles.occupancy_url = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.actuator.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "actuator.max_attempts must be at least 1".to_string(),
            ));
        }
        self.resolver_config()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Resolver settings from the `[schedule]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when a clamp window is inverted or
    /// only one sunrise bound is set.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
        let schedule = &self.schedule;
        let sunrise = match (schedule.sunrise_floor, schedule.sunrise_ceiling) {
            (Some(floor), Some(ceiling)) => Some((floor, ceiling)),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Validation(
                    "sunrise_floor and sunrise_ceiling must be set together".to_string(),
                ));
            }
        };
        ResolverConfig::new(
            schedule.lead_minutes,
            (schedule.sunset_floor, schedule.sunset_ceiling),
            sunrise,
            schedule.gated_rooms.clone(),
        )
        .map_err(|err| ConfigError::Validation(err.to_string()))
    }

    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            rebuild_at: self.schedule.rebuild_at,
        }
    }
}

impl ActuatorConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }

    #[must_use]
    pub fn discovery_window(&self) -> Duration {
        Duration::from_secs(self.discovery_window_secs)
    }
}

impl OraclesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:plugsched.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "plugschedd=info,plugsched=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let resolver = ResolverConfig::default();
        Self {
            rebuild_at: EngineConfig::default().rebuild_at,
            lead_minutes: resolver.lead_minutes,
            sunset_floor: resolver.sunset_window.floor(),
            sunset_ceiling: resolver.sunset_window.ceiling(),
            sunrise_floor: None,
            sunrise_ceiling: None,
            gated_rooms: Vec::new(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts,
            retry_delay_secs: retry.delay.as_secs(),
            discovery_window_secs: 15,
        }
    }
}

impl Default for OraclesConfig {
    fn default() -> Self {
        Self {
            solar_url: None,
            occupancy_url: None,
            timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn time(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:plugsched.db?mode=rwc");
        assert_eq!(config.schedule.rebuild_at, time("03:05"));
        assert_eq!(config.schedule.lead_minutes, 30);
        assert_eq!(config.schedule.sunset_floor, time("17:00"));
        assert_eq!(config.schedule.sunset_ceiling, time("20:00"));
        assert_eq!(config.actuator.max_attempts, 5);
        assert_eq!(config.actuator.retry_delay_secs, 60);
        assert_eq!(config.actuator.discovery_window_secs, 15);
        assert!(config.oracles.solar_url.is_none());
        assert!(config.plugs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [schedule]
            rebuild_at = '04:10'
            sunset_floor = '18:00'
            sunrise_floor = '06:00'
            sunrise_ceiling = '08:00'
            gated_rooms = ['kids']

            [actuator]
            max_attempts = 3
            retry_delay_secs = 5

            [oracles]
            solar_url = 'http://weather.local'
            timeout_secs = 2

            [[plugs]]
            device_id = '8006ABCD'
            address = '10.0.0.5'
            alias = 'Tree'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.database_url(), "sqlite:test.db");
        assert_eq!(config.engine_config().rebuild_at, time("04:10"));
        assert_eq!(config.schedule.sunset_ceiling, time("20:00"));
        assert_eq!(config.actuator.retry_policy().max_attempts, 3);
        assert_eq!(config.oracles.timeout(), Duration::from_secs(2));
        assert_eq!(config.plugs.len(), 1);
        assert!(config.plugs[0].reachable);

        let resolver = config.resolver_config().unwrap();
        assert_eq!(resolver.sunset_window.floor(), time("18:00"));
        assert!(resolver.sunrise_window.is_some());
        assert_eq!(resolver.gated_rooms, ["kids"]);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_when_time_is_malformed() {
        let result: Result<Config, _> = toml::from_str("[schedule]\nrebuild_at = 'late'");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_attempts() {
        let mut config = Config::default();
        config.actuator.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_inverted_sunset_window() {
        let mut config = Config::default();
        config.schedule.sunset_floor = time("21:00");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_half_configured_sunrise_window() {
        let mut config = Config::default();
        config.schedule.sunrise_floor = Some(time("06:00"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PLUGSCHED_BIND", "127.0.0.1:8088"),
            ("PLUGSCHED_DATABASE_URL", "sqlite::memory:"),
            ("PLUGSCHED_LOG", "warn"),
            ("RUST_LOG", "trace"),
            ("PLUGSCHED_SOLAR_URL", "http://sun.local"),
        ]);
        let mut config = Config::default();

        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.bind_addr(), "127.0.0.1:8088");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.oracles.solar_url.as_deref(), Some("http://sun.local"));
        assert!(config.oracles.occupancy_url.is_none());
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| (key == "PLUGSCHED_PORT").then(|| "http".to_string()));
        assert_eq!(config.server.port, 3000);
    }
}
