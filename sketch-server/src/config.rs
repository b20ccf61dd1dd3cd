use sketch_core::{RoomCleanup, RoomConfig, SessionError};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_max_rounds: u32,
    pub default_time_per_round: u32,
    pub max_rounds_limit: u32,
    pub max_time_per_round: u32,
    pub room_grace_seconds: u64,
    pub player_grace_seconds: u64,
    pub room_idle_minutes: u64,
    pub cleanup_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
    pub words_file: Option<String>,
}

impl Config {
    /// Read settings from the environment, falling back to defaults for
    /// unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port)?,
            default_max_rounds: env_or("DEFAULT_MAX_ROUNDS", defaults.default_max_rounds)?,
            default_time_per_round: env_or(
                "DEFAULT_TIME_PER_ROUND",
                defaults.default_time_per_round,
            )?,
            max_rounds_limit: env_or("MAX_ROUNDS_LIMIT", defaults.max_rounds_limit)?,
            max_time_per_round: env_or("MAX_TIME_PER_ROUND", defaults.max_time_per_round)?,
            room_grace_seconds: env_or("ROOM_GRACE_SECONDS", defaults.room_grace_seconds)?,
            player_grace_seconds: env_or("PLAYER_GRACE_SECONDS", defaults.player_grace_seconds)?,
            room_idle_minutes: env_or("ROOM_IDLE_MINUTES", defaults.room_idle_minutes)?,
            cleanup_interval_seconds: env_or(
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            )?,
            connection_timeout_seconds: env_or(
                "CONNECTION_TIMEOUT_SECONDS",
                defaults.connection_timeout_seconds,
            )?,
            words_file: env::var("WORDS_FILE").ok().filter(|path| !path.trim().is_empty()),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(&self.host).map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn cleanup(&self) -> RoomCleanup {
        RoomCleanup::new(
            Duration::from_secs(self.room_grace_seconds),
            Duration::from_secs(self.player_grace_seconds),
            Duration::from_secs(self.room_idle_minutes * 60),
        )
    }

    /// Apply defaults and bounds to a room creation request.
    pub fn room_config(
        &self,
        host_name: &str,
        room_name: Option<String>,
        max_rounds: Option<u32>,
        time_per_round: Option<u32>,
    ) -> Result<RoomConfig, SessionError> {
        let max_rounds = max_rounds.unwrap_or(self.default_max_rounds);
        let time_per_round = time_per_round.unwrap_or(self.default_time_per_round);

        if !(1..=self.max_rounds_limit).contains(&max_rounds) {
            return Err(SessionError::InvalidConfig(format!(
                "max_rounds must be between 1 and {}",
                self.max_rounds_limit
            )));
        }
        if !(1..=self.max_time_per_round).contains(&time_per_round) {
            return Err(SessionError::InvalidConfig(format!(
                "time_per_round must be between 1 and {} seconds",
                self.max_time_per_round
            )));
        }

        let mut config = RoomConfig::new(host_name).with_rounds(max_rounds, time_per_round);
        config.room_name = room_name;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_max_rounds: 5,
            default_time_per_round: 60,
            max_rounds_limit: 20,
            max_time_per_round: 300,
            room_grace_seconds: 300,
            player_grace_seconds: 60,
            room_idle_minutes: 30,
            cleanup_interval_seconds: 30,
            connection_timeout_seconds: 300,
            words_file: None,
        }
    }
}

fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
