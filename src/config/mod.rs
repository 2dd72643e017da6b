//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::tuning::ArenaTuning;
use crate::util::rate_limit::INPUT_RATE_LIMIT;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    pub arena_width: f64,
    pub arena_height: f64,
    /// Delay before a defeated boss is replaced
    pub boss_respawn_ms: u64,
    /// Fixed seed for spawn jitter, random when unset
    pub arena_seed: Option<u64>,

    /// Directory of client assets to serve, if any
    pub static_dir: Option<PathBuf>,
    /// Allowed client origins for CORS (comma-separated), any origin when unset
    pub client_origin: Option<String>,
    /// Key messages accepted per observer per second
    pub input_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let arena_width = parse_or("ARENA_WIDTH", 800.0)?;
        let arena_height = parse_or("ARENA_HEIGHT", 600.0)?;
        let usable = |side: f64| side.is_finite() && side > 0.0;
        if !(usable(arena_width) && usable(arena_height)) {
            return Err(ConfigError::Invalid("ARENA_WIDTH/ARENA_HEIGHT"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            arena_width,
            arena_height,
            boss_respawn_ms: parse_or("BOSS_RESPAWN_MS", 5000)?,
            arena_seed: parse_opt("ARENA_SEED")?,

            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
            client_origin: env::var("CLIENT_ORIGIN").ok(),
            input_rate_limit: parse_or("INPUT_RATE_LIMIT", INPUT_RATE_LIMIT)?,
        })
    }

    /// Physical constants for a board of the configured size
    pub fn tuning(&self) -> ArenaTuning {
        ArenaTuning::with_board(self.arena_width, self.arena_height)
    }
}

fn parse_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(name)?.unwrap_or(default))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
