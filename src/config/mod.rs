use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::Duration;
use tracing::warn;

pub mod cors;

pub use cors::create_cors_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/quadpass";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            port: parse_or_default("PORT", DEFAULT_PORT),
            session_ttl: Duration::hours(parse_or_default(
                "SESSION_TTL_HOURS",
                DEFAULT_SESSION_TTL_HOURS,
            )),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default");
            default
        }),
        Err(_) => default,
    }
}
