use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{config_error, Error};

pub const DEFAULT_OPENROUTE_API_BASE: &str = "https://api.openrouteservice.org";
pub const DEFAULT_PROFILE: &str = "driving-car";

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub markers_dir: PathBuf,
    pub openroute_api_base: String,
    pub openroute_api_key: String,
    pub profile: String,
    pub route_timeout: Duration,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Ok(Self {
            listen_addr: parsed("LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            database_url: optional("DATABASE_URL"),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            markers_dir: optional("MARKERS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            openroute_api_base: optional("OPENROUTE_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPENROUTE_API_BASE.into()),
            openroute_api_key: env::var("OPENROUTE_API_KEY")?,
            profile: optional("DIRECTIONS_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.into()),
            route_timeout: Duration::from_secs(parsed("ROUTE_TIMEOUT_SECS", 10)?),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| config_error(format!("invalid value for {}", key))),
        None => Ok(default),
    }
}

#[test]
fn parsed_falls_back_and_rejects_garbage() {
    env::remove_var("LIGHTNAV_TEST_UNSET");
    assert_eq!(parsed("LIGHTNAV_TEST_UNSET", 7u64).unwrap(), 7);

    env::set_var("LIGHTNAV_TEST_TIMEOUT", " 25 ");
    assert_eq!(parsed("LIGHTNAV_TEST_TIMEOUT", 10u64).unwrap(), 25);

    env::set_var("LIGHTNAV_TEST_BAD", "soon");
    let err = parsed("LIGHTNAV_TEST_BAD", 10u64).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Config);

    env::set_var("LIGHTNAV_TEST_BLANK", "  ");
    assert!(optional("LIGHTNAV_TEST_BLANK").is_none());
}
