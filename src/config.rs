// This file contains the runtime configuration: the command line arguments
// and the environment variables read at startup.

use std::env;
use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

#[derive(Debug, Parser)]
#[clap(
    name = "openapi-hub",
    about = "Catalog OpenAPI specs and serve consolidated per-version documentation",
    version
)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[clap(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Enable debug logging for the hub
    #[clap(long)]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("invalid value '{1}' for {0}")]
    InvalidVariable(&'static str, String),
}

/// Resolved server configuration. Flags win over environment variables,
/// which win over the defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket the HTTP server listens on (`--bind` / `HUB_BIND`).
    pub bind: SocketAddr,
    /// URL of the external login gateway (`HUB_LOGIN_GATEWAY_URL`). When
    /// unset the login guard on `/api` is disabled.
    pub login_gateway_url: Option<String>,
    /// Lifetime of a login session in days (`HUB_SESSION_TTL_DAYS`).
    pub session_ttl_days: i64,
}

impl Config {
    pub fn load(args: &Args) -> Result<Config, ConfigError> {
        let bind_raw = args
            .bind
            .clone()
            .or_else(|| env::var("HUB_BIND").ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        let login_gateway_url = env::var("HUB_LOGIN_GATEWAY_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let session_ttl_days = match env::var("HUB_SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidVariable("HUB_SESSION_TTL_DAYS", raw.clone()))?,
            Err(_) => DEFAULT_SESSION_TTL_DAYS,
        };

        Ok(Config {
            bind,
            login_gateway_url,
            session_ttl_days,
        })
    }
}
