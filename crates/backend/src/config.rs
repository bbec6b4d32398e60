use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::num::ParseIntError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: {source}")]
    Port {
        value: String,
        source: ParseIntError,
    },
    #[error("invalid BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: AddrParseError,
    },
}

/// Server settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    pub assets_dir: PathBuf,
    pub dist_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = get("PORT").unwrap_or_else(|| "3000".to_string());
        let port: u16 = port
            .parse()
            .map_err(|source| ConfigError::Port { value: port.clone(), source })?;

        let addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let ip: IpAddr = addr
            .parse()
            .map_err(|source| ConfigError::BindAddr { value: addr.clone(), source })?;

        Ok(Config {
            bind: SocketAddr::new(ip, port),
            assets_dir: PathBuf::from(get("ASSETS_DIR").unwrap_or_else(|| "assets".to_string())),
            dist_dir: PathBuf::from(get("DIST_DIR").unwrap_or_else(|| "dist".to_string())),
        })
    }
}
