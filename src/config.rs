use crate::hls::rewriter::DEFAULT_ENTRY_PATH;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub is_dev: bool,
    /// Path of the proxy route; also the prefix of every proxied URL
    pub proxy_path: String,
    /// Refuse targets that are private/reserved IP literals or non-HTTP(S)
    pub block_private_targets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            is_dev: true,
            proxy_path: DEFAULT_ENTRY_PATH.to_string(),
            block_private_targets: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// In DEV mode PORT defaults to 3000; in PROD mode it is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let proxy_path = env::var("PROXY_PATH").unwrap_or_else(|_| DEFAULT_ENTRY_PATH.to_string());
        if !proxy_path.starts_with('/') || proxy_path.len() < 2 {
            return Err(format!("PROXY_PATH must start with '/' and name a route: {proxy_path}").into());
        }

        let block_private_targets = match env::var("BLOCK_PRIVATE_TARGETS") {
            Ok(value) => value
                .parse::<bool>()
                .map_err(|_| format!("BLOCK_PRIVATE_TARGETS must be true or false: {value}"))?,
            Err(_) => false,
        };

        Ok(Config {
            host,
            port,
            is_dev,
            proxy_path,
            block_private_targets,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
