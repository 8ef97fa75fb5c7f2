use anyhow::Result;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub auth: AuthConfig,
    pub proxy: ProxyConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used when minting absolute stream URLs
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared by all token purposes
    pub token_secret: String,
    pub stream_token_ttl_minutes: i64,
    pub session_token_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Connect timeout towards upstream video origins, in seconds
    pub upstream_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Cadence of live metrics frames on the SSE feed, in seconds
    pub live_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./vod-gateway.db".to_string(),
                max_connections: Some(10),
            },
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                base_url: "http://localhost:4000".to_string(),
            },
            auth: AuthConfig {
                token_secret: "dev_secret_change_me".to_string(),
                stream_token_ttl_minutes: 10,
                session_token_ttl_days: 7,
            },
            proxy: ProxyConfig {
                upstream_timeout_seconds: 15,
            },
            metrics: MetricsConfig {
                live_interval_seconds: 5,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        let config: Config = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_file, contents)?;
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.web.base_url)
            .map_err(|e| anyhow::anyhow!("invalid web.base_url '{}': {}", self.web.base_url, e))?;
        if self.auth.token_secret.len() < 10 {
            anyhow::bail!("auth.token_secret must be at least 10 characters");
        }
        if self.auth.stream_token_ttl_minutes < 1 {
            anyhow::bail!("auth.stream_token_ttl_minutes must be at least 1");
        }
        if self.metrics.live_interval_seconds < 1 {
            anyhow::bail!("metrics.live_interval_seconds must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_short_token_secret() {
        let mut config = Config::default();
        config.auth.token_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let mut config = Config::default();
        config.web.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
