use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Connection settings for the external REST backend that owns all the
/// real debt-sheet data. Nearly every route is parameterized by `base_url`
/// and the fixed `user_id`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.upstream.normalize_from_env();
        self.upstream.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            _ => {}
        }
        Ok(())
    }
}

impl UpstreamConfig {
    /// Fill missing values from the environment so deployments can skip the
    /// TOML file entirely.
    pub fn normalize_from_env(&mut self) {
        if self.base_url.trim().is_empty() {
            if let Ok(url) = std::env::var("UPSTREAM_BASE_URL") {
                self.base_url = url;
            }
        }
        if self.user_id.trim().is_empty() {
            if let Ok(id) = std::env::var("UPSTREAM_USER_ID") {
                self.user_id = id;
            }
        }
        if let Ok(secs) = std::env::var("UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.timeout_secs = secs;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(anyhow!(
                "upstream.base_url is empty; set it in config.toml or via UPSTREAM_BASE_URL"
            ));
        }
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("upstream.base_url must start with http:// or https://"));
        }
        if self.user_id.trim().is_empty() {
            return Err(anyhow!(
                "upstream.user_id is empty; set it in config.toml or via UPSTREAM_USER_ID"
            ));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("upstream.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}
