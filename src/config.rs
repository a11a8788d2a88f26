use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Placeholder signing secret shipped in the default config.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub rate_limit: RateLimitConfig,

    pub bootstrap: BootstrapConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 0)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/catalog.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret used to sign access tokens. Must be non-empty.
    pub jwt_secret: String,

    /// Access token lifetime in hours (default: 24)
    pub jwt_expiry_hours: i64,

    /// Header carrying an API key when no bearer token is presented.
    pub api_key_header: String,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiry_hours: 24,
            api_key_header: "X-API-Key".to_string(),
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

/// A fixed-window request budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_requests: u32,

    pub window_seconds: u64,
}

impl RatePolicy {
    #[must_use]
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window_seconds: 60,
        }
    }

    #[must_use]
    pub const fn per_hour(max_requests: u32) -> Self {
        Self {
            max_requests,
            window_seconds: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Budget shared by every `/api` route.
    pub default: RatePolicy,

    pub register: RatePolicy,

    pub login: RatePolicy,

    /// Trusted proxy IP addresses allowed to provide forwarded client IP headers.
    ///
    /// When empty, forwarded headers are ignored and the socket peer address is used.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default: RatePolicy::per_hour(1000),
            register: RatePolicy::per_hour(5),
            login: RatePolicy::per_minute(10),
            trusted_proxy_ips: Vec::new(),
        }
    }
}

/// Optional admin account created on startup when no admin exists yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: String,

    pub admin_email: String,

    /// Leave unset to skip the bootstrap.
    pub admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "catalog-api".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Environment variables win over file values. `.env` is read by the caller.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("catalog-api").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".catalog-api").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// True while tokens are signed with the well-known placeholder secret.
    #[must_use]
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.security.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.is_empty() {
            anyhow::bail!("security.jwt_secret cannot be empty");
        }

        if self.uses_default_jwt_secret() {
            warn!(
                "security.jwt_secret is the built-in default; tokens can be forged until JWT_SECRET is set"
            );
        }

        if self.security.jwt_expiry_hours <= 0 {
            anyhow::bail!("security.jwt_expiry_hours must be > 0");
        }

        if self.rate_limit.enabled {
            for (name, policy) in [
                ("default", self.rate_limit.default),
                ("register", self.rate_limit.register),
                ("login", self.rate_limit.login),
            ] {
                if policy.window_seconds == 0 || policy.max_requests == 0 {
                    anyhow::bail!("rate_limit.{name} must have a non-zero budget and window");
                }
            }
        }

        Ok(())
    }
}
