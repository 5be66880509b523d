use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_path: PathBuf,
    /// Scheme + host used when building absolute URLs for uploaded media.
    pub public_base_url: String,
    pub media_root: PathBuf,
    /// URL prefix media files are served under; always ends with `/`.
    pub media_url: String,
    pub max_upload_bytes: usize,
    /// Shared secret expected in `X-Bot-Token`. `None` rejects all bot calls.
    pub bot_secret: Option<String>,
    pub cart_ttl_days: u32,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("database_url", &"[redacted]")
            .field("public_base_url", &self.public_base_url)
            .field("media_root", &self.media_root)
            .field("media_url", &self.media_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("bot_secret", &self.bot_secret.as_ref().map(|_| "[redacted]"))
            .field("cart_ttl_days", &self.cart_ttl_days)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
