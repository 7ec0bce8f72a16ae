//! Application configuration management.

use std::fmt;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Which document host backs the relay.
    #[serde(default)]
    pub host: HostConfig,
    /// Telegram Bot API credentials. Required when `host.backend` is `telegram`.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    /// Mapping store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public origin used when building download links, e.g. `https://files.example.com`.
    ///
    /// When unset the origin is derived from the request's `Host` header.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Upper bound on a whole upload request body.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_request_bytes() -> usize {
    256 * 1024 * 1024
}

/// Document host selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostBackend {
    /// Telegram Bot API.
    #[default]
    Telegram,
    /// In-process host (development only).
    Memory,
}

/// Host configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: HostBackend,
}

/// Telegram Bot API configuration.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// Chat or channel every document is sent to.
    pub chat_id: String,
    /// Bot API base URL.
    #[serde(default = "default_telegram_api_base_url")]
    pub api_base_url: String,
    /// Timeout for a single outbound request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_telegram_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

/// Mapping store selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process cache; mappings are lost on restart.
    #[default]
    Memory,
    /// Cloudflare Workers KV over its REST API.
    Cloudflare,
}

/// Mapping store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Lifetime of an in-memory mapping. `None` keeps entries until evicted.
    #[serde(default)]
    pub memory_ttl_secs: Option<u64>,
    /// Capacity of the in-memory store.
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: u64,
    /// Cloudflare KV settings. Required when `backend` is `cloudflare`.
    #[serde(default)]
    pub cloudflare: Option<CloudflareKvConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            memory_ttl_secs: None,
            memory_max_entries: default_memory_max_entries(),
            cloudflare: None,
        }
    }
}

fn default_memory_max_entries() -> u64 {
    100_000
}

/// Cloudflare Workers KV configuration.
#[derive(Clone, Deserialize)]
pub struct CloudflareKvConfig {
    /// Account owning the namespace.
    pub account_id: String,
    /// KV namespace holding the mappings.
    pub namespace_id: String,
    /// API token with `Workers KV Storage: Edit` permission.
    pub api_token: String,
    /// REST API base URL.
    #[serde(default = "default_cloudflare_api_base_url")]
    pub api_base_url: String,
    /// Expiry applied to every written key.
    #[serde(default)]
    pub expiration_ttl_secs: Option<u64>,
    /// Timeout for a single outbound request.
    #[serde(default = "default_kv_request_timeout")]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for CloudflareKvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareKvConfig")
            .field("account_id", &self.account_id)
            .field("namespace_id", &self.namespace_id)
            .field("api_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("expiration_ttl_secs", &self.expiration_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_cloudflare_api_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_kv_request_timeout() -> u64 {
    30
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Per-file ceiling in bytes (the Bot API's own limit).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// How many identifiers to try before giving up on a collision.
    #[serde(default = "default_id_attempts")]
    pub id_attempts: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            id_attempts: default_id_attempts(),
        }
    }
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50 MiB
}

fn default_id_attempts() -> u32 {
    5
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of the human readable format.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or a backend is
    /// selected without its settings.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FILERELAY").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-section requirements serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns a message naming the missing section.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.host.backend == HostBackend::Telegram && self.telegram.is_none() {
            return Err(config::ConfigError::Message(
                "host.backend is `telegram` but no [telegram] section is configured".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Cloudflare && self.store.cloudflare.is_none() {
            return Err(config::ConfigError::Message(
                "store.backend is `cloudflare` but no [store.cloudflare] section is configured"
                    .to_string(),
            ));
        }
        if self.upload.id_attempts == 0 {
            return Err(config::ConfigError::Message(
                "upload.id_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
