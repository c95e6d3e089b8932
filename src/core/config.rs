use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// StoreSearchConfig: file-based config loader (store-search.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "STORE_SEARCH_CONFIG";
pub const ENV_ENDPOINT: &str = "STORE_SEARCH_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "STORE_SEARCH_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "STORE_SEARCH_CONNECT_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "STORE_SEARCH_USER_AGENT";

pub const DEFAULT_ENDPOINT: &str = "https://itunes.apple.com/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Top-level config loaded from `store-search.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct StoreSearchConfig {
    /// Catalog search endpoint, without query string.
    pub endpoint: Option<String>,
    /// Whole-request timeout. `0` disables it.
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|v| v.parse().ok())
}

impl StoreSearchConfig {
    /// Endpoint: JSON field → `STORE_SEARCH_ENDPOINT` → iTunes search.
    pub fn resolve_endpoint(&self) -> String {
        if let Some(e) = &self.endpoint {
            if !e.trim().is_empty() {
                return e.trim().to_string();
            }
        }
        env_string(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Request timeout: JSON field → `STORE_SEARCH_TIMEOUT_SECS` → 30s.
    /// Returns `None` when configured as `0`.
    pub fn resolve_timeout(&self) -> Option<Duration> {
        let secs = self
            .timeout_secs
            .or_else(|| env_u64(ENV_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    /// Connect timeout: JSON field → `STORE_SEARCH_CONNECT_TIMEOUT_SECS` → 10s.
    pub fn resolve_connect_timeout(&self) -> Duration {
        let secs = self
            .connect_timeout_secs
            .or_else(|| env_u64(ENV_CONNECT_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// User agent: JSON field → `STORE_SEARCH_USER_AGENT` → `store-search/<version>`.
    pub fn resolve_user_agent(&self) -> String {
        if let Some(ua) = &self.user_agent {
            if !ua.trim().is_empty() {
                return ua.clone();
            }
        }
        env_string(ENV_USER_AGENT)
            .unwrap_or_else(|| format!("store-search/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Resolved settings for a [`crate::search::SearchSession`].
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let raw = self.resolve_endpoint();
        let endpoint = url::Url::parse(&raw)
            .map_err(|e| anyhow::anyhow!("invalid catalog endpoint '{}': {}", raw, e))?;
        Ok(SessionConfig {
            endpoint,
            request_timeout: self.resolve_timeout(),
        })
    }
}

/// Typed settings the session consumes. Never read from the environment directly.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub endpoint: url::Url,
    pub request_timeout: Option<Duration>,
}

/// Load `store-search.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `STORE_SEARCH_CONFIG` env var path
/// 2. `./store-search.json`
/// 3. `~/.store-search/store-search.json`
///
/// Missing file → `StoreSearchConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `StoreSearchConfig::default()`.
pub fn load_config() -> StoreSearchConfig {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from("store-search.json")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".store-search").join("store-search.json"));
    }
    if let Some(env_path) = env_string(ENV_CONFIG_PATH) {
        candidates.insert(0, PathBuf::from(env_path));
    }

    for path in &candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match serde_json::from_str::<StoreSearchConfig>(&contents) {
            Ok(cfg) => {
                tracing::info!("store-search.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "store-search.json parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                StoreSearchConfig::default()
            }
        };
    }

    StoreSearchConfig::default()
}
