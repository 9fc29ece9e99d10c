//! Application-level configuration loading: cache policy, admin limits and league defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::CacheConfig;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PITCHSIDE_CONFIG_PATH";
/// Environment variable holding the admin promotion code.
const PROMOTION_CODE_ENV: &str = "ADMIN_PROMOTION_CODE";
/// Environment variable selecting the storage backend.
const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

const DEFAULT_STALE_AFTER_MS: u64 = 30_000;
const DEFAULT_RETRY_DELAY_MS: u64 = 250;
const DEFAULT_MAX_ADMINS: usize = 3;
const DEFAULT_LEAGUE_NAME: &str = "Soccer League";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Freshness and retry policy of the read cache.
    pub cache: CacheConfig,
    /// Maximum number of admin accounts the promotion flow allows.
    pub max_admins: usize,
    /// League name shown until a settings document exists.
    pub default_league_name: String,
    /// Secret code users must present to become admin. `None` disables promotion.
    pub promotion_code: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk and environment, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        let mut config: Self = raw.into();
        config.promotion_code = env::var(PROMOTION_CODE_ENV)
            .ok()
            .filter(|code| !code.is_empty());
        if config.promotion_code.is_none() {
            warn!("{PROMOTION_CODE_ENV} not set; admin promotion is disabled");
        }
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    cache: RawCache,
    admin: RawAdmin,
    league: RawLeague,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawCache {
    stale_after_ms: u64,
    retry_on_error: bool,
    retry_delay_ms: u64,
}

impl Default for RawCache {
    fn default() -> Self {
        Self {
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            retry_on_error: true,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawAdmin {
    max_admins: usize,
}

impl Default for RawAdmin {
    fn default() -> Self {
        Self {
            max_admins: DEFAULT_MAX_ADMINS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLeague {
    default_name: String,
}

impl Default for RawLeague {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_LEAGUE_NAME.to_owned(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            cache: CacheConfig {
                stale_after: Duration::from_millis(value.cache.stale_after_ms),
                retry_on_error: value.cache.retry_on_error,
                retry_delay: Duration::from_millis(value.cache.retry_delay_ms),
            },
            max_admins: value.admin.max_admins,
            default_league_name: value.league.default_name,
            promotion_code: None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Storage backend selected through `STORE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB, configured by `MONGO_URI` and `MONGO_DB`.
    #[cfg(feature = "mongo-store")]
    Mongo,
    /// CouchDB, configured by `COUCH_BASE_URL` and `COUCH_DB`.
    #[cfg(feature = "couch-store")]
    Couch,
    /// Process-local store, empty at startup.
    Memory,
}

/// `STORE_BACKEND` names a backend this binary does not support.
#[derive(Debug, Error)]
#[error("unsupported STORE_BACKEND `{0}`")]
pub struct UnknownBackend(String);

impl StoreBackend {
    /// Read `STORE_BACKEND`, defaulting to the first compiled-in remote backend.
    pub fn from_env() -> Result<Self, UnknownBackend> {
        match env::var(STORE_BACKEND_ENV) {
            Ok(name) => Self::parse(&name),
            Err(_) => Ok(Self::default_backend()),
        }
    }

    fn parse(name: &str) -> Result<Self, UnknownBackend> {
        match name.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(Self::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(Self::Couch),
            "memory" => Ok(Self::Memory),
            _ => Err(UnknownBackend(name.to_owned())),
        }
    }

    #[allow(unreachable_code)]
    fn default_backend() -> Self {
        #[cfg(feature = "mongo-store")]
        return Self::Mongo;
        #[cfg(feature = "couch-store")]
        return Self::Couch;
        Self::Memory
    }
}
