//! Settings storage for the Varnish cache integration
//!
//! The settings document is a pretty-printed JSON file shared with the
//! front-end caching path, so field names follow that file's conventions.
//! Loading never fails: a missing, unreadable, or corrupt document yields
//! defaults, and individual fields with the wrong type fall back to their
//! own default.

use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::schedule::Frequency;

/// Default advisory cache lifetime in seconds
pub const DEFAULT_CACHE_LIFETIME: u64 = 3600;

const SETTINGS_DIR: &str = ".varnish-cache";
const SETTINGS_FILE: &str = "settings.json";

/// Persisted cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Suppresses purging (and front-end caching) while developing
    #[serde(rename = "cache_devmode", default, deserialize_with = "lenient")]
    pub dev_mode: bool,

    /// Master switch; automatic purges are no-ops when false
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: bool,

    /// `host[:port]` of the cache server, empty when unconfigured
    #[serde(default, deserialize_with = "lenient")]
    pub server: String,

    /// Advisory TTL consumed by the cache server
    #[serde(
        rename = "cacheLifetime",
        default = "default_cache_lifetime",
        deserialize_with = "lenient_lifetime"
    )]
    pub cache_lifetime: u64,

    /// Namespace prefix for cache tags
    #[serde(rename = "cacheTagPrefix", default, deserialize_with = "lenient")]
    pub tag_prefix: String,

    /// Query parameters that disable caching when present
    #[serde(rename = "excludedParams", default, deserialize_with = "lenient_list")]
    pub excluded_params: Vec<String>,

    /// URL patterns exempt from caching
    #[serde(default, deserialize_with = "lenient_list")]
    pub excludes: Vec<String>,

    /// Base URL of the site, used when no request host is available
    #[serde(rename = "siteUrl", default, deserialize_with = "lenient")]
    pub site_url: String,

    /// Whether the recurring purge task should be armed
    #[serde(rename = "autoPurge", default, deserialize_with = "lenient")]
    pub auto_purge: bool,

    /// How often the recurring purge task runs
    #[serde(rename = "autoPurgeFrequency", default, deserialize_with = "lenient")]
    pub auto_purge_frequency: Frequency,

    /// Keys written by other consumers of the settings file
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_cache_lifetime() -> u64 {
    DEFAULT_CACHE_LIFETIME
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            enabled: false,
            server: String::new(),
            cache_lifetime: DEFAULT_CACHE_LIFETIME,
            tag_prefix: String::new(),
            excluded_params: Vec::new(),
            excludes: Vec::new(),
            site_url: String::new(),
            auto_purge: false,
            auto_purge_frequency: Frequency::default(),
            extra: Map::new(),
        }
    }
}

/// Deserialize a field, falling back to its type's default on a type mismatch.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Lifetimes were historically written as strings, so accept both.
fn lenient_lifetime<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let lifetime = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(lifetime.unwrap_or(DEFAULT_CACHE_LIFETIME))
}

/// Accept a JSON array of strings, or an object keyed by index (what a sparse
/// list serializes to). Non-string entries are dropped.
fn lenient_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Trim entries, drop empty ones, and remove duplicates keeping the first.
fn normalize_list(items: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        let trimmed = item.trim();
        if !trimmed.is_empty() && !seen.iter().any(|s: &String| s == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}

impl CacheConfig {
    /// Return a copy with the server address and lists normalized
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();

        let server = config.server.trim();
        let server = server.strip_prefix("http://").unwrap_or(server);
        config.server = server.trim_end_matches('/').to_string();

        config.tag_prefix = config.tag_prefix.trim().to_string();
        config.site_url = config.site_url.trim().to_string();
        config.excluded_params = normalize_list(&config.excluded_params);
        config.excludes = normalize_list(&config.excludes);
        config
    }

    /// Validate the server address (expects a normalized config)
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.server.is_empty() {
            return Ok(());
        }

        if self.server.contains("://") {
            return Err(ConfigError::Invalid(format!(
                "server must be host[:port] without a scheme, got '{}'",
                self.server
            )));
        }

        if self.server.contains('/') || self.server.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "server must be host[:port], got '{}'",
                self.server
            )));
        }

        Ok(())
    }

    /// Whether automatic purges may run at all
    pub fn purging_active(&self) -> bool {
        self.enabled && !self.dev_mode
    }

    /// Host (with explicit port, if any) parsed from the site URL
    pub fn site_host(&self) -> Option<String> {
        let raw = self.site_url.trim();
        if raw.is_empty() {
            return None;
        }

        let url = Url::parse(raw)
            .ok()
            .filter(|u| u.has_host())
            .or_else(|| Url::parse(&format!("http://{}", raw)).ok())?;

        let host = url.host_str()?;
        match url.port() {
            Some(port) => Some(format!("{}:{}", host, port)),
            None => Some(host.to_string()),
        }
    }
}

/// Reads and writes the settings document at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store for a specific settings file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default settings path (~/.varnish-cache/settings.json)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(home.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Resolve a custom path, or fall back to the default location
    pub fn resolve_path(custom: Option<&str>) -> Result<PathBuf> {
        match custom {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::default_path(),
        }
    }

    /// Open the store at a custom path or the default location
    pub fn at(custom: Option<&str>) -> Result<Self> {
        Ok(Self::new(Self::resolve_path(custom)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the settings file and its sibling state files
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Path of a state file stored next to the settings file
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load settings merged over defaults. Never fails.
    pub fn load(&self) -> CacheConfig {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", self.path.display());
                return CacheConfig::default();
            }
            Err(e) => {
                log::warn!(
                    "Settings at {} unreadable ({}), using defaults",
                    self.path.display(),
                    e
                );
                return CacheConfig::default();
            }
        };

        match serde_json::from_str::<CacheConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Settings at {} are corrupt ({}), using defaults",
                    self.path.display(),
                    e
                );
                CacheConfig::default()
            }
        }
    }

    /// Normalize, validate, and atomically persist settings.
    ///
    /// Readers observe either the old or the new document, never a mix.
    pub fn save(&self, config: &CacheConfig) -> Result<()> {
        let config = config.normalized();
        config.validate()?;

        let contents = serde_json::to_string_pretty(&config)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        // The front-end path reads this file too, so keep it world-readable
        write_atomic(&self.path, contents.as_bytes(), 0o644).map_err(ConfigError::from_write)?;

        log::info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// Write `contents` to `path` via a temporary file renamed into place,
/// creating the containing directory if needed.
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
