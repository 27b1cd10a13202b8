//! Catalog configuration.
//!
//! Settings are read from a TOML file (every field has a default, so a partial
//! file is valid) and then overridden from environment variables:
//!
//! - `CATALOG_CONFIG`: path to a TOML file to load first
//! - `CACHE_CAPACITY`, `CACHE_TTL_SECS`, `CACHE_CLEANUP_INTERVAL_SECS`
//! - `ADAPTER_TIMEOUT_MS`
//! - `ENABLE_NASA_HUBBLE`, `MAST_BASE_URL`
//! - `ENABLE_SESAME`, `SESAME_URL`
//! - `PROJECTION_TYPE` (`gnomonic` or `equirectangular`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CatalogError, CatalogResult, ErrorContext};
use crate::projection::ProjectionConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub mast: MastSettings,
    #[serde(default)]
    pub sesame: SesameSettings,
}

/// Shared result cache used by the adapter registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Per-adapter call budget
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

/// Free-text query resolution cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_resolver_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_resolver_ttl_secs")]
    pub ttl_secs: u64,
}

/// MAST (Hubble) portal client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MastSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mast_base_url")]
    pub base_url: String,
    #[serde(default = "default_mast_retries")]
    pub retries: u32,
    #[serde(default = "default_mast_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// CDS Sesame name resolver used for object names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SesameSettings {
    #[serde(default = "default_sesame_enabled")]
    pub enabled: bool,
    #[serde(default = "default_sesame_url")]
    pub base_url: String,
    #[serde(default = "default_sesame_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_mast_retries")]
    pub retries: u32,
    #[serde(default = "default_mast_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_cache_capacity() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_adapter_timeout_ms() -> u64 {
    8_000
}

fn default_limit() -> u32 {
    50
}

fn default_max_limit() -> u32 {
    500
}

fn default_resolver_capacity() -> usize {
    128
}

fn default_resolver_ttl_secs() -> u64 {
    600
}

fn default_mast_base_url() -> String {
    "https://mast.stsci.edu/api/v0.1".to_string()
}

fn default_mast_retries() -> u32 {
    2
}

fn default_mast_retry_delay_ms() -> u64 {
    300
}

fn default_sesame_enabled() -> bool {
    true
}

fn default_sesame_url() -> String {
    "https://cdsweb.u-strasbg.fr/cgi-bin/nph-sesame/-oI/A".to_string()
}

fn default_sesame_timeout_ms() -> u64 {
    15_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: default_adapter_timeout_ms(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl RegistrySettings {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            cache_capacity: default_resolver_capacity(),
            ttl_secs: default_resolver_ttl_secs(),
        }
    }
}

impl ResolverSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for MastSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_mast_base_url(),
            retries: default_mast_retries(),
            retry_delay_ms: default_mast_retry_delay_ms(),
        }
    }
}

impl Default for SesameSettings {
    fn default() -> Self {
        Self {
            enabled: default_sesame_enabled(),
            base_url: default_sesame_url(),
            timeout_ms: default_sesame_timeout_ms(),
            retries: default_mast_retries(),
            retry_delay_ms: default_mast_retry_delay_ms(),
        }
    }
}

impl SesameSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Read and parse an environment variable, `Ok(None)` when unset.
fn env_override<T: FromStr>(name: &str) -> CatalogResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CatalogError::Configuration {
                message: format!("Invalid value for {}: '{}'", name, raw),
                context: ErrorContext::new("config_from_env").with_field(name),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(name: &str) -> CatalogResult<Option<bool>> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(CatalogError::Configuration {
                message: format!("Invalid boolean for {}: '{}'", name, raw),
                context: ErrorContext::new("config_from_env").with_field(name),
            }),
        },
        Err(_) => Ok(None),
    }
}

impl CatalogConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(CatalogConfig)` if the file was read, parsed and validated
    /// * `Err(CatalogError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Configuration {
            message: format!("Failed to read config file: {}", e),
            context: ErrorContext::new("load_config").with_details(path.display().to_string()),
        })?;

        let config: CatalogConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the first `catalog.toml` found in the current
    /// directory, `backend/`, or the parent directory.
    pub fn from_default_location() -> CatalogResult<Self> {
        let search_paths = [
            PathBuf::from("catalog.toml"),
            PathBuf::from("backend/catalog.toml"),
            PathBuf::from("../catalog.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Err(CatalogError::configuration(
            "No catalog.toml found in standard locations",
        ))
    }

    /// Defaults, then the `CATALOG_CONFIG` file if set, then individual
    /// environment overrides.
    pub fn from_env() -> CatalogResult<Self> {
        let mut config = match std::env::var("CATALOG_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> CatalogResult<()> {
        if let Some(v) = env_override("CACHE_CAPACITY")? {
            self.cache.capacity = v;
        }
        if let Some(v) = env_override("CACHE_TTL_SECS")? {
            self.cache.ttl_secs = v;
        }
        if let Some(v) = env_override("CACHE_CLEANUP_INTERVAL_SECS")? {
            self.cache.cleanup_interval_secs = v;
        }
        if let Some(v) = env_override("ADAPTER_TIMEOUT_MS")? {
            self.registry.adapter_timeout_ms = v;
        }
        if let Some(v) = parse_flag("ENABLE_NASA_HUBBLE")? {
            self.mast.enabled = v;
        }
        if let Ok(url) = std::env::var("MAST_BASE_URL") {
            if !url.trim().is_empty() {
                self.mast.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(v) = parse_flag("ENABLE_SESAME")? {
            self.sesame.enabled = v;
        }
        if let Ok(url) = std::env::var("SESAME_URL") {
            if !url.trim().is_empty() {
                self.sesame.base_url = url.trim().to_string();
            }
        }
        if let Ok(kind) = std::env::var("PROJECTION_TYPE") {
            self.projection.kind = kind
                .parse()
                .map_err(|e: CatalogError| e.with_operation("config_from_env"))?;
        }
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> CatalogResult<()> {
        let fail = |field: &str, message: &str| CatalogError::Configuration {
            message: message.to_string(),
            context: ErrorContext::new("validate_config").with_field(field),
        };

        if self.cache.capacity == 0 {
            return Err(fail("cache.capacity", "cache capacity must be positive"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(fail("cache.ttl_secs", "cache TTL must be positive"));
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err(fail(
                "cache.cleanup_interval_secs",
                "cleanup interval must be positive",
            ));
        }
        if self.registry.adapter_timeout_ms == 0 {
            return Err(fail(
                "registry.adapter_timeout_ms",
                "adapter timeout must be positive",
            ));
        }
        if self.registry.max_limit == 0 {
            return Err(fail("registry.max_limit", "max_limit must be positive"));
        }
        if self.registry.default_limit == 0 || self.registry.default_limit > self.registry.max_limit
        {
            return Err(fail(
                "registry.default_limit",
                "default_limit must be between 1 and max_limit",
            ));
        }
        if self.resolver.cache_capacity == 0 {
            return Err(fail(
                "resolver.cache_capacity",
                "resolver cache capacity must be positive",
            ));
        }
        if self.resolver.ttl_secs == 0 {
            return Err(fail("resolver.ttl_secs", "resolver TTL must be positive"));
        }
        if self.mast.enabled && self.mast.base_url.trim().is_empty() {
            return Err(fail("mast.base_url", "MAST base URL must not be empty"));
        }
        if self.sesame.enabled {
            if self.sesame.base_url.trim().is_empty() {
                return Err(fail("sesame.base_url", "Sesame URL must not be empty"));
            }
            if self.sesame.timeout_ms == 0 {
                return Err(fail("sesame.timeout_ms", "Sesame timeout must be positive"));
            }
        }
        self.projection.validate()
    }
}
