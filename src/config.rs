//! Configuration Module
//!
//! Engine tunables and binary settings, loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::network::NetworkClass;

/// Routes warmed unconditionally at startup.
pub const DEFAULT_CRITICAL_ROUTES: &[&str] = &["/", "/dashboard"];

/// Routes warmed after first paint when the network allows it.
pub const DEFAULT_HIGH_PRIORITY_ROUTES: &[&str] = &["/profile", "/settings"];

/// Every lazily-loadable route the bundled host knows about.
pub const DEFAULT_KNOWN_ROUTES: &[&str] = &[
    "/",
    "/dashboard",
    "/profile",
    "/settings",
    "/users",
    "/roles",
    "/audit-logs",
    "/privacy",
    "/notifications",
    "/login",
    "/register",
];

// == Preload Config ==
/// Tunables for the preload engine.
///
/// The defaults are product-tuned heuristics; none of them carries a
/// correctness guarantee.
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Maximum number of cached route modules
    pub max_cache_size: usize,
    /// Age after which a cached module is stale, measured from its load time
    pub cache_ttl: Duration,
    /// Minimum conditional probability for a predicted next route
    pub prediction_threshold: f64,
    /// Maximum number of predicted routes warmed per navigation
    pub max_predictions: usize,
    /// Routes per background batch
    pub background_batch_size: usize,
    /// Pause between background batches
    pub background_batch_delay: Duration,
    /// Delay before the background phase when no idle signal exists
    pub idle_fallback_delay: Duration,
    /// Maximum number of distinct learned transitions
    pub pattern_cap: usize,
}

impl PreloadConfig {
    /// Creates a PreloadConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_SIZE` - Cached module bound (default: 20)
    /// - `CACHE_TTL` - Staleness age in seconds (default: 1800)
    /// - `PREDICTION_THRESHOLD` - Prediction probability floor (default: 0.30)
    /// - `MAX_PREDICTIONS` - Predicted routes per navigation (default: 3)
    /// - `BACKGROUND_BATCH_SIZE` - Routes per background batch (default: 3)
    /// - `BACKGROUND_BATCH_DELAY_MS` - Inter-batch pause (default: 100)
    /// - `IDLE_FALLBACK_DELAY_MS` - Background start delay without idle signal (default: 2000)
    /// - `PATTERN_CAP` - Learned transition cap (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cache_size: env_or("MAX_CACHE_SIZE", defaults.max_cache_size).max(1),
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL", defaults.cache_ttl.as_secs())),
            prediction_threshold: env_or("PREDICTION_THRESHOLD", defaults.prediction_threshold),
            max_predictions: env_or("MAX_PREDICTIONS", defaults.max_predictions),
            background_batch_size: env_or("BACKGROUND_BATCH_SIZE", defaults.background_batch_size)
                .max(1),
            background_batch_delay: Duration::from_millis(env_or(
                "BACKGROUND_BATCH_DELAY_MS",
                defaults.background_batch_delay.as_millis() as u64,
            )),
            idle_fallback_delay: Duration::from_millis(env_or(
                "IDLE_FALLBACK_DELAY_MS",
                defaults.idle_fallback_delay.as_millis() as u64,
            )),
            pattern_cap: env_or("PATTERN_CAP", defaults.pattern_cap),
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_cache_size: 20,
            cache_ttl: Duration::from_secs(30 * 60),
            prediction_threshold: 0.30,
            max_predictions: 3,
            background_batch_size: 3,
            background_batch_delay: Duration::from_millis(100),
            idle_fallback_delay: Duration::from_millis(2000),
            pattern_cap: 100,
        }
    }
}

// == Server Config ==
/// Settings for the bundled HTTP host.
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine tunables
    pub preload: PreloadConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Stale-entry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Directory holding compiled route modules
    pub module_dir: PathBuf,
    /// File extension of compiled route modules
    pub module_extension: String,
    /// File the learned navigation patterns are persisted to
    pub pattern_file: PathBuf,
    /// Routes warmed immediately
    pub critical_routes: Vec<String>,
    /// Routes warmed after first paint
    pub high_priority_routes: Vec<String>,
    /// All routes known to the host
    pub known_routes: Vec<String>,
    /// Network class assumed until the host reports one
    pub network_class: NetworkClass,
    /// Wait for host idle notifications instead of a fixed delay
    pub idle_signal: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// All `PreloadConfig` variables, plus:
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Stale sweep frequency in seconds (default: 60)
    /// - `MODULE_DIR` - Compiled module directory (default: ./modules)
    /// - `MODULE_EXTENSION` - Module file extension (default: js)
    /// - `PATTERN_FILE` - Pattern persistence file (default: ./navigation-patterns.json)
    /// - `CRITICAL_ROUTES`, `HIGH_PRIORITY_ROUTES`, `KNOWN_ROUTES` - comma separated
    /// - `NETWORK_CLASS` - fast, slow, save-data or unknown (default: unknown)
    /// - `IDLE_SIGNAL` - true to wait for host idle notifications (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            preload: PreloadConfig::from_env(),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            module_dir: env::var("MODULE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.module_dir),
            module_extension: env::var("MODULE_EXTENSION").unwrap_or(defaults.module_extension),
            pattern_file: env::var("PATTERN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.pattern_file),
            critical_routes: env_list("CRITICAL_ROUTES").unwrap_or(defaults.critical_routes),
            high_priority_routes: env_list("HIGH_PRIORITY_ROUTES")
                .unwrap_or(defaults.high_priority_routes),
            known_routes: env_list("KNOWN_ROUTES").unwrap_or(defaults.known_routes),
            network_class: env_or("NETWORK_CLASS", defaults.network_class),
            idle_signal: env_or("IDLE_SIGNAL", defaults.idle_signal),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preload: PreloadConfig::default(),
            server_port: 3000,
            cleanup_interval: 60,
            module_dir: PathBuf::from("./modules"),
            module_extension: "js".to_string(),
            pattern_file: PathBuf::from("./navigation-patterns.json"),
            critical_routes: to_owned_list(DEFAULT_CRITICAL_ROUTES),
            high_priority_routes: to_owned_list(DEFAULT_HIGH_PRIORITY_ROUTES),
            known_routes: to_owned_list(DEFAULT_KNOWN_ROUTES),
            network_class: NetworkClass::Unknown,
            idle_signal: true,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

fn to_owned_list(routes: &[&str]) -> Vec<String> {
    routes.iter().map(|r| r.to_string()).collect()
}
