//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable
//! overrides.

use crate::CentralConfig;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from a subdirectory)
    "/app/config.toml", // Container deployments
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the AMBUSH_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var("AMBUSH_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from AMBUSH_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "AMBUSH_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(&path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &PathBuf) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: AMBUSH_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "AMBUSH_COMMON_LOG_LEVEL");

    // Search
    env_override!(config, search.multi_pv, "AMBUSH_SEARCH_MULTI_PV", parse);
    env_override!(
        config,
        search.legacy_sim_growth,
        "AMBUSH_SEARCH_LEGACY_SIM_GROWTH",
        parse
    );

    // Similarity test utility
    env_override!(config, simtest.data_dir, "AMBUSH_SIMTEST_DATA_DIR");

    config
}
