//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// Serde default functions (required for #[serde(default = "...")])

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_multi_pv() -> u32 {
    defaults::multi_pv()
}
fn d_legacy_sim_growth() -> bool {
    defaults::legacy_sim_growth()
}
fn d_simtest_data_dir() -> String {
    defaults::simtest_data_dir().into()
}

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub simtest: SimTestSection,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchSection {
    /// Number of principal variations reported (UCI `MultiPV`).
    #[serde(default = "d_multi_pv")]
    pub multi_pv: u32,
    /// Use the legacy exponential playout-weight recurrence instead of the
    /// bounded additive one.
    #[serde(default = "d_legacy_sim_growth")]
    pub legacy_sim_growth: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            multi_pv: defaults::multi_pv(),
            legacy_sim_growth: defaults::legacy_sim_growth(),
        }
    }
}

/// Similarity test utility configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimTestSection {
    /// Directory holding `test_set.in` and receiving result CSV files.
    #[serde(default = "d_simtest_data_dir")]
    pub data_dir: String,
}

impl Default for SimTestSection {
    fn default() -> Self {
        Self {
            data_dir: defaults::simtest_data_dir().into(),
        }
    }
}
