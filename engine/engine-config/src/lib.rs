//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across the engine's components.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`AMBUSH_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! AMBUSH_<SECTION>_<KEY>=value
//!
//! Examples:
//!     AMBUSH_COMMON_LOG_LEVEL=debug
//!     AMBUSH_SEARCH_MULTI_PV=4
//!     AMBUSH_SEARCH_LEGACY_SIM_GROWTH=true
//!     AMBUSH_SIMTEST_DATA_DIR=./test
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;
