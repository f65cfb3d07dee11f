//! UCI surface for the ambush engine.
//!
//! The engine loop is generic over the rules adapter: a host instantiates
//! [`UciEngine`] with a `Rules` implementation and a writer, then feeds it
//! parsed commands. A reader thread keeps stdin non-blocking; during a
//! search the same channel doubles as the search's signal source, so
//! `stop`, `ponderhit` and `quit` take effect at the next poll.
//!
//! The crate also ships the similarity test console used while tuning the
//! position-similarity measures (`auto`/`man`/`child`/`exit`).

pub mod command;
pub mod engine;
pub mod error;
pub mod simtest;

pub use command::{parse_command, Command, GoParams};
pub use engine::UciEngine;
pub use error::UciError;
pub use simtest::SimilarityTester;

use engine_config::CentralConfig;
use mcts::SearchConfig;

/// Build the searcher configuration from the loaded central config.
pub fn search_config(central: &CentralConfig) -> SearchConfig {
    SearchConfig::default()
        .with_multi_pv(central.search.multi_pv)
        .with_legacy_sim_growth(central.search.legacy_sim_growth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_mirrors_the_central_sections() {
        let mut central = CentralConfig::default();
        central.search.multi_pv = 6;
        central.search.legacy_sim_growth = true;

        let config = search_config(&central);
        assert_eq!(config.multi_pv, 6);
        assert!(config.legacy_sim_growth);
    }

    #[test]
    fn search_config_defaults_line_up() {
        let config = search_config(&CentralConfig::default());
        assert_eq!(config.multi_pv, SearchConfig::default().multi_pv);
        assert!(!config.legacy_sim_growth);
    }
}
