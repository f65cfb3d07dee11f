//! Search configuration parameters.

use crate::similarity::SimMethod;

/// Configuration for the trap-aware tree search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of principal variations reported (UCI `MultiPV`).
    pub multi_pv: u32,

    /// Similarity measure applied between the new root and the remembered
    /// previous root for the side to move.
    pub sim_method: SimMethod,

    /// Grow the per-node playout weight with the legacy exponential
    /// recurrence `w = exp(w - 1 + 0.001)` instead of the bounded additive
    /// `w += 0.001`. The exponential form diverges on hot nodes; it is kept
    /// for comparison runs only.
    pub legacy_sim_growth: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            multi_pv: 1,
            sim_method: SimMethod::RecLegalMoves,
            legacy_sim_growth: false,
        }
    }
}

impl SearchConfig {
    /// Builder pattern: set the number of reported variations.
    pub fn with_multi_pv(mut self, multi_pv: u32) -> Self {
        self.multi_pv = multi_pv.max(1);
        self
    }

    /// Builder pattern: set the root similarity measure.
    pub fn with_sim_method(mut self, method: SimMethod) -> Self {
        self.sim_method = method;
        self
    }

    /// Builder pattern: toggle the legacy playout-weight recurrence.
    pub fn with_legacy_sim_growth(mut self, enabled: bool) -> Self {
        self.legacy_sim_growth = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.multi_pv, 1);
        assert_eq!(config.sim_method, SimMethod::RecLegalMoves);
        assert!(!config.legacy_sim_growth);
    }

    #[test]
    fn builder_pattern() {
        let config = SearchConfig::default()
            .with_multi_pv(4)
            .with_sim_method(SimMethod::Constant)
            .with_legacy_sim_growth(true);
        assert_eq!(config.multi_pv, 4);
        assert_eq!(config.sim_method, SimMethod::Constant);
        assert!(config.legacy_sim_growth);
    }

    #[test]
    fn multi_pv_is_at_least_one() {
        assert_eq!(SearchConfig::default().with_multi_pv(0).multi_pv, 1);
    }
}
