//! Thinking-time control.
//!
//! The per-move budget is a fixed fraction of the remaining clock. The
//! control distinguishes three modes: infinite (never expires), timed
//! (expires once the budget is spent) and pondering (budget exists but the
//! clock is checked only after `ponderhit` activates it).

use std::time::{Duration, Instant};

/// Fraction of the remaining clock spent on one move.
const TIME_RATE: u32 = 20;

/// Limits handed to one search invocation.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    /// Remaining clock for the side to move (or a synthetic budget).
    pub time: Duration,
    /// `go infinite`: think until told to stop.
    pub infinite: bool,
    /// `go ponder`: think on the opponent's time until `ponderhit`.
    pub ponder: bool,
}

impl SearchLimits {
    /// Timed search on `time` of remaining clock.
    pub fn timed(time: Duration) -> Self {
        Self {
            time,
            infinite: false,
            ponder: false,
        }
    }

    /// Search whose per-move budget is exactly `budget` (the stored clock
    /// is scaled so the budget fraction works out to `budget`).
    pub fn movetime(budget: Duration) -> Self {
        Self {
            time: budget * TIME_RATE,
            infinite: false,
            ponder: false,
        }
    }

    /// Unbounded search.
    pub fn infinite() -> Self {
        Self {
            time: Duration::ZERO,
            infinite: true,
            ponder: false,
        }
    }
}

/// Elapsed-time tracker for one search.
#[derive(Debug)]
pub struct TimeControl {
    start: Instant,
    thinking_time: Duration,
    infinite: bool,
    clock_active: bool,
}

impl TimeControl {
    /// Start the clock for `limits`. The thinking budget is
    /// `limits.time / 20`; pondering starts with the budget check disabled.
    pub fn start(limits: &SearchLimits) -> Self {
        Self {
            start: Instant::now(),
            thinking_time: limits.time / TIME_RATE,
            infinite: limits.infinite,
            clock_active: !limits.ponder,
        }
    }

    /// Enable the budget check (called on `ponderhit`). The elapsed time
    /// keeps counting from the start of the search.
    pub fn activate(&mut self) {
        self.clock_active = true;
    }

    /// Time since the search began.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Whether the thinking budget has been spent. Always false for
    /// infinite searches and while the clock is inactive.
    pub fn expired(&self) -> bool {
        !self.infinite && self.clock_active && self.elapsed() >= self.thinking_time
    }

    /// Whether the budget would have expired were the clock active; used
    /// to flag a deferred stop while pondering.
    pub fn would_expire(&self) -> bool {
        !self.infinite && self.elapsed() >= self.thinking_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_never_expires() {
        let control = TimeControl::start(&SearchLimits::infinite());
        assert!(!control.expired());
        assert!(!control.would_expire());
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let control = TimeControl::start(&SearchLimits::timed(Duration::ZERO));
        assert!(control.expired());
    }

    #[test]
    fn generous_budget_does_not_expire_immediately() {
        let control = TimeControl::start(&SearchLimits::timed(Duration::from_secs(200)));
        // Budget = 10s, elapsed ~0.
        assert!(!control.expired());
    }

    #[test]
    fn ponder_defers_the_budget_check() {
        let limits = SearchLimits {
            time: Duration::ZERO,
            infinite: false,
            ponder: true,
        };
        let mut control = TimeControl::start(&limits);
        // The budget is already gone, but the clock is inactive.
        assert!(!control.expired());
        assert!(control.would_expire());

        control.activate();
        assert!(control.expired());
    }

    #[test]
    fn thinking_time_is_a_twentieth() {
        let control = TimeControl::start(&SearchLimits::timed(Duration::from_secs(20)));
        assert_eq!(control.thinking_time, Duration::from_secs(1));
    }
}
