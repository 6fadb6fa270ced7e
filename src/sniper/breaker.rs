//! The sniper's own CLOSED/OPEN/HALF_OPEN circuit breaker (spec §4.5).
//!
//! Distinct from [`crate::watcher::reconnect`]'s two-state breaker: this
//! one guards order submission, not stream reconnection, and has a trial
//! (`HalfOpen`) state plus a doubling-cooldown escalation on repeated
//! trips. Same `CircuitState`-as-data shape as
//! `core/exchange/reconnecting.rs`, extended with the extra variant.

use std::time::{Duration, Instant};

use crate::config::SniperConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open { until: Instant, cooldown_ms: u64 },
    HalfOpen,
}

pub struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    failure_threshold: u32,
    base_cooldown_ms: u64,
    max_cooldown_ms: u64,
}

impl Breaker {
    pub fn new(cfg: &SniperConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            failure_threshold: cfg.breaker_failure_threshold,
            base_cooldown_ms: cfg.breaker_cooldown_ms,
            max_cooldown_ms: cfg.breaker_max_cooldown_ms,
        }
    }

    /// Whether a command may be attempted right now. `Open` transitions to
    /// `HalfOpen` once its cooldown elapses, as a side effect of the check.
    pub fn allows_attempt(&mut self) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open { until, .. } => {
                if Instant::now() >= until {
                    self.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, CircuitState::Open { .. })
    }

    /// Record a successful order outcome (`Filled`/`PartialFill`).
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = CircuitState::Closed;
    }

    /// Record a non-success outcome (`Rejected`/`Error`/timeout).
    pub fn record_failure(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                // Trial failed: reopen, doubling the cooldown.
                let next_cooldown = self.base_cooldown_ms.min(self.max_cooldown_ms);
                let cooldown_ms = (next_cooldown * 2).min(self.max_cooldown_ms);
                self.base_cooldown_ms = cooldown_ms;
                self.trip(cooldown_ms);
            }
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.trip(self.base_cooldown_ms);
                }
            }
            CircuitState::Open { .. } => {}
        }
    }

    fn trip(&mut self, cooldown_ms: u64) {
        self.state = CircuitState::Open {
            until: Instant::now() + Duration::from_millis(cooldown_ms),
            cooldown_ms,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SniperConfig {
        SniperConfig {
            order_timeout_ms: 500,
            breaker_failure_threshold: 3,
            breaker_cooldown_ms: 30_000,
            breaker_max_cooldown_ms: 300_000,
        }
    }

    #[test]
    fn stays_closed_below_the_failure_threshold() {
        let mut b = Breaker::new(&cfg());
        b.record_failure();
        b.record_failure();
        assert!(b.allows_attempt());
        assert!(!b.is_open());
    }

    #[test]
    fn trips_open_on_the_nth_consecutive_failure() {
        let mut b = Breaker::new(&cfg());
        b.record_failure();
        b.record_failure();
        b.record_failure();
        assert!(b.is_open());
        assert!(!b.allows_attempt());
    }

    #[test]
    fn half_open_success_closes_and_resets_failure_count() {
        let mut b = Breaker::new(&SniperConfig { breaker_cooldown_ms: 0, ..cfg() });
        b.record_failure();
        b.record_failure();
        b.record_failure();
        assert!(b.allows_attempt()); // cooldown already elapsed -> HalfOpen
        b.record_success();
        assert_eq!(b.state, CircuitState::Closed);
        b.record_failure();
        b.record_failure();
        assert!(!b.is_open()); // failure count reset, needs 3 more to trip again
    }

    #[test]
    fn half_open_failure_reopens_with_doubled_cooldown() {
        let mut b = Breaker::new(&SniperConfig { breaker_cooldown_ms: 0, ..cfg() });
        b.record_failure();
        b.record_failure();
        b.record_failure();
        assert!(b.allows_attempt()); // -> HalfOpen
        b.record_failure(); // trial fails
        match b.state {
            CircuitState::Open { cooldown_ms, .. } => assert_eq!(cooldown_ms, 0),
            _ => panic!("expected Open"),
        }
    }

    #[test]
    fn cooldown_escalation_is_capped_at_max() {
        let mut cfg = cfg();
        cfg.breaker_cooldown_ms = 200_000;
        cfg.breaker_max_cooldown_ms = 300_000;
        let mut b = Breaker::new(&cfg);
        b.state = CircuitState::HalfOpen;
        b.record_failure();
        match b.state {
            CircuitState::Open { cooldown_ms, .. } => assert_eq!(cooldown_ms, 300_000),
            _ => panic!("expected Open"),
        }
    }
}
