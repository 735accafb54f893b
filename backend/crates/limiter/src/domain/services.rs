//! Domain Services
//!
//! Pure fixed-window evaluation. Storage backends and the read-modify-write
//! path all funnel through [`evaluate_window`] (the Redis script mirrors it),
//! so every consistency mode makes the same decision for the same state.

use crate::domain::entities::WindowRecord;
use platform::rate_limit::{Decision, RateLimitConfig};

/// State change taken for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTransition {
    /// No record yet: window opened at `now`, request admitted
    Opened,
    /// Inside the window and under the limit: count incremented, admitted
    Counted,
    /// Inside the window at the limit: state untouched, denied
    Blocked,
    /// Window expired: restarted at `now`, admitted
    Reset,
}

impl WindowTransition {
    pub fn decision(self) -> Decision {
        match self {
            WindowTransition::Blocked => Decision::Deny,
            WindowTransition::Opened | WindowTransition::Counted | WindowTransition::Reset => {
                Decision::Admit
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowTransition::Opened => "opened",
            WindowTransition::Counted => "counted",
            WindowTransition::Blocked => "blocked",
            WindowTransition::Reset => "reset",
        }
    }
}

/// Result of evaluating one request against the stored window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvaluation {
    pub transition: WindowTransition,
    /// Record to write back; `None` means the store must not be touched
    pub update: Option<WindowRecord>,
}

impl WindowEvaluation {
    pub fn decision(&self) -> Decision {
        self.transition.decision()
    }
}

/// Evaluate a request at `now` against the client's current record.
///
/// The limit check is strict: the opening request plus `max_requests - 1`
/// counted ones are admitted, so a window admits `max_requests` requests
/// and the next one in the window is denied with the record left as is.
pub fn evaluate_window(
    record: Option<&WindowRecord>,
    now: i64,
    config: &RateLimitConfig,
) -> WindowEvaluation {
    let Some(record) = record else {
        return WindowEvaluation {
            transition: WindowTransition::Opened,
            update: Some(WindowRecord::open(now)),
        };
    };

    if record.elapsed(now) >= config.window_secs() {
        return WindowEvaluation {
            transition: WindowTransition::Reset,
            update: Some(WindowRecord::open(now)),
        };
    }

    if record.count.saturating_add(1) < config.max_requests {
        WindowEvaluation {
            transition: WindowTransition::Counted,
            update: Some(record.incremented()),
        }
    } else {
        WindowEvaluation {
            transition: WindowTransition::Blocked,
            update: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig::new(10, 20)
    }

    #[test]
    fn test_first_request_opens_window() {
        let eval = evaluate_window(None, 1_000, &config());
        assert_eq!(eval.transition, WindowTransition::Opened);
        assert_eq!(eval.update, Some(WindowRecord::open(1_000)));
        assert!(eval.decision().is_admitted());
    }

    #[test]
    fn test_in_window_request_is_counted() {
        let record = WindowRecord {
            window_start: 1_000,
            count: 3,
        };
        let eval = evaluate_window(Some(&record), 1_005, &config());
        assert_eq!(eval.transition, WindowTransition::Counted);
        assert_eq!(
            eval.update,
            Some(WindowRecord {
                window_start: 1_000,
                count: 4
            })
        );
    }

    #[test]
    fn test_last_admitted_count_is_max_minus_one() {
        let record = WindowRecord {
            window_start: 1_000,
            count: 8,
        };
        let eval = evaluate_window(Some(&record), 1_001, &config());
        assert_eq!(eval.transition, WindowTransition::Counted);
        assert_eq!(eval.update.map(|r| r.count), Some(9));
    }

    #[test]
    fn test_limit_reached_blocks_without_update() {
        let record = WindowRecord {
            window_start: 1_000,
            count: 9,
        };
        let eval = evaluate_window(Some(&record), 1_006, &config());
        assert_eq!(eval.transition, WindowTransition::Blocked);
        assert_eq!(eval.update, None);
        assert!(eval.decision().is_blocked());
    }

    #[test]
    fn test_window_boundary_is_inclusive_for_reset() {
        let record = WindowRecord {
            window_start: 1_000,
            count: 9,
        };
        let eval = evaluate_window(Some(&record), 1_019, &config());
        assert_eq!(eval.transition, WindowTransition::Blocked);

        let eval = evaluate_window(Some(&record), 1_020, &config());
        assert_eq!(eval.transition, WindowTransition::Reset);
        assert_eq!(eval.update, Some(WindowRecord::open(1_020)));
    }

    #[test]
    fn test_clock_skew_backwards_stays_in_window() {
        let record = WindowRecord {
            window_start: 1_000,
            count: 0,
        };
        let eval = evaluate_window(Some(&record), 900, &config());
        assert_eq!(eval.transition, WindowTransition::Counted);
    }

    #[test]
    fn test_single_request_limit() {
        let config = RateLimitConfig::new(1, 20);
        let eval = evaluate_window(None, 0, &config);
        assert!(eval.decision().is_admitted());

        let eval = evaluate_window(eval.update.as_ref(), 1, &config);
        assert_eq!(eval.transition, WindowTransition::Blocked);
    }
}
