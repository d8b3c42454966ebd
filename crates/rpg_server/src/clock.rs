//! Clock driven by tokio's timer.

use rpg_core::world::{Clock, SystemClock};
use tokio::time::Instant;

/// Milliseconds since a fixed base, measured on tokio's clock.
///
/// Under a paused runtime (`start_paused = true`) this only moves when tokio
/// auto-advances or a test calls `tokio::time::advance`, which keeps world
/// timers deterministic in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base_ms: u64,
    started: Instant,
}

impl TokioClock {
    /// Start counting from `base_ms`.
    #[must_use]
    pub fn new(base_ms: u64) -> Self {
        Self {
            base_ms,
            started: Instant::now(),
        }
    }

    /// Start counting from the current Unix time.
    #[must_use]
    pub fn from_system_time() -> Self {
        Self::new(SystemClock.now_ms())
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base_ms.saturating_add(elapsed)
    }
}
