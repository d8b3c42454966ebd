//! Injectable clock and periodic task bookkeeping.
//!
//! The world never sleeps or reads the wall clock directly. Hosts drive it
//! with [`SystemClock`]; tests drive it with [`ManualClock`] and advance
//! simulated time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds.
pub trait Clock: Send {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at `start_ms`.
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Recurring jobs run by the world manager.
///
/// Declaration order breaks ties between tasks due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// Advance navigation by one tick.
    Navigation,
    /// Increment world time.
    WorldTime,
    /// Sweep expired state.
    Cleanup,
    /// Scheduled save.
    Autosave,
}

impl TaskKind {
    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskKind::Navigation => "navigation",
            TaskKind::WorldTime => "world_time",
            TaskKind::Cleanup => "cleanup",
            TaskKind::Autosave => "autosave",
        }
    }
}

/// One run of a task that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueTask {
    /// Scheduled time of this run.
    pub due_ms: u64,
    /// Task to run.
    pub kind: TaskKind,
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    kind: TaskKind,
    interval_ms: u64,
    next_due_ms: u64,
}

/// Fixed-interval timers evaluated against an external clock.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
}

impl Scheduler {
    /// Scheduler with no tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to first fire one interval after `now_ms`.
    ///
    /// Re-arming a task replaces its previous schedule. Zero intervals are
    /// ignored.
    pub fn schedule(&mut self, kind: TaskKind, interval_ms: u64, now_ms: u64) {
        if interval_ms == 0 {
            tracing::warn!(task = kind.as_str(), "Ignoring task with zero interval");
            return;
        }

        self.tasks.retain(|t| t.kind != kind);
        self.tasks.push(PeriodicTask {
            kind,
            interval_ms,
            next_due_ms: now_ms.saturating_add(interval_ms),
        });
    }

    /// Collect every run due at or before `now_ms`, oldest first.
    ///
    /// Missed intervals are all returned so no run is skipped after a stall.
    pub fn due(&mut self, now_ms: u64) -> Vec<DueTask> {
        let mut due = Vec::new();

        for task in &mut self.tasks {
            while task.next_due_ms <= now_ms {
                due.push(DueTask {
                    due_ms: task.next_due_ms,
                    kind: task.kind,
                });
                task.next_due_ms = task.next_due_ms.saturating_add(task.interval_ms);
            }
        }

        due.sort_unstable();
        due
    }

    /// Earliest upcoming run.
    #[must_use]
    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.next_due_ms).min()
    }

    /// Whether a task is armed.
    #[must_use]
    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    /// Disarm every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
