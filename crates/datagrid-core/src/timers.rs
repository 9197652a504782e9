//! Host-driven timers for debounced updates.
//!
//! The grid never sleeps and never spawns threads. Debounced operations schedule a task under a
//! key; scheduling again under the same key replaces the pending task, which restarts the delay.
//! The host advances the clock with [`GridApi::advance_timers`], which runs every task whose
//! deadline has passed, in deadline order.

use crate::api::GridApi;
use crate::error::GridError;
use crate::value::GridRowId;
use std::fmt;
use std::time::Duration;

/// Identifies the operation a pending task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridTimerKey {
    /// Debounced value of an edited cell.
    EditCellValue {
        /// Row id.
        id: GridRowId,
        /// Column field.
        field: String,
    },
    /// Debounced value of a filter item.
    FilterItemValue(u64),
}

/// Work run when a timer fires.
pub type GridTimerTask = Box<dyn FnOnce(&mut GridApi) -> Result<(), GridError>>;

struct PendingTimer {
    key: GridTimerKey,
    deadline: Duration,
    seq: u64,
    task: GridTimerTask,
}

/// Pending debounced tasks and the grid clock.
#[derive(Default)]
pub struct GridTimers {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTimer>,
}

impl GridTimers {
    /// Create an empty timer queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current grid time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` after `delay`, replacing any pending task with the same key.
    pub fn schedule(&mut self, key: GridTimerKey, delay: Duration, task: GridTimerTask) {
        self.cancel(&key);
        self.next_seq += 1;
        self.pending.push(PendingTimer {
            key,
            deadline: self.now + delay,
            seq: self.next_seq,
            task,
        });
    }

    /// Drop the pending task of `key`. Returns true if one was pending.
    pub fn cancel(&mut self, key: &GridTimerKey) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| &timer.key != key);
        before != self.pending.len()
    }

    /// Drop every pending task whose key matches.
    pub fn cancel_where(&mut self, matches: impl Fn(&GridTimerKey) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|timer| !matches(&timer.key));
        before - self.pending.len()
    }

    /// Remove and return every pending task whose key matches, in deadline order.
    pub fn take_where(&mut self, matches: impl Fn(&GridTimerKey) -> bool) -> Vec<GridTimerTask> {
        let (mut taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|timer| matches(&timer.key));
        self.pending = kept;
        taken.sort_by_key(|timer| (timer.deadline, timer.seq));
        taken.into_iter().map(|timer| timer.task).collect()
    }

    /// Whether a task is pending for `key`.
    pub fn is_pending(&self, key: &GridTimerKey) -> bool {
        self.pending.iter().any(|timer| &timer.key == key)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no task is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward without running anything.
    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Pop the earliest task due at `until`, moving the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<GridTimerTask> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.deadline <= until)
            .min_by_key(|(_, timer)| (timer.deadline, timer.seq))
            .map(|(index, _)| index)?;
        let timer = self.pending.remove(index);
        self.now = self.now.max(timer.deadline);
        Some(timer.task)
    }
}

impl fmt::Debug for GridTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridTimers")
            .field("now", &self.now)
            .field(
                "pending",
                &self.pending.iter().map(|timer| &timer.key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl GridApi {
    /// Advance the grid clock by `elapsed`, running every task that becomes due.
    ///
    /// Tasks scheduled by a running task fire in the same call when their deadline is reached.
    /// Errors returned by tasks go to the error handler.
    pub fn advance_timers(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some(task) = self.timers.pop_due(until) {
            if let Err(err) = task(self) {
                self.report_error(&err);
            }
        }
        let remaining = until - self.timers.now();
        self.timers.advance(remaining);
    }

    /// Whether a debounced task is pending for `key`.
    pub fn has_pending_timer(&self, key: &GridTimerKey) -> bool {
        self.timers.is_pending(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> GridTimerTask {
        Box::new(|_: &mut GridApi| Ok(()))
    }

    #[test]
    fn test_schedule_replaces_same_key() {
        let mut timers = GridTimers::new();
        let key = GridTimerKey::FilterItemValue(1);
        timers.schedule(key.clone(), Duration::from_millis(100), noop());
        timers.advance(Duration::from_millis(50));
        timers.schedule(key.clone(), Duration::from_millis(100), noop());

        assert_eq!(timers.len(), 1);
        assert!(timers.pop_due(Duration::from_millis(100)).is_none());
        assert!(timers.pop_due(Duration::from_millis(150)).is_some());
        assert!(timers.is_empty());
        assert_eq!(timers.now(), Duration::from_millis(150));
    }

    #[test]
    fn test_take_where_returns_matching_tasks() {
        let mut timers = GridTimers::new();
        let id = GridRowId::Number(1);
        timers.schedule(
            GridTimerKey::EditCellValue {
                id: id.clone(),
                field: "name".into(),
            },
            Duration::from_millis(10),
            noop(),
        );
        timers.schedule(GridTimerKey::FilterItemValue(3), Duration::from_millis(10), noop());

        let taken = timers.take_where(
            |key| matches!(key, GridTimerKey::EditCellValue { id: row, .. } if *row == id),
        );
        assert_eq!(taken.len(), 1);
        assert!(timers.is_pending(&GridTimerKey::FilterItemValue(3)));
        assert_eq!(timers.cancel_where(|_| true), 1);
    }
}
