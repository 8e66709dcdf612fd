use std::collections::BTreeSet;
use std::time::Duration;

use crate::ports::scheduler::*;

/// A scheduler on a virtual clock. Nothing fires until `advance` is called,
/// which makes restart timing reproducible in tests and in hosts that own
/// their own event loop.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    // Ordered by due time, then by scheduling order.
    pending: BTreeSet<(Duration, TaskHandle)>,
}

impl ManualScheduler {
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and returns the tasks that fell due, earliest
    /// first. Returned tasks are no longer pending.
    pub fn advance(&mut self, by: Duration) -> Vec<TaskHandle> {
        self.now += by;
        let later = self
            .pending
            .split_off(&(self.now + Duration::from_nanos(1), TaskHandle(0)));
        let due = std::mem::replace(&mut self.pending, later);
        due.into_iter().map(|(_, handle)| handle).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert((self.now + delay, handle));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.pending.retain(|(_, h)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let mut scheduler = ManualScheduler::default();
        let slow = scheduler.schedule(Duration::from_millis(1000));
        let fast = scheduler.schedule(Duration::from_millis(100));

        assert!(scheduler.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(1)), [fast]);
        assert_eq!(scheduler.advance(Duration::from_secs(5)), [slow]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = ManualScheduler::default();
        let handle = scheduler.schedule(Duration::from_millis(10));
        scheduler.cancel(handle);
        assert!(scheduler.advance(Duration::from_secs(1)).is_empty());
    }
}
