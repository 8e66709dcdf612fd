use std::time::Duration;

/// Identifies one deferred task. Handles are never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

/// Deferred, cancellable restarts.
///
/// A scheduler does not run code itself: when a task falls due its handle
/// is delivered back to the owner (for the controller, through
/// `on_restart_due`). After `cancel` returns, the handle must not be
/// delivered.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TaskHandle;
    fn cancel(&mut self, handle: TaskHandle);
}

impl<T: Scheduler + ?Sized> Scheduler for Box<T> {
    fn schedule(&mut self, delay: Duration) -> TaskHandle {
        (**self).schedule(delay)
    }
    fn cancel(&mut self, handle: TaskHandle) {
        (**self).cancel(handle)
    }
}
