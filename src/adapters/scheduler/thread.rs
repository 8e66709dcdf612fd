use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::ports::scheduler::*;

pub type DueCallback = Arc<dyn Fn(TaskHandle) + Send + Sync>;

/// Runs each deferred task on a sleeper thread that reports the handle
/// through `on_due` unless it was cancelled first.
pub struct ThreadScheduler {
    next_id: u64,
    on_due: DueCallback,
    // Cancellation flags of tasks whose thread may still be sleeping.
    live: HashMap<TaskHandle, Arc<AtomicBool>>,
}

impl ThreadScheduler {
    pub fn new(on_due: DueCallback) -> Self {
        Self {
            next_id: 0,
            on_due,
            live: HashMap::new(),
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, delay: Duration) -> TaskHandle {
        // A flag only referenced from here belongs to a finished thread.
        self.live.retain(|_, flag| Arc::strong_count(flag) > 1);

        let handle = TaskHandle(self.next_id);
        self.next_id += 1;

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let on_due = self.on_due.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if flag.load(Ordering::SeqCst) {
                debug!("{handle:?} was cancelled");
                return;
            }
            on_due(handle);
        });

        self.live.insert(handle, cancelled);
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        if let Some(flag) = self.live.remove(&handle) {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn delivers_due_handles_and_skips_cancelled() {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let mut scheduler = ThreadScheduler::new(Arc::new(move |handle| {
            let _ = tx.lock().map(|tx| tx.send(handle));
        }));

        let cancelled = scheduler.schedule(Duration::from_millis(30));
        let kept = scheduler.schedule(Duration::from_millis(10));
        scheduler.cancel(cancelled);

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(kept));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
