//! Trailing-edge debouncer on the local task set.
//!
//! Each call to [`Debouncer::arm`] cancels the previously scheduled run and
//! schedules a new one after the quiet period, so a burst of calls results in
//! exactly one run once the burst is over.
//!
//! # Example
//!
//! ```ignore
//! let debouncer = Debouncer::new(Duration::from_millis(100));
//!
//! // Called for every change notification
//! debouncer.arm(move || flush_pending());
//! ```

use std::cell::RefCell;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: RefCell<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: RefCell::new(None),
        }
    }

    /// Quiet period before a scheduled run fires.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `run` after the quiet period, cancelling any pending run.
    ///
    /// Must be called from within a [`tokio::task::LocalSet`].
    pub fn arm<F>(&self, run: F)
    where
        F: FnOnce() + 'static,
    {
        let delay = self.delay;
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            run();
        });
        if let Some(previous) = self.pending.replace(Some(handle)) {
            previous.abort();
        }
    }

    /// Drop the pending run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.borrow_mut().take() {
            handle.abort();
        }
    }

    /// Whether a run is scheduled and has not fired yet.
    pub fn is_armed(&self) -> bool {
        self.pending
            .borrow()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_burst_collapses_into_one_run() {
        LocalSet::new()
            .run_until(async {
                let runs = Rc::new(Cell::new(0));
                let debouncer = Debouncer::new(Duration::from_millis(100));

                for _ in 0..5 {
                    let runs = runs.clone();
                    debouncer.arm(move || runs.set(runs.get() + 1));
                    sleep(Duration::from_millis(30)).await;
                }
                assert_eq!(runs.get(), 0);
                assert!(debouncer.is_armed());

                sleep(Duration::from_millis(200)).await;
                assert_eq!(runs.get(), 1);
                assert!(!debouncer.is_armed());
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_separate_bursts_run_separately() {
        LocalSet::new()
            .run_until(async {
                let runs = Rc::new(Cell::new(0));
                let debouncer = Debouncer::new(Duration::from_millis(100));

                let r = runs.clone();
                debouncer.arm(move || r.set(r.get() + 1));
                sleep(Duration::from_millis(150)).await;

                let r = runs.clone();
                debouncer.arm(move || r.set(r.get() + 1));
                sleep(Duration::from_millis(150)).await;

                assert_eq!(runs.get(), 2);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cancel_prevents_run() {
        LocalSet::new()
            .run_until(async {
                let runs = Rc::new(Cell::new(0));
                let debouncer = Debouncer::new(Duration::from_millis(100));

                let r = runs.clone();
                debouncer.arm(move || r.set(r.get() + 1));
                debouncer.cancel();
                sleep(Duration::from_millis(200)).await;

                assert_eq!(runs.get(), 0);
                assert!(!debouncer.is_armed());
            })
            .await;
    }
}
