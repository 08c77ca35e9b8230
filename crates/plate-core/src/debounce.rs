//! Cancellable one-shot timer driven by the host's event loop.
//!
//! The host passes the current [`Instant`] into every call; nothing here spawns a thread
//! or touches a clock on its own.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    task: T,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms the timer for `task`, cancelling whatever was scheduled before. The cancelled
    /// task is handed back to the caller.
    pub fn schedule(&mut self, task: T, now: Instant) -> Option<T> {
        let cancelled = self.cancel();
        self.pending = Some(Pending {
            deadline: now + self.delay,
            task,
        });
        cancelled
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.task)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.task)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if due { self.cancel() } else { None }
    }

    pub fn flush(&mut self) -> Option<T> {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(150);

    #[test]
    fn fires_only_after_the_delay() {
        let start = Instant::now();
        let mut timer = Debouncer::new(DELAY);
        timer.schedule("a", start);

        assert_eq!(timer.poll(start + Duration::from_millis(149)), None);
        assert_eq!(timer.poll(start + DELAY), Some("a"));
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(start + DELAY * 2), None);
    }

    #[test]
    fn rescheduling_cancels_and_rearms() {
        let start = Instant::now();
        let mut timer = Debouncer::new(DELAY);
        timer.schedule("a", start);

        let later = start + Duration::from_millis(100);
        assert_eq!(timer.schedule("ab", later), Some("a"));

        assert_eq!(timer.poll(start + DELAY), None);
        assert_eq!(timer.poll(later + DELAY), Some("ab"));
    }

    #[test]
    fn flush_ignores_the_deadline() {
        let start = Instant::now();
        let mut timer = Debouncer::new(DELAY);
        timer.schedule(7, start);
        assert_eq!(timer.pending(), Some(&7));
        assert_eq!(timer.flush(), Some(7));
        assert_eq!(timer.deadline(), None);
    }
}
