use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Trailing-edge debounce for keystroke-driven conversions.
///
/// Each call to [`Debouncer::settle`] supersedes the previous one; only the last caller
/// to wait out the full delay gets `true`.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The ticket is taken when this is called, not when the future is first polled.
    pub fn settle(&self) -> impl Future<Output = bool> + '_ {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            self.generation.load(Ordering::Acquire) == ticket
        }
    }

    /// Invalidates any pending wait without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::Debouncer;

    #[tokio::test(start_paused = true)]
    async fn lone_keystroke_settles() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(debouncer.settle().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_pending_until_the_delay_passes() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let mut settle = task::spawn(debouncer.settle());

        assert_pending!(settle.poll());
        tokio::time::advance(Duration::from_millis(299)).await;
        assert_pending!(settle.poll());
        tokio::time::advance(Duration::from_millis(2)).await;
        assert_ready_eq!(settle.poll(), true);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_settles_once() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let first = debouncer.settle();
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            debouncer.settle().await
        };
        let third = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            debouncer.settle().await
        };

        let results = tokio::join!(first, second, third);
        assert_eq!(results, (false, false, true));
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_keystrokes_each_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        assert!(debouncer.settle().await);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(debouncer.settle().await);
    }

    #[tokio::test(start_paused = true)]
    async fn older_call_loses_even_if_polled_last() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let older = debouncer.settle();
        let newer = debouncer.settle();

        assert!(newer.await);
        assert!(!older.await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_wait() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let pending = debouncer.settle();
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            debouncer.cancel();
        };

        let (settled, ()) = tokio::join!(pending, canceller);
        assert!(!settled);
    }
}
