// ── Debounced value ──
//
// Holds a raw (rapidly changing) input and a committed output. The output
// takes the raw value only after the input has been quiet for `delay`.
// Every new input restarts the timer, so a stale value never commits.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A value whose committed form trails its input by a quiet period.
///
/// Must be created inside a Tokio runtime: the timer runs on a spawned
/// task that lives until [`shutdown()`](Self::shutdown) or drop.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Sender<T>,
    delay: Duration,
    cancel: CancellationToken,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output, _) = watch::channel(initial);
        let cancel = CancellationToken::new();

        tokio::spawn(run_timer(
            input_rx,
            output.clone(),
            delay,
            cancel.clone(),
        ));

        Self {
            input,
            output,
            delay,
            cancel,
        }
    }

    /// Feed a new raw value. Restarts the quiet-period timer.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Replace raw and committed values at once, dropping any pending commit.
    pub fn reset(&self, value: T) {
        self.input.send_replace(value.clone());
        commit(&self.output, value);
    }

    /// The latest raw input.
    pub fn pending(&self) -> T {
        self.input.borrow().clone()
    }

    /// The committed value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver that wakes once per commit.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stop the timer task. Pending input is discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Publish `value` unless it equals what is already committed.
fn commit<T: PartialEq>(output: &watch::Sender<T>, value: T) -> bool {
    output.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    })
}

async fn run_timer<T>(
    mut input: watch::Receiver<T>,
    output: watch::Sender<T>,
    delay: Duration,
    cancel: CancellationToken,
) where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    loop {
        // Idle: wait for the first change.
        tokio::select! {
            () = cancel.cancelled() => return,
            changed = input.changed() => if changed.is_err() { return },
        }

        // Quiet period: any further change restarts the sleep.
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    trace!("debounce timer restarted");
                }
                () = tokio::time::sleep(delay) => {
                    let value = input.borrow_and_update().clone();
                    if commit(&output, value) {
                        trace!("debounced value committed");
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_commit_only_the_last_value() {
        let debouncer = Debouncer::new(String::new(), DELAY);
        let mut rx = debouncer.subscribe();

        for value in ["123", "1234", "12345", "123456"] {
            debouncer.set(value.to_owned());
            tokio::time::sleep(Duration::from_millis(25)).await;
            assert!(!rx.has_changed().unwrap(), "committed {value} too early");
        }

        tokio::time::sleep(DELAY).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "123456");

        // Nothing else trails behind.
        tokio::time::sleep(DELAY * 3).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn each_change_restarts_the_timer() {
        let debouncer = Debouncer::new(0_u32, DELAY);
        let rx = debouncer.subscribe();

        debouncer.set(1);
        tokio::time::sleep(Duration::from_millis(250)).await;
        debouncer.set(2);
        tokio::time::sleep(Duration::from_millis(250)).await;
        // 500ms since the first set, but only 250ms of quiet.
        assert_eq!(debouncer.current(), 0);
        assert_eq!(debouncer.pending(), 2);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*rx.borrow(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_quiet_periods_commit_separately() {
        let debouncer = Debouncer::new(0_u32, DELAY);

        debouncer.set(1);
        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(debouncer.current(), 1);

        debouncer.set(2);
        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(debouncer.current(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_commits_immediately_and_drops_pending() {
        let debouncer = Debouncer::new(String::from("abc"), DELAY);
        debouncer.set("abcd".into());
        tokio::time::sleep(Duration::from_millis(100)).await;

        debouncer.reset(String::new());
        assert_eq!(debouncer.current(), "");
        assert_eq!(debouncer.pending(), "");

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(debouncer.current(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_pending_input() {
        let debouncer = Debouncer::new(0_u32, DELAY);
        debouncer.set(5);
        debouncer.shutdown();
        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(debouncer.current(), 0);
    }
}
