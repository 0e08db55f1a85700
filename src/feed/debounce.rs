//! Debounced input (search boxes).

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A value that is only published after `delay` without further changes.
///
/// Every `set` restarts the timer. Dropping the `Debounced` cancels any
/// pending publish.
pub struct Debounced<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Must be called from within a Tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut pending) = watch::channel(initial.clone());
        let (publish, output) = watch::channel(initial);

        let task = tokio::spawn(async move {
            while pending.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        changed = pending.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                let settled = pending.borrow_and_update().clone();
                publish.send_replace(settled);
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    /// Record new raw input.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Latest settled value.
    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver notified on every settled value.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
