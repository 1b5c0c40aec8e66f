//! Quiet-period sampling of raw input

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// Propagates the latest input once no new input arrived for `delay`
///
/// Every new input restarts the timer, so a burst of keystrokes yields a
/// single output: the last value. Dropping the debouncer stops its task.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Must be called inside a tokio runtime
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);

        let task = tokio::spawn(async move {
            while input_rx.changed().await.is_ok() {
                // Wait out the quiet period, restarting on every change
                loop {
                    tokio::select! {
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }

                let latest = input_rx.borrow_and_update().clone();
                output_tx.send_if_modified(|current| {
                    if *current == latest {
                        false
                    } else {
                        *current = latest;
                        true
                    }
                });
                trace!("Debounced value published");
            }
        });

        Self {
            input,
            output,
            task,
        }
    }

    /// Record raw input
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Latest raw input, before debouncing
    pub fn raw(&self) -> T {
        self.input.borrow().clone()
    }

    /// Latest debounced value
    pub fn value(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver notified on each debounced change
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
