//! Debounced search input.
//!
//! Keystrokes are fed to a [`Debouncer`]; a query is released only after the
//! input has been quiet for the whole window. Each new keystroke restarts the
//! window, so only the latest query of a burst is released.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Trailing-edge debouncer running on its own task.
#[derive(Debug)]
pub struct Debouncer<T> {
	input: mpsc::UnboundedSender<T>,
	task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
	/// Starts a debouncer; settled values arrive on the returned receiver.
	pub fn spawn(window: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
		let (input, mut pending_rx) = mpsc::unbounded_channel::<T>();
		let (output, settled_rx) = mpsc::unbounded_channel::<T>();

		let task = tokio::spawn(async move {
			let mut pending: Option<T> = None;
			loop {
				match pending.take() {
					None => match pending_rx.recv().await {
						Some(value) => pending = Some(value),
						None => break,
					},
					Some(value) => {
						tokio::select! {
							next = pending_rx.recv() => match next {
								Some(newer) => pending = Some(newer),
								// Input gone: the view closed, drop the pending query
								None => break,
							},
							_ = tokio::time::sleep(window) => {
								if output.send(value).is_err() {
									break;
								}
							}
						}
					}
				}
			}
		});

		(Self { input, task }, settled_rx)
	}

	/// Feeds a new value, restarting the quiet window.
	pub fn trigger(&self, value: T) {
		if self.input.send(value).is_err() {
			tracing::debug!("Debouncer task has stopped, input dropped");
		}
	}
}

impl<T> Drop for Debouncer<T> {
	fn drop(&mut self) {
		self.task.abort();
	}
}
