//! Cancellable fetches tied to a view.
//!
//! A [`FetchScope`] lives as long as the view that issued the requests.
//! Closing it (or dropping it, or restarting it for a newer query) cancels
//! the requests in flight; a result that arrives afterwards is discarded and
//! never reaches the view.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct FetchScope {
	token: CancellationToken,
}

impl FetchScope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs `fut` to completion unless the scope is cancelled first.
	///
	/// Returns `None` when the scope was cancelled before or while the
	/// future ran.
	pub async fn run<F>(&self, fut: F) -> Option<F::Output>
	where
		F: Future,
	{
		run_until_cancelled(self.token.clone(), fut).await
	}

	/// Spawns `fut` on the runtime under this scope.
	pub fn spawn<F>(&self, fut: F) -> JoinHandle<Option<F::Output>>
	where
		F: Future + Send + 'static,
		F::Output: Send + 'static,
	{
		tokio::spawn(run_until_cancelled(self.token.clone(), fut))
	}

	/// Cancels everything issued so far and starts a fresh scope.
	///
	/// Used when a newer query supersedes the one in flight.
	pub fn restart(&mut self) {
		self.token.cancel();
		self.token = CancellationToken::new();
	}

	pub fn close(&self) {
		self.token.cancel();
	}

	pub fn is_closed(&self) -> bool {
		self.token.is_cancelled()
	}
}

impl Drop for FetchScope {
	fn drop(&mut self) {
		self.token.cancel();
	}
}

async fn run_until_cancelled<F: Future>(token: CancellationToken, fut: F) -> Option<F::Output> {
	tokio::select! {
		biased;
		_ = token.cancelled() => None,
		output = fut => {
			// A result that raced with cancellation is stale
			if token.is_cancelled() {
				None
			} else {
				Some(output)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_result_delivered_while_open() {
		let scope = FetchScope::new();
		assert_eq!(scope.run(async { 7 }).await, Some(7));
	}

	#[tokio::test(start_paused = true)]
	async fn test_dropped_scope_discards_late_result() {
		let scope = FetchScope::new();
		let handle = scope.spawn(async {
			tokio::time::sleep(Duration::from_secs(5)).await;
			"late"
		});

		drop(scope);
		assert_eq!(handle.await.unwrap(), None);
	}

	#[tokio::test(start_paused = true)]
	async fn test_restart_supersedes_older_fetch() {
		let mut scope = FetchScope::new();
		let old = scope.spawn(async {
			tokio::time::sleep(Duration::from_millis(500)).await;
			"old"
		});

		scope.restart();
		let new = scope.spawn(async {
			tokio::time::sleep(Duration::from_millis(100)).await;
			"new"
		});

		assert_eq!(old.await.unwrap(), None);
		assert_eq!(new.await.unwrap(), Some("new"));
		assert!(!scope.is_closed());
	}

	#[tokio::test]
	async fn test_closed_scope_runs_nothing() {
		let scope = FetchScope::new();
		scope.close();
		assert!(scope.is_closed());
		assert_eq!(scope.run(async { 1 }).await, None);
	}
}
