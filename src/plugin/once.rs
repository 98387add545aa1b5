//! Once-initialized handle with single-flight construction.
//!
//! The first caller starts construction on a spawned task; everyone arriving
//! before it finishes awaits the same shared future, and everyone after gets
//! the stored result. Construction keeps running even if every caller drops
//! its future, so its side effects always land.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use tokio::sync::Mutex;
use tokio::task::JoinError;

type SharedInit<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

enum State<T, E> {
	NotStarted,
	InFlight(SharedInit<T, E>),
	Ready(Result<T, E>),
}

pub struct OnceHandle<T, E> {
	state: Mutex<State<T, E>>,
}

impl<T, E> Default for OnceHandle<T, E> {
	fn default() -> Self {
		Self {
			state: Mutex::new(State::NotStarted),
		}
	}
}

impl<T, E> OnceHandle<T, E>
where
	T: Clone + Send + Sync + 'static,
	E: Clone + Send + Sync + From<JoinError> + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// The stored result, running `init` only if nothing has started yet.
	///
	/// Failures are stored like successes and handed to every later caller.
	pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<T, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
	{
		let pending = {
			let mut state = self.state.lock().await;
			match &*state {
				State::Ready(result) => return result.clone(),
				State::InFlight(pending) => pending.clone(),
				State::NotStarted => {
					let task = tokio::spawn(init());
					let pending = async move { task.await.unwrap_or_else(|e| Err(E::from(e))) }
						.boxed()
						.shared();
					*state = State::InFlight(pending.clone());
					pending
				}
			}
		};

		let result = pending.await;
		let mut state = self.state.lock().await;
		if matches!(*state, State::InFlight(_)) {
			*state = State::Ready(result.clone());
		}
		result
	}

	/// The result if construction has finished, without starting it.
	pub async fn get(&self) -> Option<Result<T, E>> {
		let pending = match &*self.state.lock().await {
			State::NotStarted => return None,
			State::Ready(result) => return Some(result.clone()),
			State::InFlight(pending) => pending.clone(),
		};
		pending.peek().cloned()
	}

	pub async fn is_started(&self) -> bool {
		!matches!(*self.state.lock().await, State::NotStarted)
	}
}
