//! Memoized connection establishment
//!
//! A [`SharedConnection`] wraps a single connection attempt in a shared
//! future. Every caller awaits the same attempt and observes the same
//! outcome, success or failure.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;

use crate::config::FacadeConfig;
use crate::error::{FacadeError, Result};
use crate::store::{Connector, DocumentStore};

type ConnectFuture = Shared<BoxFuture<'static, Result<Arc<dyn DocumentStore>>>>;

/// A connection attempt started once and shared by all operations
#[derive(Clone)]
pub struct SharedConnection {
	future: ConnectFuture,
}

impl SharedConnection {
	/// Start connecting
	///
	/// When called inside a Tokio runtime the attempt is spawned right away;
	/// otherwise it begins when the first caller awaits [`get`](Self::get).
	pub fn establish<C>(connector: C, config: Arc<FacadeConfig>) -> Self
	where
		C: Connector,
	{
		let future = async move {
			match connector.connect(&config).await {
				Ok(store) => Ok(store),
				Err(err @ FacadeError::Connection(_)) => Err(err),
				Err(other) => Err(FacadeError::Connection(other.to_string())),
			}
		}
		.boxed()
		.shared();

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(future.clone());
		}

		Self { future }
	}

	/// Wait for the connection
	pub async fn get(&self) -> Result<Arc<dyn DocumentStore>> {
		self.future.clone().await
	}

	/// The outcome, if the attempt has finished
	pub fn peek(&self) -> Option<&Result<Arc<dyn DocumentStore>>> {
		self.future.peek()
	}

	/// Whether the attempt finished successfully
	pub fn is_established(&self) -> bool {
		matches!(self.peek(), Some(Ok(_)))
	}
}

impl std::fmt::Debug for SharedConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = match self.peek() {
			None => "pending",
			Some(Ok(_)) => "established",
			Some(Err(_)) => "failed",
		};
		f.debug_struct("SharedConnection")
			.field("state", &state)
			.finish()
	}
}
