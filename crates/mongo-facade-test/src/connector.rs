//! Connector double for connection lifecycle tests

use async_trait::async_trait;
use mongo_facade::{Connector, DocumentStore, FacadeConfig, FacadeError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::memory::MemoryStore;

/// Holds connection attempts until opened
#[derive(Debug, Clone)]
pub struct ConnectGate {
	permits: Arc<Semaphore>,
}

impl ConnectGate {
	fn new() -> Self {
		Self {
			permits: Arc::new(Semaphore::new(0)),
		}
	}

	/// Let pending and future attempts proceed
	pub fn open(&self) {
		self.permits.add_permits(1);
	}
}

/// Connector that hands out a shared [`MemoryStore`]
///
/// Clones share the attempt counter, so a test can keep one clone while the
/// facade owns another.
#[derive(Clone)]
pub struct CountingConnector {
	store: Arc<MemoryStore>,
	attempts: Arc<AtomicUsize>,
	delay: Option<Duration>,
	gate: Option<ConnectGate>,
	failure: Option<String>,
}

impl CountingConnector {
	/// Connect immediately to `store`
	pub fn new(store: Arc<MemoryStore>) -> Self {
		Self {
			store,
			attempts: Arc::new(AtomicUsize::new(0)),
			delay: None,
			gate: None,
			failure: None,
		}
	}

	/// Connect after `delay`
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	/// Wait for the returned gate to open before connecting
	pub fn gated(mut self) -> (Self, ConnectGate) {
		let gate = ConnectGate::new();
		self.gate = Some(gate.clone());
		(self, gate)
	}

	/// Fail every attempt with a connection error carrying `message`
	pub fn failing(mut self, message: impl Into<String>) -> Self {
		self.failure = Some(message.into());
		self
	}

	/// Number of connection attempts made so far
	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn store(&self) -> &Arc<MemoryStore> {
		&self.store
	}
}

#[async_trait]
impl Connector for CountingConnector {
	async fn connect(&self, _config: &FacadeConfig) -> Result<Arc<dyn DocumentStore>> {
		self.attempts.fetch_add(1, Ordering::SeqCst);

		if let Some(gate) = &self.gate {
			let _permit = gate
				.permits
				.acquire()
				.await
				.map_err(|e| FacadeError::Connection(e.to_string()))?;
		}
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}

		match &self.failure {
			Some(message) => Err(FacadeError::Connection(message.clone())),
			None => Ok(Arc::clone(&self.store) as Arc<dyn DocumentStore>),
		}
	}
}
