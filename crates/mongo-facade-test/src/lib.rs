//! # mongo-facade-test
//!
//! Test utilities for mongo-facade:
//!
//! - [`MemoryStore`]: an in-memory [`DocumentStore`](mongo_facade::DocumentStore)
//!   that records every forwarded call
//! - [`CountingConnector`]: a connector that counts attempts and can be
//!   delayed, gated, or made to fail
//! - `fixtures` (feature `testcontainers`): a MongoDB container fixture

pub mod connector;
pub mod memory;

#[cfg(feature = "testcontainers")]
pub mod fixtures;

pub use connector::{ConnectGate, CountingConnector};
pub use memory::{MemoryStore, StoreCall};
