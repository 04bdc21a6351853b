//! Driver seam
//!
//! The facade shapes requests and hands them to a [`DocumentStore`], which
//! owns execution. A [`Connector`] produces the store once per facade.
//! [`MongoConnector`](crate::backends::mongodb::MongoConnector) is the
//! production implementation.

use async_trait::async_trait;
use bson::Document;
use std::sync::Arc;

use crate::config::FacadeConfig;
use crate::error::Result;
use crate::options::{QueryOptions, WriteOptions};
use crate::types::{BulkInsertResult, DeleteResult, InsertResult, UpdateResult};

/// Collection-scoped primitives of an established connection
///
/// Filters and payloads arrive already shaped: `_id` coerced, `$set`
/// wrapping applied. Implementations forward them as given.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
	/// Find documents matching `filter`, applying `options`
	async fn find(
		&self,
		collection: &str,
		filter: Document,
		options: QueryOptions,
	) -> Result<Vec<Document>>;

	/// Count documents matching `filter`
	async fn count(&self, collection: &str, filter: Document, options: QueryOptions)
	-> Result<u64>;

	/// Insert documents in order
	async fn insert_many(&self, collection: &str, documents: Vec<Document>)
	-> Result<InsertResult>;

	/// Insert documents as an unordered batch
	async fn bulk_insert(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> Result<BulkInsertResult>;

	/// Apply an update-operator document to the first match
	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult>;

	/// Apply an update-operator document to every match
	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult>;

	/// Replace the first match with `replacement`
	async fn replace_one(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult>;

	/// Replace every match with `replacement`, keeping each `_id`
	async fn replace_many(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult>;

	/// Delete the first match
	async fn delete_one(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult>;

	/// Delete every match
	async fn delete_many(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult>;

	/// Check connectivity
	async fn ping(&self) -> Result<()>;

	/// Downcast support for backend-specific access
	fn as_any(&self) -> &dyn std::any::Any;
}

/// Establishes the connection behind a facade
#[async_trait]
pub trait Connector: Send + Sync + 'static {
	/// Open a connection for `config`
	///
	/// Called at most once per facade.
	async fn connect(&self, config: &FacadeConfig) -> Result<Arc<dyn DocumentStore>>;
}
