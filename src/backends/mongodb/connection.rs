//! MongoDB connection and store implementation
//!
//! [`MongoConnector`] opens a [`MongoStore`] from a [`FacadeConfig`]. The
//! store forwards every shaped request to the driver and surfaces driver
//! failures unchanged.

use async_trait::async_trait;
use bson::{Document, doc};
use futures::stream::TryStreamExt;
use mongodb::options::{ClientOptions, InsertManyOptions};
use mongodb::{Client, Collection, Database};
use std::sync::Arc;

use crate::config::FacadeConfig;
use crate::error::{FacadeError, Result};
use crate::options::{QueryOptions, WriteOptions};
use crate::store::{Connector, DocumentStore};
use crate::types::{BulkInsertResult, DeleteResult, InsertResult, UpdateResult, ordered_ids};
use crate::update::replacement_pipeline;

/// Connector for a real MongoDB deployment
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
	async fn connect(&self, config: &FacadeConfig) -> Result<Arc<dyn DocumentStore>> {
		let store = MongoStore::open(config).await?;
		Ok(Arc::new(store))
	}
}

/// An established MongoDB session scoped to one database
///
/// Supports connection pooling, replica sets, and sharded clusters through
/// the driver.
#[derive(Clone)]
pub struct MongoStore {
	client: Client,
	database: Database,
}

/// Parse the connection URL and apply the configured pool settings
pub async fn client_options(config: &FacadeConfig) -> Result<ClientOptions> {
	let mut options = ClientOptions::parse(config.url())
		.await
		.map_err(|e| FacadeError::Connection(e.to_string()))?;

	let pool = config.pool();
	if let Some(max_size) = pool.max_pool_size {
		options.max_pool_size = Some(max_size);
	}
	if let Some(min_size) = pool.min_pool_size {
		options.min_pool_size = Some(min_size);
	}
	if let Some(idle_time) = pool.max_idle_time() {
		options.max_idle_time = Some(idle_time);
	}
	if let Some(timeout) = pool.server_selection_timeout() {
		options.server_selection_timeout = Some(timeout);
	}
	if let Some(app_name) = &pool.app_name {
		options.app_name = Some(app_name.clone());
	}

	Ok(options)
}

impl MongoStore {
	/// Build a client for `config` and verify it with a ping
	pub async fn open(config: &FacadeConfig) -> Result<Self> {
		tracing::debug!(database = %config.db(), "connecting to MongoDB");

		let options = client_options(config).await?;
		let client = Client::with_options(options)
			.map_err(|e| FacadeError::Connection(e.to_string()))?;
		let database = client.database(config.db());

		database
			.run_command(doc! { "ping": 1 })
			.await
			.map_err(|e| FacadeError::Connection(e.to_string()))?;

		tracing::debug!(database = %config.db(), "MongoDB connection established");
		Ok(Self { client, database })
	}

	/// Wrap an existing client
	pub fn from_client(client: Client, database_name: &str) -> Self {
		let database = client.database(database_name);
		Self { client, database }
	}

	/// The live driver client
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// The database handle this store operates on
	pub fn database(&self) -> &Database {
		&self.database
	}

	/// A typed-as-document handle to a collection
	pub fn collection(&self, name: &str) -> Collection<Document> {
		self.database.collection::<Document>(name)
	}
}

fn convert_update(result: mongodb::results::UpdateResult) -> UpdateResult {
	UpdateResult::new(result.matched_count, result.modified_count, result.upserted_id)
}

#[async_trait]
impl DocumentStore for MongoStore {
	async fn find(
		&self,
		collection: &str,
		filter: Document,
		options: QueryOptions,
	) -> Result<Vec<Document>> {
		let cursor = self
			.collection(collection)
			.find(filter)
			.with_options(options.to_find_options())
			.await?;

		let documents: Vec<Document> = cursor.try_collect().await?;
		Ok(documents)
	}

	async fn count(
		&self,
		collection: &str,
		filter: Document,
		options: QueryOptions,
	) -> Result<u64> {
		Ok(self
			.collection(collection)
			.count_documents(filter)
			.with_options(options.to_count_options())
			.await?)
	}

	async fn insert_many(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> Result<InsertResult> {
		let result = self.collection(collection).insert_many(documents).await?;

		Ok(InsertResult::new(ordered_ids(result.inserted_ids)))
	}

	async fn bulk_insert(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> Result<BulkInsertResult> {
		let mut options = InsertManyOptions::default();
		options.ordered = Some(false);

		let result = self
			.collection(collection)
			.insert_many(documents)
			.with_options(options)
			.await?;

		Ok(BulkInsertResult::new(ordered_ids(result.inserted_ids)))
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		let result = self
			.collection(collection)
			.update_one(filter, update)
			.with_options(options.to_update_options())
			.await?;

		Ok(convert_update(result))
	}

	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		let result = self
			.collection(collection)
			.update_many(filter, update)
			.with_options(options.to_update_options())
			.await?;

		Ok(convert_update(result))
	}

	async fn replace_one(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		let result = self
			.collection(collection)
			.replace_one(filter, replacement)
			.with_options(options.to_replace_options())
			.await?;

		Ok(convert_update(result))
	}

	async fn replace_many(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		// Replacement documents cannot target many; a pipeline update can.
		let result = self
			.collection(collection)
			.update_many(filter, replacement_pipeline(replacement))
			.with_options(options.to_update_options())
			.await?;

		Ok(convert_update(result))
	}

	async fn delete_one(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		let result = self
			.collection(collection)
			.delete_one(filter)
			.with_options(options.to_delete_options())
			.await?;

		Ok(DeleteResult::new(result.deleted_count))
	}

	async fn delete_many(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		let result = self
			.collection(collection)
			.delete_many(filter)
			.with_options(options.to_delete_options())
			.await?;

		Ok(DeleteResult::new(result.deleted_count))
	}

	async fn ping(&self) -> Result<()> {
		self.database.run_command(doc! { "ping": 1 }).await?;
		Ok(())
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}
