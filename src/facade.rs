//! The unbound CRUD facade
//!
//! [`DataAccessFacade`] owns one shared connection and shapes every call
//! before forwarding it: `_id` coercion on search parameters, option
//! mapping, single-document wrapping for inserts and `$set` wrapping for
//! updates.
//!
//! # Example
//!
//! ```rust,no_run
//! use bson::doc;
//! use mongo_facade::{DataAccessFacade, FacadeConfig, QueryOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let facade = DataAccessFacade::new(FacadeConfig::new("mongodb://localhost:27017", "shop"))?;
//!
//! facade.insert("orders", doc! { "item": "lamp", "qty": 2 }).await?;
//! let recent = facade
//!     .find("orders", doc! { "item": "lamp" }, QueryOptions::new().limit(10))
//!     .await?;
//! facade
//!     .update("orders", doc! { "item": "lamp" }, doc! { "status": "shipped" }, Default::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use bson::Document;
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::backends::mongodb::{MongoConnector, MongoStore};
use crate::bound::BoundFacade;
use crate::config::FacadeConfig;
use crate::connection::SharedConnection;
use crate::error::{FacadeError, Result};
use crate::identifier::{coerce_id, generate_id};
use crate::options::{QueryOptions, WriteOptions};
use crate::store::{Connector, DocumentStore};
use crate::types::{BulkInsertResult, DeleteResult, Documents, InsertResult, UpdateResult};
use crate::update::normalize_update;

/// CRUD facade over a lazily established connection
///
/// Cloning is cheap; clones share configuration and connection.
#[derive(Debug, Clone)]
pub struct DataAccessFacade {
	config: Arc<FacadeConfig>,
	connection: SharedConnection,
}

impl DataAccessFacade {
	/// Create a facade connecting to MongoDB
	///
	/// Fails with [`FacadeError::Configuration`] when `url` or `db` is
	/// missing. The connection attempt starts immediately in the background.
	pub fn new(config: FacadeConfig) -> Result<Self> {
		Self::with_connector(config, MongoConnector)
	}

	/// Create a facade using a custom connector
	pub fn with_connector<C>(config: FacadeConfig, connector: C) -> Result<Self>
	where
		C: Connector,
	{
		config.validate()?;
		let config = Arc::new(config);
		let connection = SharedConnection::establish(connector, Arc::clone(&config));

		Ok(Self { config, connection })
	}

	/// Generate a fresh identifier
	pub fn random_id() -> ObjectId {
		generate_id()
	}

	pub fn config(&self) -> &FacadeConfig {
		&self.config
	}

	/// Whether the connection has been established
	pub fn is_connected(&self) -> bool {
		self.connection.is_established()
	}

	/// The live driver client, once a MongoDB connection is established
	pub fn client(&self) -> Option<mongodb::Client> {
		match self.connection.peek() {
			Some(Ok(store)) => store
				.as_any()
				.downcast_ref::<MongoStore>()
				.map(|store| store.client().clone()),
			_ => None,
		}
	}

	/// Wait for the connection and return its store
	pub async fn store(&self) -> Result<Arc<dyn DocumentStore>> {
		self.connection.get().await
	}

	/// A facade bound to `collection`
	pub fn bind(&self, collection: impl Into<String>) -> BoundFacade {
		BoundFacade::from_facade(self.clone(), collection)
	}

	/// A facade bound to the configured collection, if one is set
	pub fn bound(&self) -> Option<BoundFacade> {
		self.config.collection().map(|name| self.bind(name))
	}

	/// Check connectivity
	pub async fn ping(&self) -> Result<()> {
		self.store().await?.ping().await
	}

	/// Find documents matching `search`
	pub async fn find(
		&self,
		collection: &str,
		mut search: Document,
		options: QueryOptions,
	) -> Result<Vec<Document>> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "find");
		store.find(collection, search, options).await
	}

	/// The first document matching `search`, or `None`
	pub async fn find_one(
		&self,
		collection: &str,
		search: Document,
		options: QueryOptions,
	) -> Result<Option<Document>> {
		let documents = self.find(collection, search, options).await?;
		Ok(documents.into_iter().next())
	}

	/// Count documents matching `search`
	pub async fn count(
		&self,
		collection: &str,
		mut search: Document,
		options: QueryOptions,
	) -> Result<u64> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "count");
		store.count(collection, search, options).await
	}

	/// Insert one document or a sequence of documents
	pub async fn insert(
		&self,
		collection: &str,
		documents: impl Into<Documents>,
	) -> Result<InsertResult> {
		let documents = documents.into().into_vec();
		let store = self.store().await?;
		tracing::trace!(collection = %collection, count = documents.len(), "insert");
		store.insert_many(collection, documents).await
	}

	/// Insert documents as an unordered batch
	///
	/// Fails with [`FacadeError::InvalidArgument`] before touching the
	/// connection when `documents` is `None`.
	pub async fn bulk_insert(
		&self,
		collection: &str,
		documents: Option<Vec<Document>>,
	) -> Result<BulkInsertResult> {
		let documents = documents.ok_or_else(|| {
			FacadeError::InvalidArgument("empty documents list for inserting".to_string())
		})?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, count = documents.len(), "bulk insert");
		store.bulk_insert(collection, documents).await
	}

	/// Update every match, wrapping plain payloads in `$set`
	pub async fn update(
		&self,
		collection: &str,
		mut search: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		coerce_id(&mut search)?;
		let update = normalize_update(update);
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "update");
		store.update_many(collection, search, update, options).await
	}

	/// Update the first match, wrapping plain payloads in `$set`
	pub async fn update_one(
		&self,
		collection: &str,
		mut search: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		coerce_id(&mut search)?;
		let update = normalize_update(update);
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "update one");
		store.update_one(collection, search, update, options).await
	}

	/// Replace every match with `replacement` as given
	pub async fn replace(
		&self,
		collection: &str,
		mut search: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "replace");
		store
			.replace_many(collection, search, replacement, options)
			.await
	}

	/// Replace the first match with `replacement` as given
	pub async fn replace_one(
		&self,
		collection: &str,
		mut search: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "replace one");
		store
			.replace_one(collection, search, replacement, options)
			.await
	}

	/// Delete every match
	pub async fn remove(
		&self,
		collection: &str,
		mut search: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "remove");
		store.delete_many(collection, search, options).await
	}

	/// Delete the first match
	pub async fn remove_one(
		&self,
		collection: &str,
		mut search: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		coerce_id(&mut search)?;
		let store = self.store().await?;
		tracing::trace!(collection = %collection, "remove one");
		store.delete_one(collection, search, options).await
	}
}
