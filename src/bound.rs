//! Collection-bound facade
//!
//! [`BoundFacade`] pairs a [`DataAccessFacade`] with a fixed collection name,
//! so calls omit the collection argument.
//!
//! # Example
//!
//! ```rust,no_run
//! use bson::doc;
//! use mongo_facade::{BoundFacade, FacadeConfig, QueryOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = BoundFacade::new(
//!     FacadeConfig::new("mongodb://localhost:27017", "app").with_collection("users"),
//! )?;
//!
//! let admins = users.find(doc! { "role": "admin" }, QueryOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

use bson::Document;

use crate::backends::mongodb::MongoConnector;
use crate::config::FacadeConfig;
use crate::error::{FacadeError, Result};
use crate::facade::DataAccessFacade;
use crate::options::{QueryOptions, WriteOptions};
use crate::store::Connector;
use crate::types::{BulkInsertResult, DeleteResult, Documents, InsertResult, UpdateResult};

/// A facade whose operations target one collection
#[derive(Debug, Clone)]
pub struct BoundFacade {
	facade: DataAccessFacade,
	collection: String,
}

impl BoundFacade {
	/// Create a bound facade from a configuration naming a collection
	///
	/// Fails with [`FacadeError::Configuration`] when `url` or `db` is missing,
	/// or when no collection is configured.
	pub fn new(config: FacadeConfig) -> Result<Self> {
		Self::with_connector(config, MongoConnector)
	}

	/// Like [`new`](Self::new), with a custom connector
	///
	/// The configuration is fully checked before any connection is attempted.
	pub fn with_connector<C>(config: FacadeConfig, connector: C) -> Result<Self>
	where
		C: Connector,
	{
		let Some(collection) = config.collection().map(str::to_string) else {
			return Err(FacadeError::Configuration(
				"a collection name is required for a bound facade".to_string(),
			));
		};
		let facade = DataAccessFacade::with_connector(config, connector)?;
		Ok(Self::from_facade(facade, collection))
	}

	pub(crate) fn from_facade(facade: DataAccessFacade, collection: impl Into<String>) -> Self {
		Self {
			facade,
			collection: collection.into(),
		}
	}

	/// The bound collection name
	pub fn collection(&self) -> &str {
		&self.collection
	}

	/// The underlying unbound facade
	pub fn facade(&self) -> &DataAccessFacade {
		&self.facade
	}

	pub async fn find(&self, search: Document, options: QueryOptions) -> Result<Vec<Document>> {
		self.facade.find(&self.collection, search, options).await
	}

	pub async fn find_one(
		&self,
		search: Document,
		options: QueryOptions,
	) -> Result<Option<Document>> {
		self.facade.find_one(&self.collection, search, options).await
	}

	pub async fn count(&self, search: Document, options: QueryOptions) -> Result<u64> {
		self.facade.count(&self.collection, search, options).await
	}

	pub async fn insert(&self, documents: impl Into<Documents>) -> Result<InsertResult> {
		self.facade.insert(&self.collection, documents).await
	}

	pub async fn bulk_insert(&self, documents: Option<Vec<Document>>) -> Result<BulkInsertResult> {
		self.facade.bulk_insert(&self.collection, documents).await
	}

	pub async fn update(
		&self,
		search: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		self.facade
			.update(&self.collection, search, update, options)
			.await
	}

	pub async fn update_one(
		&self,
		search: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		self.facade
			.update_one(&self.collection, search, update, options)
			.await
	}

	pub async fn replace(
		&self,
		search: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		self.facade
			.replace(&self.collection, search, replacement, options)
			.await
	}

	pub async fn replace_one(
		&self,
		search: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		self.facade
			.replace_one(&self.collection, search, replacement, options)
			.await
	}

	pub async fn remove(&self, search: Document, options: WriteOptions) -> Result<DeleteResult> {
		self.facade.remove(&self.collection, search, options).await
	}

	pub async fn remove_one(
		&self,
		search: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		self.facade.remove_one(&self.collection, search, options).await
	}
}
