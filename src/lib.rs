//! # mongo-facade
//!
//! A thin CRUD facade over the MongoDB driver.
//!
//! The facade hides connection setup behind a single lazily established,
//! shared connection and shapes each request before forwarding it:
//!
//! - **Identifier coercion**: a truthy `_id` in search parameters becomes an `ObjectId`
//! - **Option mapping**: limit, skip, sort and projection, in that order
//! - **Insert wrapping**: a single document is inserted as a one-element sequence
//! - **Update wrapping**: plain update payloads are wrapped in `$set`
//!
//! Query execution, networking and result parsing stay with the driver.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use bson::doc;
//! use mongo_facade::{DataAccessFacade, FacadeConfig, QueryOptions};
//!
//! # async fn example() -> mongo_facade::Result<()> {
//! let facade = DataAccessFacade::new(FacadeConfig::new("mongodb://localhost:27017", "app"))?;
//!
//! // Both calls wait on the same connection attempt
//! let (users, total) = tokio::join!(
//!     facade.find("users", doc! { "active": true }, QueryOptions::new().limit(20)),
//!     facade.count("users", doc! {}, QueryOptions::new()),
//! );
//! # let _ = (users?, total?);
//!
//! // Bind a collection to drop the name from every call
//! let users = facade.bind("users");
//! users
//!     .update_one(
//!         doc! { "_id": "507f1f77bcf86cd799439011" },
//!         doc! { "active": false },
//!         Default::default(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `integration-tests` - Runs the live-server test suite against a MongoDB container

pub mod backends;
pub mod bound;
pub mod config;
pub mod connection;
pub mod error;
pub mod facade;
pub mod identifier;
pub mod options;
pub mod store;
pub mod types;
pub mod update;

pub use bound::BoundFacade;
pub use config::{FacadeConfig, PoolConfig};
pub use error::{FacadeError, Result};
pub use facade::DataAccessFacade;
pub use options::{QueryOptions, WriteOptions};
pub use store::{Connector, DocumentStore};
pub use types::{BulkInsertResult, DeleteResult, Documents, InsertResult, UpdateResult};

pub use bson;
pub use mongodb;
