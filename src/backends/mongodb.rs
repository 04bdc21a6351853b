//! MongoDB backend module
//!
//! This module provides the [`DocumentStore`](crate::store::DocumentStore)
//! implementation over the official driver:
//! - Connection setup from [`FacadeConfig`](crate::FacadeConfig), including pool settings
//! - Collection operations forwarded to the driver unchanged
//!
//! # Example
//!
//! ```rust,no_run
//! use mongo_facade::backends::mongodb::MongoStore;
//! use mongo_facade::FacadeConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FacadeConfig::new("mongodb://localhost:27017", "myapp");
//! let store = MongoStore::open(&config).await?;
//! let users = store.collection("users");
//! # Ok(())
//! # }
//! ```

pub mod connection;

pub use connection::{MongoConnector, MongoStore};
