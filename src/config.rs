//! Facade configuration
//!
//! [`FacadeConfig`] carries the connection URL, the database name, an optional
//! collection the facade is bound to, and driver pool settings. It can be
//! built in code, read from environment variables, or parsed from TOML.
//!
//! # Example
//!
//! ```rust
//! use mongo_facade::FacadeConfig;
//!
//! let config = FacadeConfig::new("mongodb://localhost:27017", "shop")
//!     .with_collection("orders")
//!     .with_max_pool_size(20);
//!
//! assert_eq!(config.db(), "shop");
//! assert_eq!(config.collection(), Some("orders"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FacadeError, Result};

/// Prefix used by [`FacadeConfig::from_env`]
pub const DEFAULT_ENV_PREFIX: &str = "MONGO_FACADE_";

/// Connection settings for a facade
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeConfig {
	#[serde(default)]
	url: String,
	#[serde(default)]
	db: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	collection: Option<String>,
	#[serde(default)]
	pool: PoolConfig,
}

/// Driver connection pool settings
///
/// Unset values leave the driver defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_pool_size: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_pool_size: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_idle_time_secs: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub server_selection_timeout_secs: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app_name: Option<String>,
}

impl PoolConfig {
	/// `max_idle_time_secs` as a duration
	pub fn max_idle_time(&self) -> Option<Duration> {
		self.max_idle_time_secs.map(Duration::from_secs)
	}

	/// `server_selection_timeout_secs` as a duration
	pub fn server_selection_timeout(&self) -> Option<Duration> {
		self.server_selection_timeout_secs.map(Duration::from_secs)
	}
}

impl FacadeConfig {
	/// Create a configuration for the given URL and database
	pub fn new(url: impl Into<String>, db: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			db: db.into(),
			collection: None,
			pool: PoolConfig::default(),
		}
	}

	/// Bind the facade to a single collection
	pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
		self.collection = Some(collection.into());
		self
	}

	/// Replace the pool settings
	pub fn with_pool(mut self, pool: PoolConfig) -> Self {
		self.pool = pool;
		self
	}

	/// Set the maximum connection pool size
	pub fn with_max_pool_size(mut self, size: u32) -> Self {
		self.pool.max_pool_size = Some(size);
		self
	}

	/// Set the minimum connection pool size
	pub fn with_min_pool_size(mut self, size: u32) -> Self {
		self.pool.min_pool_size = Some(size);
		self
	}

	/// Set the maximum idle time for pooled connections in seconds
	pub fn with_max_idle_time_secs(mut self, secs: u64) -> Self {
		self.pool.max_idle_time_secs = Some(secs);
		self
	}

	/// Set how long the driver waits for a suitable server in seconds
	pub fn with_server_selection_timeout_secs(mut self, secs: u64) -> Self {
		self.pool.server_selection_timeout_secs = Some(secs);
		self
	}

	/// Set the application name reported to the server
	pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
		self.pool.app_name = Some(name.into());
		self
	}

	/// The connection URL
	pub fn url(&self) -> &str {
		&self.url
	}

	/// The database name
	pub fn db(&self) -> &str {
		&self.db
	}

	/// The bound collection, if one is configured
	///
	/// An empty name counts as unset, whichever source it came from.
	pub fn collection(&self) -> Option<&str> {
		self.collection.as_deref().filter(|name| !name.is_empty())
	}

	/// Driver pool settings
	pub fn pool(&self) -> &PoolConfig {
		&self.pool
	}

	/// Check that both `url` and `db` are set
	///
	/// # Example
	///
	/// ```rust
	/// use mongo_facade::FacadeConfig;
	///
	/// assert!(FacadeConfig::new("mongodb://localhost:27017", "").validate().is_err());
	/// assert!(FacadeConfig::new("mongodb://localhost:27017", "app").validate().is_ok());
	/// ```
	pub fn validate(&self) -> Result<()> {
		let mut missing = Vec::new();
		if self.url.is_empty() {
			missing.push("url");
		}
		if self.db.is_empty() {
			missing.push("db");
		}

		if missing.is_empty() {
			Ok(())
		} else {
			Err(FacadeError::Configuration(format!(
				"connection url and database name are required (missing: {})",
				missing.join(", ")
			)))
		}
	}

	/// Read the configuration from `MONGO_FACADE_*` environment variables
	///
	/// Recognized keys: `URL`, `DB`, `COLLECTION`, `MAX_POOL_SIZE`,
	/// `MIN_POOL_SIZE`, `MAX_IDLE_TIME_SECS`, `SERVER_SELECTION_TIMEOUT_SECS`
	/// and `APP_NAME`. Missing variables stay unset; validation happens when
	/// a facade is constructed.
	pub fn from_env() -> Result<Self> {
		Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
	}

	/// Read the configuration from environment variables with a custom prefix
	pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
		Self::from_lookup(prefix, |key| std::env::var(key).ok())
	}

	/// Build the configuration from an arbitrary key lookup
	pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(&format!("{}{}", prefix, key)).filter(|v| !v.is_empty());

		let pool = PoolConfig {
			max_pool_size: parse_number(prefix, "MAX_POOL_SIZE", get("MAX_POOL_SIZE"))?,
			min_pool_size: parse_number(prefix, "MIN_POOL_SIZE", get("MIN_POOL_SIZE"))?,
			max_idle_time_secs: parse_number(
				prefix,
				"MAX_IDLE_TIME_SECS",
				get("MAX_IDLE_TIME_SECS"),
			)?,
			server_selection_timeout_secs: parse_number(
				prefix,
				"SERVER_SELECTION_TIMEOUT_SECS",
				get("SERVER_SELECTION_TIMEOUT_SECS"),
			)?,
			app_name: get("APP_NAME"),
		};

		Ok(Self {
			url: get("URL").unwrap_or_default(),
			db: get("DB").unwrap_or_default(),
			collection: get("COLLECTION"),
			pool,
		})
	}

	/// Parse the configuration from TOML text
	///
	/// # Example
	///
	/// ```rust
	/// use mongo_facade::FacadeConfig;
	///
	/// let config = FacadeConfig::from_toml_str(r#"
	///     url = "mongodb://localhost:27017"
	///     db = "shop"
	///
	///     [pool]
	///     max_pool_size = 50
	/// "#).unwrap();
	///
	/// assert_eq!(config.pool().max_pool_size, Some(50));
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Read and parse a TOML configuration file
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|e| {
			FacadeError::Configuration(format!("failed to read {}: {}", path.display(), e))
		})?;
		Self::from_toml_str(&source)
	}
}

fn parse_number<T>(prefix: &str, key: &str, value: Option<String>) -> Result<Option<T>>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	value
		.map(|raw| {
			raw.trim().parse::<T>().map_err(|e| {
				FacadeError::Configuration(format!("invalid value for {}{}: {}", prefix, key, e))
			})
		})
		.transpose()
}
