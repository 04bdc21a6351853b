//! Facade error types
//!
//! A single error type covers construction, connection, argument validation
//! and driver failures.

use thiserror::Error;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, FacadeError>;

/// Unified error type for facade operations
///
/// The type is `Clone` so that one failed connection attempt can be handed
/// to every operation waiting on it.
#[derive(Debug, Clone, Error)]
pub enum FacadeError {
	/// Missing or malformed configuration
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// Connection establishment failed
	#[error("Connection error: {0}")]
	Connection(String),

	/// Malformed call arguments, rejected before any driver call
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Failure reported by the driver, passed through unchanged
	#[error(transparent)]
	Driver(#[from] mongodb::error::Error),
}

impl FacadeError {
	/// Returns `true` for configuration errors
	pub fn is_configuration(&self) -> bool {
		matches!(self, FacadeError::Configuration(_))
	}

	/// Returns `true` for connection errors
	pub fn is_connection(&self) -> bool {
		matches!(self, FacadeError::Connection(_))
	}

	/// Returns `true` for invalid argument errors
	pub fn is_invalid_argument(&self) -> bool {
		matches!(self, FacadeError::InvalidArgument(_))
	}

	/// The original driver error, if this is one
	pub fn as_driver(&self) -> Option<&mongodb::error::Error> {
		match self {
			FacadeError::Driver(err) => Some(err),
			_ => None,
		}
	}
}

impl From<toml::de::Error> for FacadeError {
	fn from(err: toml::de::Error) -> Self {
		FacadeError::Configuration(err.to_string())
	}
}
