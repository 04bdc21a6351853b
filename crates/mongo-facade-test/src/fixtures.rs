//! MongoDB container fixture

use rstest::*;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ImageExt, TestcontainersError};

pub use testcontainers::{ContainerAsync, GenericImage};

const MONGO_TAG: &str = "7.0";
const MONGO_PORT: u16 = 27017;
const STARTUP_ATTEMPTS: u32 = 3;

/// Start a MongoDB container, retrying transient Docker failures
///
/// Returns the container with a `mongodb://` URL for its mapped port, or the
/// error of the last attempt.
pub async fn start_mongodb(
	attempts: u32,
) -> Result<(ContainerAsync<GenericImage>, String), TestcontainersError> {
	let mut attempt = 1;
	loop {
		let started = async {
			let container = GenericImage::new("mongo", MONGO_TAG)
				.with_exposed_port(MONGO_PORT.tcp())
				.with_wait_for(WaitFor::message_on_stdout("Waiting for connections"))
				.with_startup_timeout(Duration::from_secs(60))
				.start()
				.await?;
			let port = container.get_host_port_ipv4(MONGO_PORT).await?;
			Ok::<_, TestcontainersError>((container, format!("mongodb://127.0.0.1:{}", port)))
		}
		.await;

		match started {
			Err(err) if attempt < attempts => {
				eprintln!("mongo:{} did not start (attempt {}): {}", MONGO_TAG, attempt, err);
				attempt += 1;
				tokio::time::sleep(Duration::from_secs(2)).await;
			}
			result => return result,
		}
	}
}

/// Fixture providing a MongoDB container and its connection URL
///
/// Keep the container alive for the duration of the test.
///
/// # Examples
///
/// ```ignore
/// use mongo_facade_test::fixtures::{ContainerAsync, GenericImage, mongodb_container};
/// use rstest::*;
///
/// #[rstest]
/// #[tokio::test]
/// async fn test_with_mongodb(
///     #[future] mongodb_container: (ContainerAsync<GenericImage>, String),
/// ) {
///     let (_container, url) = mongodb_container.await;
/// }
/// ```
#[fixture]
pub async fn mongodb_container() -> (ContainerAsync<GenericImage>, String) {
	match start_mongodb(STARTUP_ATTEMPTS).await {
		Ok(started) => started,
		Err(err) => panic!("mongo:{} failed to start: {}", MONGO_TAG, err),
	}
}
