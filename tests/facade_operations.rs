//! CRUD Operation Tests
//!
//! Exercises request shaping and forwarding against the in-memory store.

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use mongo_facade::{DataAccessFacade, FacadeConfig, QueryOptions, WriteOptions};
use mongo_facade_test::{CountingConnector, MemoryStore, StoreCall};
use rstest::*;
use std::sync::Arc;

const RAW_ID: &str = "507f1f77bcf86cd799439011";

#[fixture]
fn store() -> Arc<MemoryStore> {
	Arc::new(MemoryStore::new())
}

#[fixture]
fn facade(store: Arc<MemoryStore>) -> (DataAccessFacade, Arc<MemoryStore>) {
	let config = FacadeConfig::new("mongodb://localhost:27017", "test_db");
	let connector = CountingConnector::new(Arc::clone(&store));
	let facade = DataAccessFacade::with_connector(config, connector).unwrap();
	(facade, store)
}

fn people() -> Vec<Document> {
	vec![
		doc! { "name": "ann", "age": 30, "team": "a" },
		doc! { "name": "bob", "age": 50, "team": "a" },
		doc! { "name": "cid", "age": 10, "team": "a" },
		doc! { "name": "dee", "age": 40, "team": "a" },
		doc! { "name": "eve", "age": 20, "team": "a" },
	]
}

fn names(documents: &[Document]) -> Vec<&str> {
	documents
		.iter()
		.map(|d| d.get_str("name").unwrap())
		.collect()
}

/// Test find applies limit, skip and sort
///
/// This test verifies that:
/// 1. Documents are ordered by the sort
/// 2. The first sorted document is skipped
/// 3. Exactly `limit` documents are returned
#[rstest]
#[tokio::test]
async fn test_find_with_limit_skip_sort(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	// Arrange
	let (facade, store) = facade;
	store.seed("people", people());
	let options = QueryOptions::from_document(&doc! {
		"limit": 2,
		"skip": 1,
		"sort": { "age": -1 },
	})
	.unwrap();

	// Act
	let found = facade
		.find("people", doc! { "team": "a" }, options)
		.await
		.unwrap();

	// Assert
	assert_eq!(names(&found), vec!["dee", "ann"]);
}

#[rstest]
#[tokio::test]
async fn test_find_forwards_options_unchanged(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	let options = QueryOptions::from_document(&doc! {
		"project": { "name": 1 },
		"maxTimeMS": 100,
	})
	.unwrap();

	facade
		.find("people", doc! {}, options)
		.await
		.unwrap();

	assert_eq!(
		store.last_call(),
		Some(StoreCall::Find {
			collection: "people".to_string(),
			filter: doc! {},
			options: QueryOptions::new().projection(doc! { "name": 1 }),
		})
	);
}

#[rstest]
#[tokio::test]
async fn test_find_applies_projection(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("people", people());

	let found = facade
		.find(
			"people",
			doc! { "name": "ann" },
			QueryOptions::new().projection(doc! { "name": 1, "_id": 0 }),
		)
		.await
		.unwrap();

	assert_eq!(found, vec![doc! { "name": "ann" }]);
}

/// Test `_id` coercion on search parameters
///
/// This test verifies that:
/// 1. A hex string `_id` reaches the store as an ObjectId
/// 2. The stored document is found by its string id
#[rstest]
#[tokio::test]
async fn test_find_coerces_string_id(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	// Arrange
	let (facade, store) = facade;
	let oid = ObjectId::parse_str(RAW_ID).unwrap();
	store.seed("people", [doc! { "_id": oid, "name": "ann" }]);

	// Act
	let found = facade
		.find("people", doc! { "_id": RAW_ID }, QueryOptions::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(names(&found), vec!["ann"]);
	let Some(StoreCall::Find { filter, .. }) = store.last_call() else {
		panic!("expected a find call");
	};
	assert_eq!(filter.get("_id"), Some(&Bson::ObjectId(oid)));
}

#[rstest]
#[tokio::test]
async fn test_falsy_id_is_forwarded_as_given(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;

	facade
		.count("people", doc! { "_id": 0 }, QueryOptions::new())
		.await
		.unwrap();

	let Some(StoreCall::Count { filter, .. }) = store.last_call() else {
		panic!("expected a count call");
	};
	assert_eq!(filter, doc! { "_id": 0 });
}

#[rstest]
#[tokio::test]
async fn test_invalid_id_fails_before_store_call(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;

	let err = facade
		.remove("people", doc! { "_id": "nope" }, WriteOptions::new())
		.await
		.unwrap_err();

	assert!(err.is_invalid_argument());
	assert!(store.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_find_one_returns_first_match(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("people", people());

	let found = facade
		.find_one(
			"people",
			doc! { "age": { "$gte": 30 } },
			QueryOptions::new().sort(doc! { "age": 1 }),
		)
		.await
		.unwrap();

	assert_eq!(found.unwrap().get_str("name").unwrap(), "ann");
}

#[rstest]
#[tokio::test]
async fn test_find_one_on_empty_result_is_none(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, _store) = facade;

	let found = facade
		.find_one("people", doc! { "name": "nobody" }, QueryOptions::new())
		.await
		.unwrap();

	assert!(found.is_none());
}

#[rstest]
#[tokio::test]
async fn test_count_matching_documents(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("people", people());

	let total = facade
		.count("people", doc! { "age": { "$lt": 35 } }, QueryOptions::new())
		.await
		.unwrap();
	let limited = facade
		.count("people", doc! {}, QueryOptions::new().skip(1).limit(2))
		.await
		.unwrap();

	assert_eq!(total, 3);
	assert_eq!(limited, 2);
}

/// Test single-document insert wrapping
///
/// This test verifies that:
/// 1. A single document is forwarded as a one-element sequence
/// 2. The forwarded call matches an explicit one-element insert
#[rstest]
#[tokio::test]
async fn test_insert_single_document_equals_one_element_sequence(
	facade: (DataAccessFacade, Arc<MemoryStore>),
) {
	// Arrange
	let (facade, store) = facade;
	let document = doc! { "_id": 1, "name": "ann" };

	// Act
	let single = facade.insert("people", document.clone()).await.unwrap();
	let single_call = store.last_call();
	facade.remove("people", doc! {}, WriteOptions::new()).await.unwrap();
	let sequence = facade.insert("people", vec![document.clone()]).await.unwrap();
	let sequence_call = store.last_call();

	// Assert
	assert_eq!(single, sequence);
	assert_eq!(single.inserted_ids, vec![Bson::Int32(1)]);
	assert_eq!(single_call, sequence_call);
	assert_eq!(
		single_call,
		Some(StoreCall::InsertMany {
			collection: "people".to_string(),
			documents: vec![document],
		})
	);
}

#[rstest]
#[tokio::test]
async fn test_insert_returns_generated_ids(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;

	let result = facade
		.insert("people", [doc! { "name": "a" }, doc! { "name": "b" }])
		.await
		.unwrap();

	assert_eq!(result.inserted_count(), 2);
	let stored: Vec<Bson> = store
		.documents("people")
		.iter()
		.map(|d| d.get("_id").cloned().unwrap())
		.collect();
	assert_eq!(result.inserted_ids, stored);
}

#[rstest]
#[tokio::test]
async fn test_bulk_insert_without_documents_is_invalid_argument(
	facade: (DataAccessFacade, Arc<MemoryStore>),
) {
	let (facade, store) = facade;

	let err = facade.bulk_insert("people", None).await.unwrap_err();

	assert!(err.is_invalid_argument());
	assert!(store.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_bulk_insert_forwards_batch(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;

	let result = facade.bulk_insert("people", Some(people())).await.unwrap();

	assert_eq!(result.inserted_count, 5);
	assert!(matches!(
		store.last_call(),
		Some(StoreCall::BulkInsert { documents, .. }) if documents.len() == 5
	));
}

/// Test `$set` wrapping of update payloads
///
/// This test verifies that:
/// 1. A plain payload is forwarded under `$set`
/// 2. A `$set` payload is forwarded without double wrapping
/// 3. Both forms leave the same stored state
#[rstest]
#[tokio::test]
async fn test_update_wraps_plain_payload(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	// Arrange
	let (facade, store) = facade;
	store.seed("tasks", [doc! { "_id": 1, "status": "open" }, doc! { "_id": 2, "status": "open" }]);

	// Act
	let plain = facade
		.update("tasks", doc! { "status": "open" }, doc! { "status": "done" }, WriteOptions::new())
		.await
		.unwrap();
	let plain_call = store.last_call();
	let plain_state = store.documents("tasks");

	let directive = facade
		.update(
			"tasks",
			doc! { "status": "done" },
			doc! { "$set": { "status": "done" } },
			WriteOptions::new(),
		)
		.await
		.unwrap();
	let directive_call = store.last_call();

	// Assert
	assert_eq!(plain.matched_count, 2);
	assert_eq!(plain.modified_count, 2);
	assert_eq!(directive.matched_count, 2);
	assert_eq!(directive.modified_count, 0);
	assert_eq!(store.documents("tasks"), plain_state);

	let Some(StoreCall::UpdateMany { update: plain_update, .. }) = plain_call else {
		panic!("expected an update call");
	};
	let Some(StoreCall::UpdateMany { update: directive_update, .. }) = directive_call else {
		panic!("expected an update call");
	};
	assert_eq!(plain_update, doc! { "$set": { "status": "done" } });
	assert_eq!(directive_update, doc! { "$set": { "status": "done" } });
}

#[rstest]
#[tokio::test]
async fn test_update_one_touches_first_match(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("tasks", [doc! { "_id": 1, "status": "open" }, doc! { "_id": 2, "status": "open" }]);

	let result = facade
		.update_one(
			"tasks",
			doc! { "status": "open" },
			doc! { "status": "done" },
			WriteOptions::new(),
		)
		.await
		.unwrap();

	assert_eq!(result.matched_count, 1);
	assert_eq!(
		store.documents("tasks"),
		vec![doc! { "_id": 1, "status": "done" }, doc! { "_id": 2, "status": "open" }]
	);
}

#[rstest]
#[tokio::test]
async fn test_update_forwards_other_operators(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("tasks", [doc! { "_id": 1, "tries": 1 }]);

	facade
		.update_one(
			"tasks",
			doc! { "tries": 1 },
			doc! { "$inc": { "tries": 1 } },
			WriteOptions::new(),
		)
		.await
		.unwrap();

	assert_eq!(store.documents("tasks"), vec![doc! { "_id": 1, "tries": 2 }]);
}

#[rstest]
#[tokio::test]
async fn test_update_with_upsert_creates_document(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	let options = WriteOptions::from_document(&doc! { "upsert": true }).unwrap();

	let result = facade
		.update_one("tasks", doc! { "slug": "new" }, doc! { "status": "open" }, options.clone())
		.await
		.unwrap();

	assert!(result.upserted_id.is_some());
	assert!(matches!(
		store.last_call(),
		Some(StoreCall::UpdateOne { options: forwarded, .. }) if forwarded == options
	));
	let stored = store.documents("tasks");
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].get_str("slug").unwrap(), "new");
	assert_eq!(stored[0].get_str("status").unwrap(), "open");
}

/// Test full-document replacement
///
/// This test verifies that:
/// 1. The payload is forwarded verbatim, without `$set`
/// 2. Every match is replaced while keeping its `_id`
#[rstest]
#[tokio::test]
async fn test_replace_forwards_payload_verbatim(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	// Arrange
	let (facade, store) = facade;
	store.seed(
		"tasks",
		[
			doc! { "_id": 1, "status": "open", "owner": "ann" },
			doc! { "_id": 2, "status": "open", "owner": "bob" },
		],
	);

	// Act
	let result = facade
		.replace(
			"tasks",
			doc! { "status": "open" },
			doc! { "status": "archived" },
			WriteOptions::new(),
		)
		.await
		.unwrap();

	// Assert
	assert_eq!(result.matched_count, 2);
	assert!(matches!(
		store.last_call(),
		Some(StoreCall::ReplaceMany { replacement, .. })
			if replacement == doc! { "status": "archived" }
	));
	assert_eq!(
		store.documents("tasks"),
		vec![
			doc! { "_id": 1, "status": "archived" },
			doc! { "_id": 2, "status": "archived" },
		]
	);
}

#[rstest]
#[tokio::test]
async fn test_replace_one_replaces_first_match(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	let oid = ObjectId::parse_str(RAW_ID).unwrap();
	store.seed("tasks", [doc! { "_id": oid, "status": "open", "owner": "ann" }]);

	let result = facade
		.replace_one(
			"tasks",
			doc! { "_id": RAW_ID },
			doc! { "status": "closed" },
			WriteOptions::new(),
		)
		.await
		.unwrap();

	assert_eq!(result.modified_count, 1);
	assert_eq!(
		store.documents("tasks"),
		vec![doc! { "_id": oid, "status": "closed" }]
	);
}

#[rstest]
#[tokio::test]
async fn test_remove_deletes_all_matches(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("people", people());

	let result = facade
		.remove("people", doc! { "age": { "$gt": 25 } }, WriteOptions::new())
		.await
		.unwrap();

	assert_eq!(result.deleted_count, 3);
	assert_eq!(names(&store.documents("people")), vec!["cid", "eve"]);
}

#[rstest]
#[tokio::test]
async fn test_remove_one_deletes_first_match(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;
	store.seed("people", people());

	let result = facade
		.remove_one("people", doc! { "team": "a" }, WriteOptions::new().comment("trim"))
		.await
		.unwrap();

	assert_eq!(result.deleted_count, 1);
	assert_eq!(store.documents("people").len(), 4);
	assert!(matches!(
		store.last_call(),
		Some(StoreCall::DeleteOne { options, .. })
			if options.comment == Some(Bson::String("trim".to_string()))
	));
}

#[rstest]
#[tokio::test]
async fn test_driver_error_passes_through(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	// Arrange: a genuine driver error
	let (facade, store) = facade;
	let driver_err = mongodb::options::ClientOptions::parse("definitely not a url")
		.await
		.unwrap_err();
	let expected = driver_err.to_string();
	store.fail_next(driver_err);

	// Act
	let err = facade
		.find("people", doc! {}, QueryOptions::new())
		.await
		.unwrap_err();

	// Assert
	assert_eq!(err.as_driver().map(|e| e.to_string()), Some(expected));
	assert!(facade.find("people", doc! {}, QueryOptions::new()).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn test_ping(facade: (DataAccessFacade, Arc<MemoryStore>)) {
	let (facade, store) = facade;

	facade.ping().await.unwrap();

	assert_eq!(store.last_call(), Some(StoreCall::Ping));
}
