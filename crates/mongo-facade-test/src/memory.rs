//! In-memory document store
//!
//! Supports equality and comparison filters, sort, skip, limit, projection
//! and the `$set`, `$unset` and `$inc` update operators. Every call is
//! recorded exactly as the facade forwarded it.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use mongo_facade::identifier::is_truthy;
use mongo_facade::{
	BulkInsertResult, DeleteResult, DocumentStore, FacadeError, InsertResult, QueryOptions,
	Result, UpdateResult, WriteOptions,
};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A call forwarded to the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
	Find {
		collection: String,
		filter: Document,
		options: QueryOptions,
	},
	Count {
		collection: String,
		filter: Document,
		options: QueryOptions,
	},
	InsertMany {
		collection: String,
		documents: Vec<Document>,
	},
	BulkInsert {
		collection: String,
		documents: Vec<Document>,
	},
	UpdateOne {
		collection: String,
		filter: Document,
		update: Document,
		options: WriteOptions,
	},
	UpdateMany {
		collection: String,
		filter: Document,
		update: Document,
		options: WriteOptions,
	},
	ReplaceOne {
		collection: String,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	},
	ReplaceMany {
		collection: String,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	},
	DeleteOne {
		collection: String,
		filter: Document,
		options: WriteOptions,
	},
	DeleteMany {
		collection: String,
		filter: Document,
		options: WriteOptions,
	},
	Ping,
}

#[derive(Default)]
struct State {
	collections: HashMap<String, Vec<Document>>,
	calls: Vec<StoreCall>,
	failure: Option<mongodb::error::Error>,
}

/// In-memory [`DocumentStore`]
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert documents directly, without recording a call
	///
	/// Documents without `_id` get a generated one.
	pub fn seed(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
		let mut state = self.state.lock();
		let stored = state.collections.entry(collection.to_string()).or_default();
		for mut document in documents {
			ensure_id(&mut document);
			stored.push(document);
		}
	}

	/// Current contents of a collection, in insertion order
	pub fn documents(&self, collection: &str) -> Vec<Document> {
		self.state
			.lock()
			.collections
			.get(collection)
			.cloned()
			.unwrap_or_default()
	}

	/// Every call received so far
	pub fn calls(&self) -> Vec<StoreCall> {
		self.state.lock().calls.clone()
	}

	/// The most recent call
	pub fn last_call(&self) -> Option<StoreCall> {
		self.state.lock().calls.last().cloned()
	}

	/// Make the next operation fail with `error`
	pub fn fail_next(&self, error: mongodb::error::Error) {
		self.state.lock().failure = Some(error);
	}

	/// Record `call` and consume a pending failure
	fn begin(&self, state: &mut State, call: StoreCall) -> Result<()> {
		state.calls.push(call);
		match state.failure.take() {
			Some(error) => Err(FacadeError::Driver(error)),
			None => Ok(()),
		}
	}

	fn insert_documents(&self, collection: &str, documents: Vec<Document>) -> Vec<Bson> {
		let mut state = self.state.lock();
		let stored = state.collections.entry(collection.to_string()).or_default();
		documents
			.into_iter()
			.map(|mut document| {
				let id = ensure_id(&mut document);
				stored.push(document);
				id
			})
			.collect()
	}

	fn apply_update(
		&self,
		collection: &str,
		filter: &Document,
		options: &WriteOptions,
		first_only: bool,
		change: impl Fn(&Document) -> Document,
	) -> UpdateResult {
		let mut state = self.state.lock();
		let stored = state.collections.entry(collection.to_string()).or_default();

		let mut matched = 0;
		let mut modified = 0;
		for document in stored.iter_mut().filter(|d| matches(d, filter)) {
			matched += 1;
			let updated = change(document);
			if updated != *document {
				*document = updated;
				modified += 1;
			}
			if first_only {
				break;
			}
		}

		if matched == 0 && options.upsert == Some(true) {
			let seed: Document = filter
				.iter()
				.filter(|(key, value)| !key.starts_with('$') && !is_operator_document(value))
				.map(|(key, value)| (key.clone(), value.clone()))
				.collect();
			let mut created = change(&seed);
			let id = ensure_id(&mut created);
			stored.push(created);
			return UpdateResult::new(0, 0, Some(id));
		}

		UpdateResult::new(matched, modified, None)
	}

	/// Fail like the server when a replacement would change a stored `_id`
	fn reject_id_change(
		&self,
		collection: &str,
		filter: &Document,
		replacement: &Document,
		first_only: bool,
	) -> Result<()> {
		let Some(new_id) = replacement.get("_id") else {
			return Ok(());
		};
		let state = self.state.lock();
		let changes_id = state
			.collections
			.get(collection)
			.into_iter()
			.flatten()
			.filter(|d| matches(d, filter))
			.take(if first_only { 1 } else { usize::MAX })
			.any(|d| d.get("_id") != Some(new_id));

		if changes_id {
			return Err(FacadeError::Driver(mongodb::error::Error::custom(format!(
				"replacement in {} would modify the immutable field '_id'",
				collection
			))));
		}
		Ok(())
	}

	fn apply_delete(&self, collection: &str, filter: &Document, first_only: bool) -> DeleteResult {
		let mut state = self.state.lock();
		let stored = state.collections.entry(collection.to_string()).or_default();

		let mut deleted = 0;
		stored.retain(|document| {
			let remove = matches(document, filter) && !(first_only && deleted == 1);
			if remove {
				deleted += 1;
			}
			!remove
		});

		DeleteResult::new(deleted)
	}
}

#[async_trait]
impl DocumentStore for MemoryStore {
	async fn find(
		&self,
		collection: &str,
		filter: Document,
		options: QueryOptions,
	) -> Result<Vec<Document>> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::Find {
					collection: collection.to_string(),
					filter: filter.clone(),
					options: options.clone(),
				},
			)?;
		}

		let mut found: Vec<Document> = self
			.documents(collection)
			.into_iter()
			.filter(|document| matches(document, &filter))
			.collect();

		if let Some(sort) = &options.sort {
			found.sort_by(|a, b| sort_order(a, b, sort));
		}
		let skip = options.skip.unwrap_or(0) as usize;
		let limit = match options.limit {
			Some(0) | None => usize::MAX,
			Some(limit) => limit.unsigned_abs() as usize,
		};
		let found = found.into_iter().skip(skip).take(limit);

		Ok(match &options.projection {
			Some(projection) => found.map(|d| project(&d, projection)).collect(),
			None => found.collect(),
		})
	}

	async fn count(
		&self,
		collection: &str,
		filter: Document,
		options: QueryOptions,
	) -> Result<u64> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::Count {
					collection: collection.to_string(),
					filter: filter.clone(),
					options: options.clone(),
				},
			)?;
		}

		let matching = self
			.documents(collection)
			.iter()
			.filter(|document| matches(document, &filter))
			.count() as u64;
		let remaining = matching.saturating_sub(options.skip.unwrap_or(0));
		Ok(match options.limit {
			Some(0) | None => remaining,
			Some(limit) => remaining.min(limit.unsigned_abs()),
		})
	}

	async fn insert_many(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> Result<InsertResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::InsertMany {
					collection: collection.to_string(),
					documents: documents.clone(),
				},
			)?;
		}

		Ok(InsertResult::new(self.insert_documents(collection, documents)))
	}

	async fn bulk_insert(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> Result<BulkInsertResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::BulkInsert {
					collection: collection.to_string(),
					documents: documents.clone(),
				},
			)?;
		}

		Ok(BulkInsertResult::new(self.insert_documents(collection, documents)))
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::UpdateOne {
					collection: collection.to_string(),
					filter: filter.clone(),
					update: update.clone(),
					options: options.clone(),
				},
			)?;
		}

		Ok(self.apply_update(collection, &filter, &options, true, |d| {
			apply_operators(d, &update)
		}))
	}

	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::UpdateMany {
					collection: collection.to_string(),
					filter: filter.clone(),
					update: update.clone(),
					options: options.clone(),
				},
			)?;
		}

		Ok(self.apply_update(collection, &filter, &options, false, |d| {
			apply_operators(d, &update)
		}))
	}

	async fn replace_one(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::ReplaceOne {
					collection: collection.to_string(),
					filter: filter.clone(),
					replacement: replacement.clone(),
					options: options.clone(),
				},
			)?;
		}
		self.reject_id_change(collection, &filter, &replacement, true)?;

		Ok(self.apply_update(collection, &filter, &options, true, |d| {
			replace_keeping_id(d, &replacement)
		}))
	}

	async fn replace_many(
		&self,
		collection: &str,
		filter: Document,
		replacement: Document,
		options: WriteOptions,
	) -> Result<UpdateResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::ReplaceMany {
					collection: collection.to_string(),
					filter: filter.clone(),
					replacement: replacement.clone(),
					options: options.clone(),
				},
			)?;
		}
		self.reject_id_change(collection, &filter, &replacement, false)?;

		Ok(self.apply_update(collection, &filter, &options, false, |d| {
			replace_keeping_id(d, &replacement)
		}))
	}

	async fn delete_one(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::DeleteOne {
					collection: collection.to_string(),
					filter: filter.clone(),
					options,
				},
			)?;
		}

		Ok(self.apply_delete(collection, &filter, true))
	}

	async fn delete_many(
		&self,
		collection: &str,
		filter: Document,
		options: WriteOptions,
	) -> Result<DeleteResult> {
		{
			let mut state = self.state.lock();
			self.begin(
				&mut state,
				StoreCall::DeleteMany {
					collection: collection.to_string(),
					filter: filter.clone(),
					options,
				},
			)?;
		}

		Ok(self.apply_delete(collection, &filter, false))
	}

	async fn ping(&self) -> Result<()> {
		let mut state = self.state.lock();
		self.begin(&mut state, StoreCall::Ping)
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

/// Give `document` an `_id` if it lacks one and return it
fn ensure_id(document: &mut Document) -> Bson {
	match document.get("_id") {
		Some(id) => id.clone(),
		None => {
			let id = Bson::ObjectId(ObjectId::new());
			document.insert("_id", id.clone());
			id
		}
	}
}

fn is_operator_document(value: &Bson) -> bool {
	match value {
		Bson::Document(inner) => inner.keys().next().is_some_and(|key| key.starts_with('$')),
		_ => false,
	}
}

/// Whether `document` satisfies every top-level condition of `filter`
pub fn matches(document: &Document, filter: &Document) -> bool {
	filter.iter().all(|(key, condition)| {
		let value = document.get(key);
		match condition {
			Bson::Document(operators) if is_operator_document(condition) => operators
				.iter()
				.all(|(operator, argument)| apply_operator(operator, value, argument)),
			expected => value == Some(expected),
		}
	})
}

fn apply_operator(operator: &str, value: Option<&Bson>, argument: &Bson) -> bool {
	let ordering = || value.and_then(|v| compare(v, argument));
	match operator {
		"$eq" => value == Some(argument),
		"$ne" => value != Some(argument),
		"$gt" => ordering() == Some(Ordering::Greater),
		"$gte" => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
		"$lt" => ordering() == Some(Ordering::Less),
		"$lte" => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
		"$in" => match argument {
			Bson::Array(items) => value.is_some_and(|v| items.contains(v)),
			_ => false,
		},
		"$nin" => match argument {
			Bson::Array(items) => !value.is_some_and(|v| items.contains(v)),
			_ => false,
		},
		"$exists" => value.is_some() == is_truthy(argument),
		_ => false,
	}
}

fn number(value: &Bson) -> Option<f64> {
	match value {
		Bson::Int32(n) => Some(f64::from(*n)),
		Bson::Int64(n) => Some(*n as f64),
		Bson::Double(d) => Some(*d),
		_ => None,
	}
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
	if let (Some(x), Some(y)) = (number(a), number(b)) {
		return x.partial_cmp(&y);
	}
	match (a, b) {
		(Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
		(Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
		(Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
		(Bson::DateTime(x), Bson::DateTime(y)) => {
			Some(x.timestamp_millis().cmp(&y.timestamp_millis()))
		}
		_ => None,
	}
}

fn sort_order(a: &Document, b: &Document, sort: &Document) -> Ordering {
	for (field, direction) in sort {
		let ordering = match (a.get(field), b.get(field)) {
			(None, None) => Ordering::Equal,
			(None, Some(_)) => Ordering::Less,
			(Some(_), None) => Ordering::Greater,
			(Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
		};
		let descending = number(direction).is_some_and(|d| d < 0.0);
		let ordering = if descending { ordering.reverse() } else { ordering };
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}

fn project(document: &Document, projection: &Document) -> Document {
	let inclusive = projection
		.iter()
		.any(|(field, flag)| field != "_id" && is_truthy(flag));
	let keep_id = projection.get("_id").is_none_or(is_truthy);

	document
		.iter()
		.filter(|(field, _)| {
			if field.as_str() == "_id" {
				keep_id
			} else if inclusive {
				projection.get(field.as_str()).is_some_and(is_truthy)
			} else {
				projection.get(field.as_str()).is_none_or(is_truthy)
			}
		})
		.map(|(field, value)| (field.clone(), value.clone()))
		.collect()
}

fn apply_operators(document: &Document, update: &Document) -> Document {
	let mut updated = document.clone();
	for (operator, fields) in update {
		let Bson::Document(fields) = fields else {
			continue;
		};
		match operator.as_str() {
			"$set" => {
				for (field, value) in fields {
					updated.insert(field.clone(), value.clone());
				}
			}
			"$unset" => {
				for field in fields.keys() {
					updated.remove(field);
				}
			}
			"$inc" => {
				for (field, delta) in fields {
					let next = match (updated.get(field), delta) {
						// Overflow widens like the server: int to long, long to double
						(Some(Bson::Int32(n)), Bson::Int32(d)) => n
							.checked_add(*d)
							.map_or(Bson::Int64(i64::from(*n) + i64::from(*d)), Bson::Int32),
						(Some(Bson::Int64(n)), Bson::Int64(d)) => n
							.checked_add(*d)
							.map_or(Bson::Double(*n as f64 + *d as f64), Bson::Int64),
						(Some(Bson::Int64(n)), Bson::Int32(d)) => n
							.checked_add(i64::from(*d))
							.map_or(Bson::Double(*n as f64 + f64::from(*d)), Bson::Int64),
						(Some(current), delta) => match (number(current), number(delta)) {
							(Some(n), Some(d)) => Bson::Double(n + d),
							_ => continue,
						},
						(None, delta) => delta.clone(),
					};
					updated.insert(field.clone(), next);
				}
			}
			_ => {}
		}
	}
	updated
}

fn replace_keeping_id(document: &Document, replacement: &Document) -> Document {
	let mut replaced = Document::new();
	if let Some(id) = document.get("_id").or_else(|| replacement.get("_id")) {
		replaced.insert("_id", id.clone());
	}
	for (field, value) in replacement {
		if field != "_id" {
			replaced.insert(field.clone(), value.clone());
		}
	}
	replaced
}
