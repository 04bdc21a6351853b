//! Query and write options
//!
//! [`QueryOptions`] holds the recognized query modifiers. When built from a
//! mapping, each recognized key is dispatched through a lookup table to a
//! typed apply function, and unrecognized keys are ignored.

use bson::{Bson, Document};

use crate::error::{FacadeError, Result};

/// Recognized query modifiers
///
/// Modifiers are applied in the fixed order limit, skip, sort, projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
	pub limit: Option<i64>,
	pub skip: Option<u64>,
	pub sort: Option<Document>,
	pub projection: Option<Document>,
}

type ApplyFn<T> = fn(&mut T, &Bson) -> Result<()>;

/// Query option names and their apply functions, in application order
const QUERY_OPTIONS: [(&str, ApplyFn<QueryOptions>); 5] = [
	("limit", apply_limit),
	("skip", apply_skip),
	("sort", apply_sort),
	("projection", apply_projection),
	("project", apply_projection),
];

fn apply_limit(options: &mut QueryOptions, value: &Bson) -> Result<()> {
	options.limit = Some(integer("limit", value)?);
	Ok(())
}

fn apply_skip(options: &mut QueryOptions, value: &Bson) -> Result<()> {
	let skip = integer("skip", value)?;
	let skip = u64::try_from(skip)
		.map_err(|_| FacadeError::InvalidArgument(format!("skip must not be negative: {}", skip)))?;
	options.skip = Some(skip);
	Ok(())
}

fn apply_sort(options: &mut QueryOptions, value: &Bson) -> Result<()> {
	options.sort = Some(document("sort", value)?);
	Ok(())
}

fn apply_projection(options: &mut QueryOptions, value: &Bson) -> Result<()> {
	options.projection = Some(document("projection", value)?);
	Ok(())
}

impl QueryOptions {
	/// Options with no modifiers set
	pub fn new() -> Self {
		Self::default()
	}

	/// Return at most `limit` documents
	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Skip the first `skip` matches
	pub fn skip(mut self, skip: u64) -> Self {
		self.skip = Some(skip);
		self
	}

	/// Order results by the given field directions
	pub fn sort(mut self, sort: Document) -> Self {
		self.sort = Some(sort);
		self
	}

	/// Include or exclude fields in returned documents
	pub fn projection(mut self, projection: Document) -> Self {
		self.projection = Some(projection);
		self
	}

	/// Build options from a mapping
	///
	/// `project` is accepted as an alias of `projection`. Unrecognized keys
	/// are ignored; a recognized key with a value of the wrong type is an
	/// [`FacadeError::InvalidArgument`].
	///
	/// # Example
	///
	/// ```rust
	/// use bson::doc;
	/// use mongo_facade::QueryOptions;
	///
	/// let options = QueryOptions::from_document(&doc! {
	///     "limit": 2,
	///     "sort": { "age": -1 },
	///     "explain": true,
	/// }).unwrap();
	///
	/// assert_eq!(options.limit, Some(2));
	/// assert_eq!(options.sort, Some(doc! { "age": -1 }));
	/// ```
	pub fn from_document(mapping: &Document) -> Result<Self> {
		let mut options = Self::default();
		for (name, apply) in QUERY_OPTIONS {
			if let Some(value) = mapping.get(name) {
				apply(&mut options, value)?;
			}
		}
		Ok(options)
	}

	/// Convert into the driver's find options
	pub fn to_find_options(&self) -> mongodb::options::FindOptions {
		let mut find = mongodb::options::FindOptions::default();
		if let Some(limit) = self.limit {
			find.limit = Some(limit);
		}
		if let Some(skip) = self.skip {
			find.skip = Some(skip);
		}
		if let Some(sort) = &self.sort {
			find.sort = Some(sort.clone());
		}
		if let Some(projection) = &self.projection {
			find.projection = Some(projection.clone());
		}
		find
	}

	/// Convert into the driver's count options
	///
	/// Only limit and skip affect a count.
	pub fn to_count_options(&self) -> mongodb::options::CountOptions {
		let mut count = mongodb::options::CountOptions::default();
		count.limit = self.limit.map(|limit| limit.unsigned_abs());
		count.skip = self.skip;
		count
	}
}

/// Options forwarded to write operations
///
/// `upsert` applies to updates and replacements; `comment` to every write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
	pub upsert: Option<bool>,
	pub comment: Option<Bson>,
}

const WRITE_OPTIONS: [(&str, ApplyFn<WriteOptions>); 2] =
	[("upsert", apply_upsert), ("comment", apply_comment)];

fn apply_upsert(options: &mut WriteOptions, value: &Bson) -> Result<()> {
	match value {
		Bson::Boolean(upsert) => {
			options.upsert = Some(*upsert);
			Ok(())
		}
		other => Err(FacadeError::InvalidArgument(format!(
			"upsert must be a boolean, got {}",
			other
		))),
	}
}

fn apply_comment(options: &mut WriteOptions, value: &Bson) -> Result<()> {
	options.comment = Some(value.clone());
	Ok(())
}

impl WriteOptions {
	/// Options with nothing set
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a document when nothing matches
	pub fn upsert(mut self, upsert: bool) -> Self {
		self.upsert = Some(upsert);
		self
	}

	/// Attach a comment to the server-side operation
	pub fn comment(mut self, comment: impl Into<Bson>) -> Self {
		self.comment = Some(comment.into());
		self
	}

	/// Build options from a mapping, ignoring unrecognized keys
	pub fn from_document(mapping: &Document) -> Result<Self> {
		let mut options = Self::default();
		for (name, apply) in WRITE_OPTIONS {
			if let Some(value) = mapping.get(name) {
				apply(&mut options, value)?;
			}
		}
		Ok(options)
	}

	/// Convert into the driver's update options
	pub fn to_update_options(&self) -> mongodb::options::UpdateOptions {
		let mut update = mongodb::options::UpdateOptions::default();
		update.upsert = self.upsert;
		update.comment = self.comment.clone();
		update
	}

	/// Convert into the driver's replace options
	pub fn to_replace_options(&self) -> mongodb::options::ReplaceOptions {
		let mut replace = mongodb::options::ReplaceOptions::default();
		replace.upsert = self.upsert;
		replace.comment = self.comment.clone();
		replace
	}

	/// Convert into the driver's delete options; `upsert` does not apply
	pub fn to_delete_options(&self) -> mongodb::options::DeleteOptions {
		let mut delete = mongodb::options::DeleteOptions::default();
		delete.comment = self.comment.clone();
		delete
	}
}

fn integer(name: &str, value: &Bson) -> Result<i64> {
	match value {
		Bson::Int32(n) => Ok(i64::from(*n)),
		Bson::Int64(n) => Ok(*n),
		Bson::Double(d) if d.fract() == 0.0 && d.is_finite() => Ok(*d as i64),
		other => Err(FacadeError::InvalidArgument(format!(
			"{} must be an integer, got {}",
			name, other
		))),
	}
}

fn document(name: &str, value: &Bson) -> Result<Document> {
	match value {
		Bson::Document(doc) => Ok(doc.clone()),
		other => Err(FacadeError::InvalidArgument(format!(
			"{} must be a document, got {}",
			name, other
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use rstest::rstest;

	#[rstest]
	fn test_from_document_reads_recognized_keys() {
		let options = QueryOptions::from_document(&doc! {
			"limit": 2,
			"skip": 1_i64,
			"sort": { "age": -1 },
			"projection": { "name": 1 },
		})
		.unwrap();

		assert_eq!(
			options,
			QueryOptions::new()
				.limit(2)
				.skip(1)
				.sort(doc! { "age": -1 })
				.projection(doc! { "name": 1 })
		);
	}

	#[rstest]
	fn test_from_document_ignores_unknown_keys() {
		let options = QueryOptions::from_document(&doc! {
			"batchSize": 10,
			"hint": "name_1",
		})
		.unwrap();

		assert_eq!(options, QueryOptions::default());
	}

	#[rstest]
	fn test_project_alias() {
		let options = QueryOptions::from_document(&doc! { "project": { "_id": 0 } }).unwrap();

		assert_eq!(options.projection, Some(doc! { "_id": 0 }));
	}

	#[rstest]
	#[case(doc! { "limit": "ten" })]
	#[case(doc! { "skip": -1 })]
	#[case(doc! { "sort": 1 })]
	#[case(doc! { "projection": [1, 2] })]
	fn test_from_document_rejects_mistyped_values(#[case] mapping: Document) {
		let err = QueryOptions::from_document(&mapping).unwrap_err();

		assert!(err.is_invalid_argument());
	}

	#[rstest]
	fn test_to_find_options() {
		let find = QueryOptions::new()
			.limit(5)
			.skip(10)
			.sort(doc! { "name": 1 })
			.to_find_options();

		assert_eq!(find.limit, Some(5));
		assert_eq!(find.skip, Some(10));
		assert_eq!(find.sort, Some(doc! { "name": 1 }));
		assert_eq!(find.projection, None);
	}

	#[rstest]
	fn test_to_count_options_ignores_sort() {
		let count = QueryOptions::new()
			.limit(3)
			.sort(doc! { "name": 1 })
			.to_count_options();

		assert_eq!(count.limit, Some(3));
		assert_eq!(count.skip, None);
	}

	#[rstest]
	fn test_write_options_from_document() {
		let options = WriteOptions::from_document(&doc! {
			"upsert": true,
			"comment": "nightly cleanup",
			"multi": true,
		})
		.unwrap();

		assert_eq!(options, WriteOptions::new().upsert(true).comment("nightly cleanup"));
		assert_eq!(options.to_update_options().upsert, Some(true));
		assert_eq!(options.to_replace_options().upsert, Some(true));
		assert_eq!(
			options.to_delete_options().comment,
			Some(Bson::String("nightly cleanup".to_string()))
		);
	}

	#[rstest]
	fn test_write_options_rejects_non_boolean_upsert() {
		let err = WriteOptions::from_document(&doc! { "upsert": 1 }).unwrap_err();

		assert!(err.is_invalid_argument());
	}
}
