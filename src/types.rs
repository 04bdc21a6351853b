//! Input and result types shared by the facade and its stores

use bson::{Bson, Document};

/// One document or a sequence of documents to insert
#[derive(Debug, Clone, PartialEq)]
pub enum Documents {
	One(Document),
	Many(Vec<Document>),
}

impl Documents {
	/// Flatten into a sequence, wrapping a single document
	pub fn into_vec(self) -> Vec<Document> {
		match self {
			Documents::One(document) => vec![document],
			Documents::Many(documents) => documents,
		}
	}
}

impl From<Document> for Documents {
	fn from(document: Document) -> Self {
		Documents::One(document)
	}
}

impl From<Vec<Document>> for Documents {
	fn from(documents: Vec<Document>) -> Self {
		Documents::Many(documents)
	}
}

impl<const N: usize> From<[Document; N]> for Documents {
	fn from(documents: [Document; N]) -> Self {
		Documents::Many(documents.into())
	}
}

/// Result of an insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertResult {
	/// Identifiers of the inserted documents, in input order
	pub inserted_ids: Vec<Bson>,
}

impl InsertResult {
	pub fn new(inserted_ids: Vec<Bson>) -> Self {
		Self { inserted_ids }
	}

	pub fn inserted_count(&self) -> usize {
		self.inserted_ids.len()
	}
}

/// Result of an unordered batch insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkInsertResult {
	pub inserted_count: u64,
	pub inserted_ids: Vec<Bson>,
}

impl BulkInsertResult {
	pub fn new(inserted_ids: Vec<Bson>) -> Self {
		Self {
			inserted_count: inserted_ids.len() as u64,
			inserted_ids,
		}
	}
}

/// Result of an update or replacement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
	/// Number of documents matched by the filter
	pub matched_count: u64,
	/// Number of documents actually modified
	pub modified_count: u64,
	/// Identifier of the upserted document, if one was created
	pub upserted_id: Option<Bson>,
}

impl UpdateResult {
	pub fn new(matched_count: u64, modified_count: u64, upserted_id: Option<Bson>) -> Self {
		Self {
			matched_count,
			modified_count,
			upserted_id,
		}
	}
}

/// Result of a delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
	pub deleted_count: u64,
}

impl DeleteResult {
	pub fn new(deleted_count: u64) -> Self {
		Self { deleted_count }
	}
}

/// Input ids keyed by their position, as the driver reports them
pub(crate) fn ordered_ids(ids: std::collections::HashMap<usize, Bson>) -> Vec<Bson> {
	let mut ids: Vec<(usize, Bson)> = ids.into_iter().collect();
	ids.sort_by_key(|(index, _)| *index);
	ids.into_iter().map(|(_, id)| id).collect()
}
