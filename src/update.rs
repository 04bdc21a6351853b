//! Update payload normalization

use bson::{Document, doc};

/// The partial-update directive plain payloads are wrapped in
pub const SET_DIRECTIVE: &str = "$set";

/// Whether the payload is already an update-operator document
///
/// Any top-level `$`-prefixed key (`$set`, `$inc`, `$unset`, ...) counts.
pub fn is_update_directive(payload: &Document) -> bool {
	payload.keys().any(|key| key.starts_with('$'))
}

/// Wrap a plain payload under `$set`
///
/// Payloads that already carry update operators are returned unchanged, so
/// a `$set` document is never wrapped twice.
///
/// # Example
///
/// ```rust
/// use bson::doc;
/// use mongo_facade::update::normalize_update;
///
/// assert_eq!(
///     normalize_update(doc! { "status": "done" }),
///     doc! { "$set": { "status": "done" } },
/// );
/// assert_eq!(
///     normalize_update(doc! { "$set": { "status": "done" } }),
///     doc! { "$set": { "status": "done" } },
/// );
/// ```
pub fn normalize_update(payload: Document) -> Document {
	if is_update_directive(&payload) {
		payload
	} else {
		doc! { "$set": payload }
	}
}

/// Pipeline that replaces each matched document with `replacement`
///
/// The stored `_id` is kept unless the replacement carries its own. The
/// replacement is wrapped in `$literal` so its values are never evaluated as
/// expressions.
pub fn replacement_pipeline(replacement: Document) -> Vec<Document> {
	vec![doc! {
		"$replaceWith": {
			"$mergeObjects": [
				{ "_id": "$_id" },
				{ "$literal": replacement },
			]
		}
	}]
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_plain_payload_is_wrapped() {
		assert_eq!(
			normalize_update(doc! { "status": "done", "tries": 2 }),
			doc! { "$set": { "status": "done", "tries": 2 } }
		);
	}

	#[rstest]
	fn test_set_payload_is_not_double_wrapped() {
		let payload = doc! { "$set": { "status": "done" } };

		assert_eq!(normalize_update(payload.clone()), payload);
	}

	#[rstest]
	#[case(doc! { "$inc": { "tries": 1 } })]
	#[case(doc! { "$unset": { "draft": "" } })]
	#[case(doc! { "$set": { "a": 1 }, "$inc": { "b": 1 } })]
	fn test_operator_payloads_are_forwarded(#[case] payload: Document) {
		assert_eq!(normalize_update(payload.clone()), payload);
	}

	#[rstest]
	fn test_empty_payload_is_wrapped() {
		assert_eq!(normalize_update(doc! {}), doc! { "$set": {} });
	}

	#[rstest]
	fn test_replacement_pipeline_keeps_id() {
		let pipeline = replacement_pipeline(doc! { "name": "x" });

		assert_eq!(pipeline.len(), 1);
		let stage = pipeline[0].get_document("$replaceWith").unwrap();
		let merged = stage.get_array("$mergeObjects").unwrap();
		assert_eq!(merged.len(), 2);
		assert_eq!(
			merged[1].as_document().unwrap(),
			&doc! { "$literal": { "name": "x" } }
		);
	}
}
