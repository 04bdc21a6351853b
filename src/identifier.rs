//! `_id` coercion and identifier generation
//!
//! Search parameters often carry the `_id` as a hex string. Before a filter
//! is forwarded, a truthy `_id` is converted into an [`ObjectId`] so the
//! server compares against the stored identifier type.

use bson::oid::ObjectId;
use bson::{Bson, Document};

use crate::error::{FacadeError, Result};

/// Name of the identifier field
pub const ID_FIELD: &str = "_id";

/// Generate a fresh identifier
pub fn generate_id() -> ObjectId {
	ObjectId::new()
}

/// Truthiness of a BSON value
///
/// Null, undefined, `false`, zero, NaN and the empty string are falsy;
/// everything else is truthy.
pub fn is_truthy(value: &Bson) -> bool {
	match value {
		Bson::Null | Bson::Undefined => false,
		Bson::Boolean(b) => *b,
		Bson::Int32(n) => *n != 0,
		Bson::Int64(n) => *n != 0,
		Bson::Double(d) => !(*d == 0.0 || d.is_nan()),
		Bson::String(s) => !s.is_empty(),
		_ => true,
	}
}

/// Convert a value into its canonical identifier form
///
/// # Example
///
/// ```rust
/// use bson::Bson;
/// use mongo_facade::identifier::to_object_id;
///
/// let oid = to_object_id(&Bson::String("507f1f77bcf86cd799439011".into())).unwrap();
/// assert_eq!(oid.to_hex(), "507f1f77bcf86cd799439011");
/// ```
pub fn to_object_id(value: &Bson) -> Result<ObjectId> {
	match value {
		Bson::ObjectId(oid) => Ok(*oid),
		Bson::String(s) => ObjectId::parse_str(s).map_err(|e| {
			FacadeError::InvalidArgument(format!("`{}` is not a valid identifier: {}", s, e))
		}),
		Bson::Binary(binary) => {
			let bytes: [u8; 12] = binary.bytes.as_slice().try_into().map_err(|_| {
				FacadeError::InvalidArgument(format!(
					"binary identifier must be 12 bytes, got {}",
					binary.bytes.len()
				))
			})?;
			Ok(ObjectId::from_bytes(bytes))
		}
		other => Err(FacadeError::InvalidArgument(format!(
			"cannot convert {} to an identifier",
			other
		))),
	}
}

/// Coerce the `_id` of search parameters in place
///
/// Only a present and truthy `_id` is touched; falsy values are forwarded
/// as given. Applying the coercion twice yields the same document.
pub fn coerce_id(params: &mut Document) -> Result<()> {
	let Some(value) = params.get(ID_FIELD) else {
		return Ok(());
	};
	if !is_truthy(value) {
		return Ok(());
	}

	let oid = to_object_id(value)?;
	params.insert(ID_FIELD, oid);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use bson::spec::BinarySubtype;
	use rstest::rstest;

	const RAW_ID: &str = "507f1f77bcf86cd799439011";

	#[rstest]
	fn test_coerce_hex_string() {
		let mut params = doc! { "_id": RAW_ID, "name": "x" };

		coerce_id(&mut params).unwrap();

		let expected = ObjectId::parse_str(RAW_ID).unwrap();
		assert_eq!(params.get("_id"), Some(&Bson::ObjectId(expected)));
		assert_eq!(params.get_str("name").unwrap(), "x");
	}

	#[rstest]
	fn test_coerce_is_idempotent() {
		let mut once = doc! { "_id": RAW_ID };
		let mut twice = doc! { "_id": RAW_ID };

		coerce_id(&mut once).unwrap();
		coerce_id(&mut twice).unwrap();
		coerce_id(&mut twice).unwrap();

		assert_eq!(once, twice);
	}

	#[rstest]
	fn test_coerce_without_id_is_noop() {
		let mut params = doc! { "name": "x" };

		coerce_id(&mut params).unwrap();

		assert_eq!(params, doc! { "name": "x" });
	}

	#[rstest]
	#[case(Bson::Null)]
	#[case(Bson::Boolean(false))]
	#[case(Bson::Int32(0))]
	#[case(Bson::Int64(0))]
	#[case(Bson::Double(0.0))]
	#[case(Bson::Double(f64::NAN))]
	#[case(Bson::String(String::new()))]
	fn test_falsy_id_left_untouched(#[case] value: Bson) {
		let mut params = doc! { "_id": value.clone() };

		coerce_id(&mut params).unwrap();

		match (params.get("_id").unwrap(), &value) {
			(Bson::Double(a), Bson::Double(b)) if b.is_nan() => assert!(a.is_nan()),
			(actual, expected) => assert_eq!(actual, expected),
		}
	}

	#[rstest]
	fn test_coerce_binary_id() {
		let oid = ObjectId::parse_str(RAW_ID).unwrap();
		let binary = Bson::Binary(bson::Binary {
			subtype: BinarySubtype::Generic,
			bytes: oid.bytes().to_vec(),
		});
		let mut params = doc! { "_id": binary };

		coerce_id(&mut params).unwrap();

		assert_eq!(params.get_object_id("_id").unwrap(), oid);
	}

	#[rstest]
	#[case(Bson::String("not-an-id".to_string()))]
	#[case(Bson::Int32(7))]
	#[case(Bson::Document(doc! { "$in": [RAW_ID] }))]
	fn test_uncoercible_id_is_invalid_argument(#[case] value: Bson) {
		let mut params = doc! { "_id": value };

		let err = coerce_id(&mut params).unwrap_err();

		assert!(err.is_invalid_argument());
	}

	#[rstest]
	fn test_generate_id_is_unique() {
		assert_ne!(generate_id(), generate_id());
	}
}
