use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// A single resource.
#[derive(Serialize, JsonSchema)]
pub struct Data<T> {
	pub success: bool,
	pub data: T,
}

impl<T> Data<T> {
	pub fn new(data: T) -> Self {
		Self {
			success: true,
			data,
		}
	}
}

/// A list of resources along with its length.
#[derive(Serialize, JsonSchema)]
pub struct List<T> {
	pub success: bool,
	pub count: usize,
	pub data: Vec<T>,
}

impl<T> List<T> {
	pub fn new(data: Vec<T>) -> Self {
		Self {
			success: true,
			count: data.len(),
			data,
		}
	}
}

/// A plain acknowledgement.
#[derive(Serialize, JsonSchema)]
pub struct Done {
	pub success: bool,
	pub message: String,
}

impl Done {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
		}
	}
}

/// A list that is either sent as-is or as a JSON-encoded string.
///
/// Multipart form fields can only carry text, so clients encode lists
/// as JSON in that case.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ListInput<T> {
	List(Vec<T>),
	Encoded(String),
}

impl<T: DeserializeOwned> ListInput<T> {
	/// Returns the items, decoding them first if needed. A blank string is an empty list.
	pub fn decode(self, field: &'static str) -> Result<Vec<T>, AppError> {
		match self {
			Self::List(items) => Ok(items),
			Self::Encoded(text) if text.trim().is_empty() => Ok(Vec::new()),
			Self::Encoded(text) => serde_json::from_str(&text)
				.map_err(|error| AppError::input(field, format!("expected a JSON list: {error}"))),
		}
	}
}

impl ListInput<String> {
	/// Returns a set of tags, accepting a JSON list or comma-separated text.
	///
	/// Tags are trimmed and empty or repeated ones are dropped, keeping the first occurrence.
	pub fn tags(self) -> Vec<String> {
		let items = match self {
			Self::List(items) => items,
			Self::Encoded(text) => serde_json::from_str::<Vec<String>>(&text)
				.unwrap_or_else(|_| text.split(',').map(str::to_owned).collect()),
		};

		let mut tags: Vec<String> = Vec::with_capacity(items.len());

		for item in items {
			let item = item.trim();

			if !item.is_empty() && !tags.iter().any(|tag| tag == item) {
				tags.push(item.to_owned());
			}
		}

		tags
	}
}

/// Deserializers that accept both native JSON values and their text form,
/// as sent by multipart forms and query strings.
pub mod lenient {
	use chrono::{DateTime, NaiveDate};
	use serde::{de::Error, Deserialize, Deserializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Number {
		Integer(i64),
		Text(String),
	}

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Flag {
		Bool(bool),
		Text(String),
	}

	pub fn option_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
		match Option::<Number>::deserialize(deserializer)? {
			None => Ok(None),
			Some(Number::Integer(value)) => i32::try_from(value).map(Some).map_err(D::Error::custom),
			Some(Number::Text(text)) if text.trim().is_empty() => Ok(None),
			Some(Number::Text(text)) => text.trim().parse().map(Some).map_err(D::Error::custom),
		}
	}

	pub fn option_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
		match Option::<Flag>::deserialize(deserializer)? {
			None => Ok(None),
			Some(Flag::Bool(value)) => Ok(Some(value)),
			Some(Flag::Text(text)) => match text.trim() {
				"" => Ok(None),
				"true" | "1" | "on" => Ok(Some(true)),
				"false" | "0" | "off" => Ok(Some(false)),
				other => Err(D::Error::custom(format!("expected a boolean, found `{other}`"))),
			},
		}
	}

	/// Accepts a calendar date or a full RFC 3339 timestamp.
	pub fn option_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
		let Some(text) = Option::<String>::deserialize(deserializer)? else {
			return Ok(None);
		};
		let text = text.trim();

		if text.is_empty() {
			return Ok(None);
		}

		NaiveDate::parse_from_str(text, "%Y-%m-%d")
			.or_else(|_| DateTime::parse_from_rfc3339(text).map(|time| time.date_naive()))
			.map(Some)
			.map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[derive(Debug, Deserialize)]
	struct Numbers {
		#[serde(default, deserialize_with = "lenient::option_i32")]
		value: Option<i32>,
		#[serde(default, deserialize_with = "lenient::option_bool")]
		flag: Option<bool>,
	}

	#[test]
	fn test_lenient_numbers() {
		let numbers: Numbers = serde_json::from_value(json!({ "value": "12", "flag": "true" })).unwrap();
		assert_eq!(numbers.value, Some(12));
		assert_eq!(numbers.flag, Some(true));

		let numbers: Numbers = serde_json::from_value(json!({ "value": 3 })).unwrap();
		assert_eq!(numbers.value, Some(3));
		assert_eq!(numbers.flag, None);

		assert!(serde_json::from_value::<Numbers>(json!({ "value": "three" })).is_err());
	}

	#[test]
	fn test_encoded_list() {
		let list: ListInput<u32> = serde_json::from_value(json!("[1, 2]")).unwrap();
		assert_eq!(list.decode("numbers").unwrap(), vec![1, 2]);

		let list: ListInput<u32> = serde_json::from_value(json!("not json")).unwrap();
		assert!(list.decode("numbers").is_err());
	}

	#[test]
	fn test_tags() {
		let list: ListInput<String> = serde_json::from_value(json!("rust, go ,rust,,sql")).unwrap();
		assert_eq!(list.tags(), vec!["rust", "go", "sql"]);

		let list: ListInput<String> = serde_json::from_value(json!(["a", " a ", "b"])).unwrap();
		assert_eq!(list.tags(), vec!["a", "b"]);
	}
}
