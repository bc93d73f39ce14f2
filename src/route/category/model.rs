use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_not_blank(name: &str) -> Result<(), ValidationError> {
	if name.trim().is_empty() {
		return Err(ValidationError::new("blank").with_message("category name is required".into()));
	}

	Ok(())
}

/// A job category, referenced by applicant profiles and jobs.
#[model(create)]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
	/// The unique identifier of the category.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The unique name of the category.
	#[validate(
		length(max = 50, message = "category name must not exceed 50 characters"),
		custom(function = "validate_not_blank")
	)]
	pub name: String,
	/// The creation time of the category.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

impl Category {
	/// Builds a new category with a trimmed name.
	pub fn new(name: &str) -> Self {
		Self {
			id: Uuid::new_v4(),
			name: name.trim().to_owned(),
			created_at: Utc::now(),
		}
	}
}

/// The category fields shown on related resources.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategoryRef {
	pub id: Uuid,
	pub name: String,
}

impl From<&Category> for CategoryRef {
	fn from(category: &Category) -> Self {
		Self {
			id: category.id,
			name: category.name.clone(),
		}
	}
}

/// The categories created by `seed-categories`.
pub const DEFAULT_CATEGORIES: [&str; 15] = [
	"Frontend",
	"Backend",
	"Fullstack",
	"DevOps",
	"Cybersecurity",
	"Data Analyst",
	"Data Scientist",
	"Mobile Developer",
	"Game Developer",
	"AI / ML Engineer",
	"UI/UX Designer",
	"System Administrator",
	"Database Administrator (DBA)",
	"Cloud Engineer",
	"Software Tester / QA",
];

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[test]
	fn test_blank_name_is_invalid() {
		let input = CreateCategory { name: "   ".into() };

		assert!(input.validate().is_err());
	}

	#[test]
	fn test_new_trims_name() {
		let category = Category::new("  Dizayn ");

		assert_eq!(category.name, "Dizayn");
		assert!(category.validate().is_ok());
	}
}
