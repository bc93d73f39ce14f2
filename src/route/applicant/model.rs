use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{
	category::model::CategoryRef,
	model::{lenient, ListInput},
	user::model::Owner,
};

/// An entry in an applicant's education history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Education {
	pub degree: Option<String>,
	pub major: Option<String>,
	pub field_of_study: Option<String>,
	pub institution: Option<String>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub start_year: Option<i32>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub end_year: Option<i32>,
}

/// An entry in an applicant's work history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
	pub job_title: Option<String>,
	pub company_name: Option<String>,
	#[serde(default, deserialize_with = "lenient::option_date")]
	#[schemars(with = "Option<NaiveDate>")]
	pub start_date: Option<NaiveDate>,
	#[serde(default, deserialize_with = "lenient::option_date")]
	#[schemars(with = "Option<NaiveDate>")]
	pub end_date: Option<NaiveDate>,
	#[serde(default)]
	pub is_current: bool,
	pub description: Option<String>,
}

/// The profile of an account with the applicant role.
#[derive(Debug, Clone, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
	pub id: Uuid,
	/// The account that owns the profile.
	pub user_id: Uuid,
	#[validate(length(min = 1, max = 50, message = "first name is required"))]
	pub first_name: String,
	#[validate(length(min = 1, max = 50, message = "last name is required"))]
	pub last_name: String,
	pub phone: Option<String>,
	pub category_id: Uuid,
	#[validate(range(min = 0, message = "years of experience cannot be negative"))]
	pub years_of_experience: i32,
	#[validate(length(max = 500, message = "about must not exceed 500 characters"))]
	pub about: Option<String>,
	pub education: Vec<Education>,
	pub experience: Vec<Experience>,
	pub skills: Vec<String>,
	/// Public path of the uploaded resume.
	pub resume: Option<String>,
	/// Public path of the uploaded profile picture.
	pub profile_picture: Option<String>,
	/// Whether the profile appears in public listings.
	pub is_public: bool,
	pub created_at: DateTime<Utc>,
}

/// A partial update to an applicant profile. Fields that are not sent are left untouched.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicantProfile {
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub phone: Option<String>,
	/// The id of the applicant's category.
	pub category: Option<Uuid>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub years_of_experience: Option<i32>,
	pub about: Option<String>,
	pub education: Option<ListInput<Education>>,
	pub experience: Option<ListInput<Experience>>,
	pub skills: Option<ListInput<String>>,
	#[serde(default, deserialize_with = "lenient::option_bool")]
	#[schemars(with = "Option<bool>")]
	pub is_public: Option<bool>,
}

/// An applicant profile with its category and owner.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApplicantView {
	#[serde(flatten)]
	pub profile: ApplicantProfile,
	pub category: Option<CategoryRef>,
	pub user: Option<Owner>,
}
