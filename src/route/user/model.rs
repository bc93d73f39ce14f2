use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{
	applicant::model::{ApplicantView, Education, Experience, UpdateApplicantProfile},
	auth::model::{Role, User},
	company::model::{CompanyView, UpdateCompany},
	model::{lenient, ListInput},
};

/// The account fields shown on related resources.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Owner {
	pub id: Uuid,
	pub email: String,
	pub role: Role,
}

impl From<&User> for Owner {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			email: user.email.clone(),
			role: user.role,
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	pub id: Uuid,
	pub email: String,
	pub role: Role,
	pub is_verified: bool,
	pub created_at: DateTime<Utc>,
}

impl From<&User> for Account {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			email: user.email.clone(),
			role: user.role,
			is_verified: user.is_verified,
			created_at: user.created_at,
		}
	}
}

/// The role-specific profile of an account.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Profile {
	Applicant(ApplicantView),
	Company(CompanyView),
}

/// An account with its profile. `profile` is null for admins and for
/// accounts that never completed one.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AccountProfile {
	pub success: bool,
	pub user: Account,
	pub profile: Option<Profile>,
}

/// Changes to the authenticated account and its profile.
///
/// Only the profile fields of the account's role are used.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccount {
	#[validate(email(message = "a valid email address is required"))]
	pub email: Option<String>,
	#[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
	pub password: Option<String>,

	// Applicant profile.
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub phone: Option<String>,
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

	// Company profile.
	pub company_name: Option<String>,
	pub industry: Option<String>,
	pub description: Option<String>,
	pub address: Option<String>,
	pub website: Option<String>,
	pub company_phone: Option<String>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub established_year: Option<i32>,
}

impl UpdateAccount {
	pub fn applicant(self) -> UpdateApplicantProfile {
		UpdateApplicantProfile {
			first_name: self.first_name,
			last_name: self.last_name,
			phone: self.phone,
			category: self.category,
			years_of_experience: self.years_of_experience,
			about: self.about,
			education: self.education,
			experience: self.experience,
			skills: self.skills,
			is_public: self.is_public,
		}
	}

	pub fn company(self) -> UpdateCompany {
		UpdateCompany {
			company_name: self.company_name,
			industry: self.industry,
			description: self.description,
			address: self.address,
			website: self.website,
			phone: self.company_phone,
			established_year: self.established_year,
		}
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_company_phone_maps_to_phone() {
		let update: UpdateAccount = serde_json::from_value(json!({
			"phone": "+994 50 000 00 00",
			"companyPhone": "+994 12 000 00 00",
			"establishedYear": "2001",
		}))
		.unwrap();

		let company = update.company();

		assert_eq!(company.phone.as_deref(), Some("+994 12 000 00 00"));
		assert_eq!(company.established_year, Some(2001));
	}

	#[test]
	fn test_invalid_email_is_rejected() {
		let update = UpdateAccount {
			email: Some("not-an-email".into()),
			..Default::default()
		};

		assert!(update.validate().is_err());
	}
}
