use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{
	applicant::model::{Education, Experience},
	model::{lenient, ListInput},
	user::model::UpdateAccount,
};

/// The role of an account, which decides the routes it can use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	#[default]
	Applicant,
	Company,
	Admin,
}

impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Applicant => "applicant",
			Self::Company => "company",
			Self::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"applicant" => Ok(Self::Applicant),
			"company" => Ok(Self::Company),
			"admin" => Ok(Self::Admin),
			_ => Err(format!("unknown role `{value}`")),
		}
	}
}

/// A single account.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The email address used for logging in and password resets.
	pub email: String,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	pub role: Role,
	pub is_verified: bool,
	/// SHA-256 digest of the outstanding password reset token.
	#[serde(skip)]
	pub reset_token: Option<String>,
	#[serde(skip)]
	pub reset_token_expiry: Option<DateTime<Utc>>,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
	#[validate(email(message = "a valid email address is required"))]
	pub email: String,
	#[validate(length(min = 1, message = "password is required"))]
	pub password: String,
}

/// Registration input. Which profile fields are required depends on `role`.
#[derive(Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
	#[validate(email(message = "a valid email address is required"))]
	pub email: String,
	#[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
	pub password: String,
	#[serde(default)]
	pub role: Role,

	// Applicant profile.
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub phone: Option<String>,
	/// The id of the applicant's category.
	pub category: Option<Uuid>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub years_of_experience: Option<i32>,
	pub education: Option<ListInput<Education>>,
	pub experience: Option<ListInput<Experience>>,
	pub skills: Option<ListInput<String>>,
	pub about: Option<String>,

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

impl RegisterInput {
	/// Splits the input into the credentials, the role and the profile fields.
	pub fn split(self) -> (String, String, Role, UpdateAccount) {
		let profile = UpdateAccount {
			email: None,
			password: None,
			first_name: self.first_name,
			last_name: self.last_name,
			phone: self.phone,
			category: self.category,
			years_of_experience: self.years_of_experience,
			about: self.about,
			education: self.education,
			experience: self.experience,
			skills: self.skills,
			is_public: None,
			company_name: self.company_name,
			industry: self.industry,
			description: self.description,
			address: self.address,
			website: self.website,
			company_phone: self.company_phone,
			established_year: self.established_year,
		};

		(self.email, self.password, self.role, profile)
	}
}

#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
	pub success: bool,
	pub id: Uuid,
	pub email: String,
	pub role: Role,
	pub token: String,
	pub message: &'static str,
}

#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
	pub success: bool,
	pub token: String,
	pub message: &'static str,
}

#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	pub success: bool,
	pub token: String,
	pub role: Role,
	/// The applicant's full name or the company name, falling back to the email.
	pub display_name: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ForgotPasswordInput {
	#[validate(email(message = "a valid email address is required"))]
	pub email: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ResetTokenInput {
	/// The token from the password reset email.
	#[validate(length(min = 1))]
	pub token: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ResetPasswordInput {
	#[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
	pub password: String,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_role_round_trip() {
		for role in [Role::Applicant, Role::Company, Role::Admin] {
			assert_eq!(role.as_str().parse::<Role>(), Ok(role));
		}

		assert!("owner".parse::<Role>().is_err());
	}

	#[test]
	fn test_user_hides_secrets() {
		let user = User {
			id: Uuid::nil(),
			email: "a@b.com".into(),
			password: vec![1, 2, 3],
			role: Role::Company,
			is_verified: false,
			reset_token: Some("digest".into()),
			reset_token_expiry: None,
			created_at: Utc::now(),
		};

		let value = serde_json::to_value(&user).unwrap();

		assert_eq!(value["role"], "company");
		assert!(value.get("password").is_none());
		assert!(value.get("resetToken").is_none());
	}
}
