use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::route::{model::lenient, user::model::Owner};

/// Accepts absolute http(s) URLs with a host.
fn validate_website(website: &str) -> Result<(), ValidationError> {
	let rest = website
		.strip_prefix("https://")
		.or_else(|| website.strip_prefix("http://"))
		.unwrap_or(website);
	let host = rest.split(['/', '?', '#']).next().unwrap_or_default();

	if !validator::ValidateUrl::validate_url(&format!("http://{rest}"))
		|| !host.contains('.')
		|| host.starts_with('.')
		|| host.ends_with('.')
	{
		return Err(ValidationError::new("website").with_message("website must be a valid URL".into()));
	}

	Ok(())
}

/// The profile of an account with the company role.
#[derive(Debug, Clone, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Company {
	pub id: Uuid,
	/// The account that owns the profile.
	pub user_id: Uuid,
	/// The unique, public name of the company.
	#[validate(length(min = 1, max = 100, message = "company name is required"))]
	pub company_name: String,
	pub industry: Option<String>,
	#[validate(length(max = 1000, message = "description must not exceed 1000 characters"))]
	pub description: Option<String>,
	#[validate(length(min = 1, message = "address is required"))]
	pub address: String,
	#[validate(custom(function = "validate_website"))]
	pub website: Option<String>,
	pub phone: Option<String>,
	/// Public path of the uploaded logo, or a placeholder image.
	pub logo_url: String,
	pub established_year: Option<i32>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A partial update to a company profile. Fields that are not sent are left untouched.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompany {
	pub company_name: Option<String>,
	pub industry: Option<String>,
	pub description: Option<String>,
	pub address: Option<String>,
	pub website: Option<String>,
	pub phone: Option<String>,
	#[serde(default, deserialize_with = "lenient::option_i32")]
	#[schemars(with = "Option<i32>")]
	pub established_year: Option<i32>,
}

/// A company profile with its owner.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CompanyView {
	#[serde(flatten)]
	pub company: Company,
	pub user: Option<Owner>,
}

/// The company fields shown in job listings.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
	pub id: Uuid,
	pub company_name: String,
	pub industry: Option<String>,
	pub logo_url: String,
}

impl From<&Company> for CompanySummary {
	fn from(company: &Company) -> Self {
		Self {
			id: company.id,
			company_name: company.company_name.clone(),
			industry: company.industry.clone(),
			logo_url: company.logo_url.clone(),
		}
	}
}

/// The company fields shown on a single job posting.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
	pub id: Uuid,
	pub company_name: String,
	pub description: Option<String>,
	pub address: String,
	pub website: Option<String>,
	pub phone: Option<String>,
	pub logo_url: String,
	pub established_year: Option<i32>,
}

impl From<&Company> for CompanyDetails {
	fn from(company: &Company) -> Self {
		Self {
			id: company.id,
			company_name: company.company_name.clone(),
			description: company.description.clone(),
			address: company.address.clone(),
			website: company.website.clone(),
			phone: company.phone.clone(),
			logo_url: company.logo_url.clone(),
			established_year: company.established_year,
		}
	}
}
