use schemars::JsonSchema;
use serde::Serialize;

use crate::route::auth::model::User;

/// The part of a profile shown in the account list.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ProfileSummary {
	#[serde(rename_all = "camelCase")]
	Applicant { first_name: String, last_name: String },
	#[serde(rename_all = "camelCase")]
	Company { company_name: String },
}

/// An account along with a summary of its profile.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AccountSummary {
	#[serde(flatten)]
	pub user: User,
	pub profile: Option<ProfileSummary>,
}
