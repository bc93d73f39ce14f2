use std::borrow::Cow;

use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const USER: &str = "User";
	pub const APPLICANT: &str = "Applicant";
	pub const COMPANY: &str = "Company";
	pub const CATEGORY: &str = "Category";
	pub const JOB: &str = "Job";
	pub const ADMIN: &str = "Admin";
}

fn tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Job Board API")
		.summary("Job postings, profiles and applications")
		.description(include_str!("../README.md"))
		.tag(tag(tag::AUTH, "Registration, login and password resets"))
		.tag(tag(tag::USER, "The authenticated account"))
		.tag(tag(tag::APPLICANT, "Applicant profiles"))
		.tag(tag(tag::COMPANY, "Company profiles"))
		.tag(tag(tag::CATEGORY, "Job categories"))
		.tag(tag(tag::JOB, "Job postings and applications"))
		.tag(tag(tag::ADMIN, "Account administration"))
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("A session token from `/auth/login` or `/auth/register`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				message: "error message".into(),
				errors: vec![error::Message {
					content: "error message".into(),
					field: Some("optional field".into()),
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("key".into(), serde_json::json!("value"));
						map
					})),
				}],
			})
		})
}
