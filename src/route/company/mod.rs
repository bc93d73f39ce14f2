use aide::axum::{
	routing::{get_with, put_with},
	ApiRouter,
};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_companies, get_companies_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route("/profile", put_with(update_profile, update_profile_docs))
		.api_route("/:id", get_with(get_company, get_company_docs))
}

#[cfg(test)]
mod test {
	use crate::{test::*, upload::DEFAULT_LOGO_URL};

	const LOGO: &[u8] = b"\x89PNG\r\n";

	#[tokio::test]
	async fn test_get_by_company_or_owner_id() {
		let app = app().await;
		let (token, user_id) = app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.get("/companies/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;
		let company = response.json::<Value>()["data"].clone();

		assert_eq!(company["logoUrl"], DEFAULT_LOGO_URL);
		assert_eq!(company["user"]["email"], "a@co.com");

		for id in [company["id"].as_str().unwrap().to_owned(), user_id.to_string()] {
			let response = app
				.server
				.get(&format!("/companies/{id}"))
				.add_header(AUTHORIZATION, bearer(&token))
				.await;

			assert_eq!(response.status_code(), StatusCode::OK);
			assert_eq!(response.json::<Value>()["data"]["companyName"], "Acme");
		}

		let response = app
			.server
			.get(&format!("/companies/{}", Uuid::new_v4()))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_logo_replaces_only_uploaded_files() {
		let app = app().await;
		let (token, _) = app.company("a@co.com", "Acme").await;

		let response = app
			.upload("/companies/profile", &token, &[], &[("logo", "logo.png", "image/png", LOGO)])
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let first = response.json::<Value>()["data"]["logoUrl"]
			.as_str()
			.unwrap()
			.to_owned();

		assert!(first.starts_with("/uploads/companyLogos/"));
		assert!(app.stored(&first).exists());
		assert_eq!(app.stored_count("companyLogos"), 1);

		let response = app
			.upload("/companies/profile", &token, &[], &[("logo", "logo.gif", "image/gif", LOGO)])
			.await;
		let second = response.json::<Value>()["data"]["logoUrl"]
			.as_str()
			.unwrap()
			.to_owned();

		assert_ne!(first, second);
		assert!(!app.stored(&first).exists());
		assert!(app.stored(&second).exists());
		assert_eq!(app.stored_count("companyLogos"), 1);
	}

	#[tokio::test]
	async fn test_oversized_logo_is_rejected() {
		let app = app().await;
		let (token, _) = app.company("a@co.com", "Acme").await;
		let logo = vec![0; 2 * 1024 * 1024 + 1];

		let response = app
			.upload("/companies/profile", &token, &[], &[("logo", "logo.png", "image/png", logo.as_slice())])
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(app.stored_count("companyLogos"), 0);
	}

	#[tokio::test]
	async fn test_company_name_is_unique() {
		let app = app().await;
		app.company("a@co.com", "Acme").await;
		let (token, _) = app.company("b@co.com", "Other").await;

		let response = app
			.server
			.put("/companies/profile")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "companyName": "Acme" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn test_profile_is_created_lazily() {
		let app = app().await;
		let (token, user_id) = app.company("a@co.com", "Acme").await;
		app.database.delete_company(user_id).await.unwrap();

		let response = app
			.server
			.put("/companies/profile")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "industry": "IT" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let response = app
			.server
			.put("/companies/profile")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "companyName": "Acme 2", "address": "Bakı", "industry": "IT" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["data"]["industry"], "IT");
	}
}
