use aide::axum::{
	routing::{delete_with, get_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, store::StoreError, AppState, Database};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown category {0}")]
	UnknownCategory(Uuid),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_categories, get_categories_docs).post_with(create_category, create_category_docs),
		)
		.api_route("/:id", delete_with(delete_category, delete_category_docs))
}

/// Replaces every category with the standard list, returning how many
/// categories were created.
pub async fn seed(database: &Database) -> Result<usize, StoreError> {
	for category in database.list_categories().await? {
		database.delete_category(category.id).await?;
	}

	for name in model::DEFAULT_CATEGORIES {
		database.insert_category(&model::Category::new(name)).await?;
	}

	tracing::info!(count = model::DEFAULT_CATEGORIES.len(), "categories seeded");

	Ok(model::DEFAULT_CATEGORIES.len())
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownCategory(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownCategory(category) => error::Message::new(self.to_string())
				.detail("category", category.to_string())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use rstest::rstest;

	use crate::test::*;

	#[tokio::test]
	async fn test_categories_are_sorted_and_public() {
		let app = app().await;
		app.category("Frontend").await;
		app.category("Backend").await;

		let response = app.server.get("/categories").await;
		let body = response.json::<Value>();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(body["count"], 2);
		assert_eq!(body["data"][0]["name"], "Backend");
		assert_eq!(body["data"][1]["name"], "Frontend");
	}

	#[tokio::test]
	async fn test_admin_creates_trimmed_category() {
		let app = app().await;
		let (token, _) = app.admin("root@b.com").await;

		let response = app
			.server
			.post("/categories")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": "  DevOps  " }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);
		assert_eq!(response.json::<Value>()["data"]["name"], "DevOps");

		let response = app
			.server
			.post("/categories")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": "DevOps" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
	}

	#[rstest]
	#[case::blank("   ".to_owned())]
	#[case::too_long("x".repeat(51))]
	#[tokio::test]
	async fn test_invalid_names_are_rejected(#[case] name: String) {
		let app = app().await;
		let (token, _) = app.admin("root@b.com").await;

		let response = app
			.server
			.post("/categories")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": name }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_only_admins_manage_categories() {
		let app = app().await;
		let (token, _) = app.company("a@co.com", "Acme").await;
		let category = app.category("Backend").await;

		let response = app
			.server
			.post("/categories")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "name": "DevOps" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

		let response = app
			.server
			.delete(&format!("/categories/{category}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

		let response = app.server.post("/categories").json(&json!({ "name": "DevOps" })).await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn test_delete_category() {
		let app = app().await;
		let (token, _) = app.admin("root@b.com").await;
		let category = app.category("Backend").await;

		let response = app
			.server
			.delete(&format!("/categories/{category}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let response = app
			.server
			.delete(&format!("/categories/{category}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_seed_replaces_categories() {
		let app = app().await;
		let old = app.category("Blockchain").await;

		let count = super::seed(&app.database).await.unwrap();
		let categories = app.database.list_categories().await.unwrap();

		assert_eq!(count, 15);
		assert_eq!(categories.len(), 15);
		assert!(categories.iter().all(|category| category.id != old));
		assert!(categories.iter().any(|category| category.name == "AI / ML Engineer"));
	}
}
