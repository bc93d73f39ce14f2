use aide::axum::{
	routing::{delete_with, get_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error::{self, ErrorShape},
	route::profile,
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("user {0} has no profile")]
	NoProfile(Uuid),
	#[error(transparent)]
	Profile(#[from] profile::Error),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl From<profile::Error> for RouteError {
	fn from(error: profile::Error) -> Self {
		Self::Route(Error::Profile(error))
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/users", get_with(get_users, get_users_docs))
		.api_route(
			"/users/:id",
			get_with(get_user, get_user_docs).delete_with(delete_user, delete_user_docs),
		)
		.api_route("/users/:id/profile", delete_with(delete_profile, delete_profile_docs))
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) | Self::NoProfile(..) => StatusCode::NOT_FOUND,
			Self::Profile(error) => error.status(),
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownUser(user) | Self::NoProfile(user) => error::Message::new(self.to_string())
				.detail("user", user.to_string())
				.into_vec(),
			Self::Profile(error) => error.errors(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_only_admins() {
		let app = app().await;
		let (token, _) = app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.get("/admin/users")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn test_list_and_get_users() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.admin("root@b.com").await;
		let (_, applicant) = app.applicant("a@b.com", category).await;
		let (_, company) = app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.get("/admin/users")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;
		let body = response.json::<Value>();

		assert_eq!(body["count"], 3);
		assert_eq!(body["data"][1]["id"], json!(applicant));
		assert_eq!(body["data"][1]["profile"]["firstName"], "Test");
		assert_eq!(body["data"][2]["profile"]["companyName"], "Acme");
		assert!(body["data"][0]["profile"].is_null());

		let response = app
			.server
			.get(&format!("/admin/users/{company}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["profile"]["address"], "Bakı");
	}

	#[tokio::test]
	async fn test_delete_user_cascades_to_profile() {
		let app = app().await;
		let (token, _) = app.admin("root@b.com").await;
		let (company_token, company) = app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.delete(&format!("/admin/users/{company}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(app.database.find_company_by_user(company).await.unwrap().is_none());

		let response = app
			.server
			.get("/users/profile")
			.add_header(AUTHORIZATION, bearer(&company_token))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = app
			.server
			.delete(&format!("/admin/users/{company}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_delete_profile_keeps_account() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.admin("root@b.com").await;
		let (applicant_token, applicant) = app.applicant("a@b.com", category).await;

		let path = format!("/admin/users/{applicant}/profile");
		let response = app.server.delete(&path).add_header(AUTHORIZATION, bearer(&token)).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(app.database.find_user(applicant).await.unwrap().is_some());

		let response = app
			.server
			.get("/applicants/me")
			.add_header(AUTHORIZATION, bearer(&applicant_token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let response = app.server.delete(&path).add_header(AUTHORIZATION, bearer(&token)).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}
}
