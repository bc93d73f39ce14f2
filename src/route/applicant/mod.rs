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
		.api_route("/", get_with(get_applicants, get_applicants_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route("/profile", put_with(update_profile, update_profile_docs))
		.api_route("/:id", get_with(get_applicant, get_applicant_docs))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_only_applicants_have_applicant_routes() {
		let app = app().await;
		let (token, _) = app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.get("/applicants/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn test_update_with_files() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.applicant("a@b.com", category).await;

		let response = app
			.upload(
				"/applicants/profile",
				&token,
				&[("about", "Rust developer"), ("isPublic", "true"), ("skills", "rust, tokio")],
				&[
					("resume", "cv.pdf", "application/pdf", b"%PDF-1.4".as_slice()),
					("profilePicture", "me.png", "image/png", b"\x89PNG".as_slice()),
				],
			)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let data = response.json::<Value>()["data"].clone();
		let resume = data["resume"].as_str().unwrap();
		let picture = data["profilePicture"].as_str().unwrap();

		assert!(resume.starts_with("/uploads/resumes/") && resume.ends_with(".pdf"));
		assert!(picture.starts_with("/uploads/profilePictures/") && picture.ends_with(".png"));
		assert!(app.stored(resume).exists());
		assert_eq!(data["about"], "Rust developer");
		assert_eq!(data["skills"], json!(["rust", "tokio"]));
		assert_eq!(data["category"]["name"], "Backend");
		assert_eq!(data["user"]["email"], "a@b.com");
	}

	#[tokio::test]
	async fn test_wrong_file_type_is_rejected() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.applicant("a@b.com", category).await;

		let response = app
			.upload(
				"/applicants/profile",
				&token,
				&[],
				&[("resume", "cv.exe", "application/octet-stream", b"MZ".as_slice())],
			)
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "resume");
	}

	#[tokio::test]
	async fn test_unknown_category_on_update() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.applicant("a@b.com", category).await;

		let response = app
			.server
			.put("/applicants/profile")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "category": Uuid::new_v4() }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_private_profiles_are_hidden() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, id) = app.applicant("private@b.com", category).await;
		let (other, other_id) = app.applicant("public@b.com", category).await;

		let response = app
			.server
			.put("/applicants/profile")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "isPublic": false }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let response = app
			.server
			.get("/applicants")
			.add_header(AUTHORIZATION, bearer(&other))
			.await;
		let body = response.json::<Value>();

		assert_eq!(body["count"], 1);
		assert_eq!(body["data"][0]["userId"], json!(other_id));

		let response = app
			.server
			.get(&format!("/applicants/{id}"))
			.add_header(AUTHORIZATION, bearer(&other))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let response = app
			.server
			.get(&format!("/applicants/{other_id}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
	}

	#[tokio::test]
	async fn test_deleted_category_expands_to_null() {
		let app = app().await;
		let category = app.category("Backend").await;
		let (token, _) = app.applicant("a@b.com", category).await;

		app.database.delete_category(category).await.unwrap();

		let response = app
			.server
			.get("/applicants/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let data = response.json::<Value>()["data"].clone();
		assert!(data["category"].is_null());
		assert_eq!(data["categoryId"], json!(category));
	}
}
