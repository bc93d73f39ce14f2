use aide::axum::{
	routing::{post_with, put_with},
	ApiRouter,
};
use argon2::Argon2;
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use crate::{
	config,
	error::{self, ErrorShape},
	mail,
	route::profile,
	AppState, Database,
};

pub mod model;
pub mod route;

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(hasher: &Argon2, password: &str, id: &Uuid) -> Result<Vec<u8>, argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash.to_vec())
}

/// Creates the configured administrator account, unless its email is
/// already in use. Returns the id of the new account.
pub async fn bootstrap_admin(
	database: &Database,
	hasher: &Argon2<'_>,
	admin: &config::Admin,
) -> Result<Option<Uuid>, RouteError> {
	let email = route::normalize_email(&admin.email);

	if database.find_user_by_email(&email).await?.is_some() {
		return Ok(None);
	}

	let id = Uuid::new_v4();
	let user = model::User {
		id,
		email,
		password: hash_password(hasher, &admin.password, &id).map_err(Error::Argon)?,
		role: model::Role::Admin,
		is_verified: true,
		reset_token: None,
		reset_token_expiry: None,
		created_at: Utc::now(),
	};

	database.insert_account(&user, None).await?;

	tracing::info!(user = %id, "administrator account created");

	Ok(Some(id))
}

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("password hashing failed")]
	Argon(#[from] argon2::Error),
	#[error("email already taken")]
	EmailTaken,
	#[error("admin accounts cannot be registered")]
	AdminRegistration,
	#[error(transparent)]
	Profile(#[from] profile::Error),
	#[error("no account uses this email")]
	UnknownEmail,
	#[error("invalid or expired reset token")]
	InvalidOrExpiredToken,
	#[error("email could not be sent")]
	Mail(#[from] mail::Error),
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
		.api_route("/register", post_with(register, register_docs))
		.api_route("/login", post_with(login, login_docs))
		.api_route(
			"/forgot-password",
			post_with(forgot_password, forgot_password_docs),
		)
		.api_route(
			"/reset-password/:token",
			put_with(reset_password, reset_password_docs),
		)
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
			Self::Argon(..) | Self::Mail(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::EmailTaken => StatusCode::CONFLICT,
			Self::AdminRegistration => StatusCode::FORBIDDEN,
			Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
			Self::Profile(error) => error.status(),
			Self::UnknownEmail => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::EmailTaken => error::Message::new(self.to_string())
				.field("email")
				.into_vec(),
			Self::Profile(error) => error.errors(),
			_ => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_register_applicant_then_login() {
		let app = app().await;
		let category = app.category("Backend").await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "Aysel@Example.com",
				"password": "hunter22",
				"role": "applicant",
				"firstName": "Aysel",
				"lastName": "Məmmədova",
				"category": category,
				"skills": "rust, sql",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);

		let body = response.json::<Value>();
		assert_eq!(body["email"], "Aysel@Example.com");
		assert_eq!(body["role"], "applicant");
		assert!(body["token"].is_string());

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "Aysel@Example.com", "password": "hunter22" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let body = response.json::<Value>();
		assert_eq!(body["success"], true);
		assert_eq!(body["displayName"], "Aysel Məmmədova");

		let response = app
			.server
			.get("/applicants/me")
			.add_header(AUTHORIZATION, bearer(body["token"].as_str().unwrap()))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["data"]["skills"], json!(["rust", "sql"]));
	}

	#[tokio::test]
	async fn test_register_creates_exactly_one_profile() {
		let app = app().await;
		let (_, user_id) = app.company("a@co.com", "Acme").await;

		assert!(app.database.find_user(user_id).await.unwrap().is_some());
		assert!(app.database.find_company_by_user(user_id).await.unwrap().is_some());
		assert!(app.database.find_applicant(user_id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_failed_profile_rolls_back_account() {
		let app = app().await;
		app.company("first@co.com", "Acme").await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "second@co.com",
				"password": "hunter22",
				"role": "company",
				"companyName": "Acme",
				"address": "Bakı",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
		assert!(app
			.database
			.find_user_by_email("second@co.com")
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_unknown_category_creates_nothing() {
		let app = app().await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "a@b.com",
				"password": "hunter22",
				"firstName": "A",
				"lastName": "B",
				"category": Uuid::new_v4(),
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert!(app.database.find_user_by_email("a@b.com").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_duplicate_email_conflicts() {
		let app = app().await;
		app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "a@co.com",
				"password": "hunter22",
				"role": "company",
				"companyName": "Other",
				"address": "Bakı",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");
	}

	#[tokio::test]
	async fn test_email_case_is_significant() {
		let app = app().await;
		let category = app.category("Backend").await;

		let (_, lower) = app.applicant("aysel@example.com", category).await;
		let (_, upper) = app.applicant("Aysel@example.com", category).await;

		assert_ne!(lower, upper);
		assert_eq!(
			app.database.find_user(upper).await.unwrap().unwrap().email,
			"Aysel@example.com"
		);

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "AYSEL@example.com", "password": PASSWORD }))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn test_admin_cannot_self_register() {
		let app = app().await;

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({ "email": "root@b.com", "password": "hunter22", "role": "admin" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn test_login_errors_are_identical() {
		let app = app().await;
		app.company("a@co.com", "Acme").await;

		let wrong_password = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "a@co.com", "password": "wrong-password" }))
			.await;
		let unknown_email = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "nobody@co.com", "password": "hunter22" }))
			.await;

		assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
	}

	#[tokio::test]
	async fn test_login_display_names() {
		let app = app().await;
		app.company("a@co.com", "Acme").await;
		app.admin("root@co.com").await;

		for (email, name) in [("a@co.com", "Acme"), ("root@co.com", "Admin")] {
			let response = app
				.server
				.post("/auth/login")
				.json(&json!({ "email": email, "password": PASSWORD }))
				.await;

			assert_eq!(response.json::<Value>()["displayName"], name);
		}
	}

	#[tokio::test]
	async fn test_reset_password_round_trip() {
		let app = app().await;
		app.company("a@co.com", "Acme").await;

		let response = app
			.server
			.post("/auth/forgot-password")
			.json(&json!({ "email": "a@co.com" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let sent = app.outbox.sent().await;
		assert_eq!(sent.len(), 1);

		let token = reset_token(&sent[0].html);
		let user = app.database.find_user_by_email("a@co.com").await.unwrap().unwrap();
		assert_eq!(user.reset_token.as_deref(), Some(digest(&token).as_str()));

		let response = app
			.server
			.put(&format!("/auth/reset-password/{token}"))
			.json(&json!({ "password": "new-password" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.json::<Value>()["token"].is_string());

		let replay = app
			.server
			.put(&format!("/auth/reset-password/{token}"))
			.json(&json!({ "password": "another-password" }))
			.await;

		assert_eq!(replay.status_code(), StatusCode::BAD_REQUEST);

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "a@co.com", "password": "new-password" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
	}

	#[tokio::test]
	async fn test_forgot_password_unknown_email() {
		let app = app().await;

		let response = app
			.server
			.post("/auth/forgot-password")
			.json(&json!({ "email": "nobody@co.com" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_failed_mail_clears_reset_token() {
		let app = app().await;
		let (_, user_id) = app.company("a@co.com", "Acme").await;
		app.outbox.fail(true);

		let response = app
			.server
			.post("/auth/forgot-password")
			.json(&json!({ "email": "a@co.com" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

		let user = app.database.find_user(user_id).await.unwrap().unwrap();
		assert!(user.reset_token.is_none());
		assert!(user.reset_token_expiry.is_none());
	}

	#[tokio::test]
	async fn test_token_is_required() {
		let app = app().await;

		let response = app.server.get("/applicants/me").await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = app
			.server
			.get("/applicants/me")
			.add_header(AUTHORIZATION, bearer("not-a-token"))
			.await;
		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn test_bootstrap_admin_once() {
		let app = app().await;
		let admin = crate::config::Admin {
			email: "Root@B.com".into(),
			password: PASSWORD.into(),
		};

		let id = super::bootstrap_admin(&app.database, &Default::default(), &admin)
			.await
			.unwrap()
			.unwrap();
		let again = super::bootstrap_admin(&app.database, &Default::default(), &admin)
			.await
			.unwrap();

		assert!(again.is_none());

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({ "email": "Root@B.com", "password": PASSWORD }))
			.await;
		let body = response.json::<Value>();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(body["role"], "admin");
		assert_eq!(body["displayName"], "Admin");
		assert!(app.database.find_user(id).await.unwrap().unwrap().is_verified);
	}
}
