use std::sync::Arc;

use argon2::Argon2;
use axum::{extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use macros::route;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
	config::Config,
	extract::{Json, Path},
	mail::{self, Mailer},
	openapi::tag,
	route::{model::Done, profile},
	session,
	store::NewProfile,
	Database,
};

use super::{hash_password, model, Error, RouteError};

/// How long a password reset link stays valid, in minutes.
pub const RESET_TOKEN_MINUTES: i64 = 10;

/// Normalizes an email address for storage and lookups.
///
/// Only surrounding whitespace is removed. Addresses are matched with
/// their case, so `Aysel@x.com` and `aysel@x.com` are different accounts.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_owned()
}

/// Hex-encoded SHA-256 digest of a reset token. Only the digest is stored.
pub fn digest(token: &str) -> String {
	hex::encode(Sha256::digest(token.as_bytes()))
}

fn reset_token() -> String {
	let mut bytes = [0; 20];
	rand::thread_rng().fill_bytes(&mut bytes);

	hex::encode(bytes)
}

/// Register account
/// Registers an applicant or company account together with its profile, returning a session token.
/// Applicants must name an existing category; companies must provide a unique name and an address.
#[route(tag = tag::AUTH, response(status = 201, description = "Registered successfully.", shape = "Json<model::RegisterResponse>"))]
pub async fn register(
	State(database): State<Database>,
	State(hasher): State<Argon2<'static>>,
	State(keys): State<Arc<session::Keys>>,
	Json(input): Json<model::RegisterInput>,
) -> Result<(StatusCode, Json<model::RegisterResponse>), RouteError> {
	let (email, password, role, fields) = input.split();

	if role == model::Role::Admin {
		return Err(Error::AdminRegistration.into());
	}

	let email = normalize_email(&email);

	if database.find_user_by_email(&email).await?.is_some() {
		return Err(Error::EmailTaken.into());
	}

	let id = Uuid::new_v4();
	let profile = match role {
		model::Role::Applicant => NewProfile::Applicant(profile::create_applicant(&database, id, fields.applicant()).await?),
		_ => NewProfile::Company(profile::create_company(id, fields.company())?),
	};

	let user = model::User {
		id,
		email,
		password: hash_password(&hasher, &password, &id).map_err(Error::Argon)?,
		role,
		is_verified: false,
		reset_token: None,
		reset_token_expiry: None,
		created_at: Utc::now(),
	};

	database.insert_account(&user, Some(&profile)).await?;

	tracing::info!(user = %user.id, role = %user.role, "account registered");

	let token = keys.issue(user.id)?;

	Ok((
		StatusCode::CREATED,
		Json(model::RegisterResponse {
			success: true,
			id: user.id,
			email: user.email,
			role: user.role,
			token,
			message: "registration successful",
		}),
	))
}

/// Log in
/// Logs in with an email and password, returning a session token and the name to display.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(database): State<Database>,
	State(hasher): State<Argon2<'static>>,
	State(keys): State<Arc<session::Keys>>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::LoginResponse>, RouteError> {
	let Some(user) = database.find_user_by_email(&normalize_email(&input.email)).await? else {
		return Err(Error::InvalidCredentials.into());
	};

	let hashed = hash_password(&hasher, &input.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidCredentials.into());
	}

	let display_name = profile::display_name(&database, &user).await?;
	let token = keys.issue(user.id)?;

	tracing::info!(user = %user.id, "logged in");

	Ok(Json(model::LoginResponse {
		success: true,
		token,
		role: user.role,
		display_name,
	}))
}

/// Forgot password
/// Emails a password reset link to the account with the given email.
/// The link is valid for 10 minutes.
#[route(tag = tag::AUTH)]
pub async fn forgot_password(
	State(database): State<Database>,
	State(mailer): State<Arc<dyn Mailer>>,
	State(config): State<Arc<Config>>,
	Json(input): Json<model::ForgotPasswordInput>,
) -> Result<Json<Done>, RouteError> {
	let user = database
		.find_user_by_email(&normalize_email(&input.email))
		.await?
		.ok_or(Error::UnknownEmail)?;

	let token = reset_token();
	database
		.set_reset_token(user.id, Some(&digest(&token)), Some(Utc::now() + Duration::minutes(RESET_TOKEN_MINUTES)))
		.await?;

	let url = format!("{}/reset-password/{token}", config.client_url);

	if let Err(error) = mailer.send(mail::password_reset(&user.email, &url)).await {
		tracing::warn!(user = %user.id, %error, "failed to send password reset email");

		database.set_reset_token(user.id, None, None).await?;
		return Err(Error::Mail(error).into());
	}

	tracing::info!(user = %user.id, "password reset email sent");

	Ok(Json(Done::new("email sent")))
}

/// Reset password
/// Sets a new password using the token from a reset email, returning a session token.
/// Each token can be used once.
#[route(tag = tag::AUTH)]
pub async fn reset_password(
	State(database): State<Database>,
	State(hasher): State<Argon2<'static>>,
	State(keys): State<Arc<session::Keys>>,
	Path(reset): Path<model::ResetTokenInput>,
	Json(input): Json<model::ResetPasswordInput>,
) -> Result<Json<model::TokenResponse>, RouteError> {
	let digest = digest(&reset.token);
	let now = Utc::now();

	let user = database
		.find_user_by_reset_token(&digest, now)
		.await?
		.ok_or(Error::InvalidOrExpiredToken)?;

	let password = hash_password(&hasher, &input.password, &user.id).map_err(Error::Argon)?;

	if !database
		.consume_reset_token(user.id, &digest, now, &password)
		.await?
	{
		return Err(Error::InvalidOrExpiredToken.into());
	}

	tracing::info!(user = %user.id, "password reset");

	Ok(Json(model::TokenResponse {
		success: true,
		token: keys.issue(user.id)?,
		message: "password updated",
	}))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_reset_tokens_are_random_hex() {
		let first = reset_token();
		let second = reset_token();

		assert_eq!(first.len(), 40);
		assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
		assert_ne!(first, second);
	}

	#[test]
	fn test_digest_matches_stored_form() {
		let token = reset_token();

		assert_eq!(digest(&token), digest(&token));
		assert_ne!(digest(&token), token);
		assert_eq!(digest(&token).len(), 64);
	}

	#[test]
	fn test_normalize_email_keeps_case() {
		assert_eq!(normalize_email("  Aysel@Example.COM "), "Aysel@Example.COM");
	}
}
