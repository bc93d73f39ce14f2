use std::sync::Arc;

use argon2::Argon2;
use axum::extract::State;
use macros::route;

use crate::{
	extract::{Form, Json, Session},
	openapi::tag,
	route::{
		auth::{hash_password, model::Role, route::normalize_email},
		profile::{self, Error, RouteError},
	},
	upload, Database,
};

use super::model;

/// Get own account
/// Returns the authenticated account along with its role-specific profile.
#[route(tag = tag::USER)]
pub async fn get_profile(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<model::AccountProfile>, RouteError> {
	let profile = profile::of_user(&database, &session.user).await?;

	Ok(Json(model::AccountProfile {
		success: true,
		user: model::Account::from(&session.user),
		profile,
	}))
}

/// Update own account
/// Changes the email and password of the authenticated account, and merges the profile
/// fields of its role. The profile is created when missing.
#[route(tag = tag::USER)]
pub async fn update_profile(
	State(database): State<Database>,
	State(uploads): State<Arc<upload::Storage>>,
	State(hasher): State<Argon2<'static>>,
	session: Session,
	form: Form<model::UpdateAccount>,
) -> Result<Json<model::AccountProfile>, RouteError> {
	let mut user = session.user;
	let mut input = form.input;

	if let Some(email) = input.email.take() {
		let email = normalize_email(&email);

		if let Some(existing) = database.find_user_by_email(&email).await? {
			if existing.id != user.id {
				return Err(Error::EmailTaken.into());
			}
		}

		user.email = email;
	}

	if let Some(password) = input.password.take() {
		user.password = hash_password(&hasher, &password, &user.id).map_err(Error::Hashing)?;
	}

	// The account is saved first, so a refused email leaves the profile and its files untouched.
	database.update_user(&user).await?;

	let profile = match user.role {
		Role::Applicant => {
			let profile = profile::update_applicant(&database, &uploads, user.id, input.applicant(), form.files).await?;
			Some(model::Profile::Applicant(profile::applicant_view(&database, profile).await?))
		}
		Role::Company => {
			let company = profile::update_company(&database, &uploads, user.id, input.company(), form.files).await?;
			Some(model::Profile::Company(profile::company_view(&database, company).await?))
		}
		Role::Admin => {
			upload::classify(form.files, &[])?;
			None
		}
	};

	tracing::info!(user = %user.id, "account updated");

	Ok(Json(model::AccountProfile {
		success: true,
		user: model::Account::from(&user),
		profile,
	}))
}
