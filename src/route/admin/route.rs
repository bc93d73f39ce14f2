use std::collections::HashMap;

use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	route::{
		auth::model::Role,
		model::{Done, IdInput, List},
		profile,
		user::model::{Account, AccountProfile},
	},
	Database,
};

use super::{model, Error, RouteError};

/// List accounts
/// Returns every account, oldest first, with the name from its profile.
#[route(tag = tag::ADMIN, role = "admin")]
pub async fn get_users(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<List<model::AccountSummary>>, RouteError> {
	session.authorize(&[Role::Admin])?;

	let users = database.list_users().await?;
	let mut applicants = HashMap::new();
	let mut companies = HashMap::new();

	for profile in database.list_applicants(false).await? {
		applicants.insert(profile.user_id, profile);
	}

	for company in database.list_companies().await? {
		companies.insert(company.user_id, company);
	}

	let accounts = users
		.into_iter()
		.map(|user| {
			let profile = match user.role {
				Role::Applicant => applicants.remove(&user.id).map(|profile| {
					model::ProfileSummary::Applicant {
						first_name: profile.first_name,
						last_name: profile.last_name,
					}
				}),
				Role::Company => companies.remove(&user.id).map(|company| {
					model::ProfileSummary::Company {
						company_name: company.company_name,
					}
				}),
				Role::Admin => None,
			};

			model::AccountSummary { user, profile }
		})
		.collect();

	Ok(Json(List::new(accounts)))
}

/// Get account
/// Returns an account with its full profile.
#[route(tag = tag::ADMIN, role = "admin")]
pub async fn get_user(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<AccountProfile>, RouteError> {
	session.authorize(&[Role::Admin])?;

	let user = database
		.find_user(input.id)
		.await?
		.ok_or(Error::UnknownUser(input.id))?;
	let profile = profile::of_user(&database, &user).await?;

	Ok(Json(AccountProfile {
		success: true,
		user: Account::from(&user),
		profile,
	}))
}

/// Delete account
/// Deletes an account along with its profile. Jobs and applications are kept.
#[route(tag = tag::ADMIN, role = "admin")]
pub async fn delete_user(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<Done>, RouteError> {
	let admin = session.authorize(&[Role::Admin])?;

	if !database.delete_user(input.id).await? {
		return Err(Error::UnknownUser(input.id).into());
	}

	tracing::info!(user = %input.id, admin = %admin.id, "account deleted");

	Ok(Json(Done::new("user and profile removed")))
}

/// Delete profile
/// Deletes the profile of an account, keeping the account itself.
#[route(tag = tag::ADMIN, role = "admin")]
pub async fn delete_profile(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<Done>, RouteError> {
	let admin = session.authorize(&[Role::Admin])?;

	let user = database
		.find_user(input.id)
		.await?
		.ok_or(Error::UnknownUser(input.id))?;

	let deleted = match user.role {
		Role::Applicant => database.delete_applicant(user.id).await?,
		Role::Company => database.delete_company(user.id).await?,
		Role::Admin => false,
	};

	if !deleted {
		return Err(Error::NoProfile(user.id).into());
	}

	tracing::info!(user = %user.id, admin = %admin.id, "profile deleted");

	Ok(Json(Done::new("profile removed")))
}
