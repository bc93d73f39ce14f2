use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{
	extract::{Form, Json, Path, Session},
	openapi::tag,
	route::{
		auth::model::Role,
		model::{Data, IdInput, List},
		profile::{self, Error, RouteError},
	},
	upload, Database,
};

use super::model;

/// Get own applicant profile
/// Returns the profile of the authenticated applicant, with its category and account.
#[route(tag = tag::APPLICANT, role = "applicant")]
pub async fn get_me(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Data<model::ApplicantView>>, RouteError> {
	let user = session.authorize(&[Role::Applicant])?;
	let profile = database
		.find_applicant(user.id)
		.await?
		.ok_or(Error::NotFound("applicant"))?;

	Ok(Json(Data::new(profile::applicant_view(&database, profile).await?)))
}

/// Update own applicant profile
/// Updates the fields that are sent, creating the profile if needed. Accepts JSON or
/// a multipart form with `resume` (PDF, DOC, DOCX) and `profilePicture` (JPEG, PNG, GIF) files.
#[route(tag = tag::APPLICANT, role = "applicant")]
pub async fn update_profile(
	State(database): State<Database>,
	State(uploads): State<Arc<upload::Storage>>,
	session: Session,
	form: Form<model::UpdateApplicantProfile>,
) -> Result<Json<Data<model::ApplicantView>>, RouteError> {
	let user = session.authorize(&[Role::Applicant])?;
	let profile = profile::update_applicant(&database, &uploads, user.id, form.input, form.files).await?;

	tracing::info!(user = %user.id, "applicant profile updated");

	Ok(Json(Data::new(profile::applicant_view(&database, profile).await?)))
}

/// List public applicants
/// Returns every applicant profile marked as public, newest first.
#[route(tag = tag::APPLICANT)]
pub async fn get_applicants(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<List<model::ApplicantView>>, RouteError> {
	let profiles = database.list_applicants(true).await?;

	Ok(Json(List::new(profile::applicant_views(&database, profiles).await?)))
}

/// Get public applicant
/// Returns the public profile owned by the account with the given id.
/// Private profiles are reported as missing.
#[route(tag = tag::APPLICANT)]
pub async fn get_applicant(
	State(database): State<Database>,
	_session: Session,
	Path(owner): Path<IdInput>,
) -> Result<Json<Data<model::ApplicantView>>, RouteError> {
	let profile = database
		.find_applicant(owner.id)
		.await?
		.filter(|profile| profile.is_public)
		.ok_or(Error::NotFound("applicant"))?;

	Ok(Json(Data::new(profile::applicant_view(&database, profile).await?)))
}
