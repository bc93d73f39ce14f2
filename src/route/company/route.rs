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

/// Get own company profile
/// Returns the profile of the authenticated company, with its account.
#[route(tag = tag::COMPANY, role = "company")]
pub async fn get_me(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Data<model::CompanyView>>, RouteError> {
	let user = session.authorize(&[Role::Company])?;
	let company = database
		.find_company_by_user(user.id)
		.await?
		.ok_or(Error::NotFound("company"))?;

	Ok(Json(Data::new(profile::company_view(&database, company).await?)))
}

/// Update own company profile
/// Updates the fields that are sent, creating the profile if needed. Accepts JSON or
/// a multipart form with a `logo` file (JPEG, PNG, GIF), which replaces the previous logo.
#[route(tag = tag::COMPANY, role = "company")]
pub async fn update_profile(
	State(database): State<Database>,
	State(uploads): State<Arc<upload::Storage>>,
	session: Session,
	form: Form<model::UpdateCompany>,
) -> Result<Json<Data<model::CompanyView>>, RouteError> {
	let user = session.authorize(&[Role::Company])?;
	let company = profile::update_company(&database, &uploads, user.id, form.input, form.files).await?;

	tracing::info!(user = %user.id, company = %company.id, "company profile updated");

	Ok(Json(Data::new(profile::company_view(&database, company).await?)))
}

/// List companies
/// Returns every company profile, newest first.
#[route(tag = tag::COMPANY)]
pub async fn get_companies(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<List<model::CompanyView>>, RouteError> {
	let companies = database.list_companies().await?;

	Ok(Json(List::new(profile::company_views(&database, companies).await?)))
}

/// Get company
/// Returns a company by its id, or by the id of the account that owns it.
#[route(tag = tag::COMPANY)]
pub async fn get_company(
	State(database): State<Database>,
	_session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<Data<model::CompanyView>>, RouteError> {
	let company = match database.find_company(input.id).await? {
		Some(company) => company,
		None => database
			.find_company_by_user(input.id)
			.await?
			.ok_or(Error::NotFound("company"))?,
	};

	Ok(Json(Data::new(profile::company_view(&database, company).await?)))
}
