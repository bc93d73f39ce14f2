use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	route::{
		auth::model::Role,
		model::{Data, Done, IdInput, List},
	},
	Database,
};

use super::{model, Error, RouteError};

/// List categories
/// Returns every category, sorted by name.
#[route(tag = tag::CATEGORY)]
pub async fn get_categories(
	State(database): State<Database>,
) -> Result<Json<List<model::Category>>, RouteError> {
	Ok(Json(List::new(database.list_categories().await?)))
}

/// Create category
/// Creates a category with a unique, trimmed name. Only admins can create categories.
#[route(tag = tag::CATEGORY, role = "admin", response(status = 201, description = "Category created.", shape = "Json<Data<model::Category>>"))]
pub async fn create_category(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateCategory>,
) -> Result<(StatusCode, Json<Data<model::Category>>), RouteError> {
	session.authorize(&[Role::Admin])?;

	let category = model::Category::new(&input.name);
	database.insert_category(&category).await?;

	tracing::info!(category = %category.id, name = %category.name, "category created");

	Ok((StatusCode::CREATED, Json(Data::new(category))))
}

/// Delete category
/// Deletes a category. Profiles and jobs that reference it keep the dangling id.
#[route(tag = tag::CATEGORY, role = "admin")]
pub async fn delete_category(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<Done>, RouteError> {
	session.authorize(&[Role::Admin])?;

	if !database.delete_category(input.id).await? {
		return Err(Error::UnknownCategory(input.id).into());
	}

	tracing::info!(category = %input.id, "category deleted");

	Ok(Json(Done::new("category removed")))
}
