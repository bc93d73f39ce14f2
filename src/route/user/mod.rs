use aide::axum::{routing::get_with, ApiRouter};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route(
		"/profile",
		get_with(get_profile, get_profile_docs).put_with(update_profile, update_profile_docs),
	)
}
