use aide::axum::ApiRouter;
use tower_governor::GovernorLayer;

use crate::{ratelimit, AppState};

pub mod admin;
pub mod applicant;
pub mod auth;
pub mod category;
pub mod company;
pub mod docs;
pub mod job;
pub mod model;
pub mod profile;
pub mod user;

/// Every API route, mounted at its prefix.
///
/// `auth_limit` is layered over the authentication routes only.
pub fn routes(auth_limit: Option<ratelimit::Config>) -> ApiRouter<AppState> {
	let auth = match auth_limit {
		Some(config) => auth::routes().layer(GovernorLayer { config }),
		None => auth::routes(),
	};

	ApiRouter::new()
		.nest("/auth", auth)
		.nest("/users", user::routes())
		.nest("/applicants", applicant::routes())
		.nest("/companies", company::routes())
		.nest("/categories", category::routes())
		.nest("/jobs", job::routes())
		.nest("/admin", admin::routes())
}
