use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown job {0}")]
	UnknownJob(Uuid),
	#[error("unknown category {0}")]
	UnknownCategory(Uuid),
	#[error("not authorized to manage this job")]
	NotOwner,
	#[error("complete your company profile before posting jobs")]
	NoCompanyProfile,
	#[error("you have already applied to this job")]
	AlreadyApplied,
	#[error("upload a resume to your profile before applying")]
	MissingResume,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_jobs, get_jobs_docs).post_with(create_job, create_job_docs),
		)
		.api_route(
			"/company/myjobs",
			get_with(get_company_jobs, get_company_jobs_docs),
		)
		.api_route(
			"/:id",
			get_with(get_job, get_job_docs)
				.put_with(update_job, update_job_docs)
				.delete_with(delete_job, delete_job_docs),
		)
		.api_route("/:id/apply", post_with(apply, apply_docs))
		.api_route("/:id/applicants", get_with(get_applicants, get_applicants_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownJob(..) | Self::NoCompanyProfile => StatusCode::NOT_FOUND,
			Self::UnknownCategory(..) | Self::MissingResume => StatusCode::BAD_REQUEST,
			Self::NotOwner => StatusCode::UNAUTHORIZED,
			Self::AlreadyApplied => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownJob(job) => error::Message::new(self.to_string())
				.detail("job", job.to_string())
				.into_vec(),
			Self::UnknownCategory(category) => error::Message::new(self.to_string())
				.field("categoryId")
				.detail("category", category.to_string())
				.into_vec(),
			Self::MissingResume => error::Message::new(self.to_string())
				.field("resume")
				.into_vec(),
			_ => error::Message::new(self.to_string()).into_vec(),
		}
	}
}
