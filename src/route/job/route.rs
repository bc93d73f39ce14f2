use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use macros::route;
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{Json, Path, Query, Session},
	openapi::tag,
	route::{
		auth::model::{Role, User},
		company::model::{Company, CompanyDetails, CompanySummary},
		model::{Data, Done, IdInput, List},
		profile,
	},
	store::{JobFilter, StoreError},
	Database,
};

use super::{model, Error, RouteError};

/// Returns the trimmed filter value, ignoring empty ones.
fn filter_value(value: Option<String>) -> Option<String> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
}

/// An exact-match filter value that no job can carry.
#[derive(Debug, PartialEq)]
struct NoMatch;

/// Parses an exact-match filter.
fn filter_label<T: std::str::FromStr>(value: Option<String>) -> Result<Option<T>, NoMatch> {
	filter_value(value)
		.map(|value| value.parse().map_err(|_| NoMatch))
		.transpose()
}

/// Expands the company and category of each job.
async fn expand<C>(database: &Database, jobs: Vec<model::Job>) -> Result<Vec<model::JobView<C>>, StoreError>
where
	C: for<'c> From<&'c Company>,
{
	let company_ids = jobs.iter().map(|job| job.company_id).collect::<Vec<_>>();
	let companies = database
		.find_companies(&company_ids)
		.await?
		.into_iter()
		.map(|company| (company.id, company))
		.collect::<HashMap<_, _>>();
	let categories = profile::categories(database, jobs.iter().map(|job| job.category_id).collect()).await?;

	Ok(jobs
		.into_iter()
		.map(|job| model::JobView {
			company: companies.get(&job.company_id).map(|company| C::from(company)),
			category: categories.get(&job.category_id).cloned(),
			job,
		})
		.collect())
}

/// Finds the company profile of the authenticated company account.
async fn own_company(database: &Database, session: &Session) -> Result<Company, RouteError> {
	let user = session.authorize(&[Role::Company])?;
	let company = database
		.find_company_by_user(user.id)
		.await?
		.ok_or(Error::NoCompanyProfile)?;

	Ok(company)
}

/// Finds a job owned by the authenticated company account.
async fn owned_job(database: &Database, session: &Session, id: Uuid) -> Result<model::Job, RouteError> {
	let job = database.find_job(id).await?.ok_or(Error::UnknownJob(id))?;
	let user = session.authorize(&[Role::Company])?;
	let company = database.find_company_by_user(user.id).await?;

	match company {
		Some(company) if company.id == job.company_id => Ok(job),
		_ => Err(Error::NotOwner.into()),
	}
}

async fn ensure_category(database: &Database, id: Uuid) -> Result<(), RouteError> {
	match database.find_category(id).await? {
		Some(..) => Ok(()),
		None => Err(Error::UnknownCategory(id).into()),
	}
}

/// List jobs
/// Returns the jobs matching every filter that is set, newest first. Text filters
/// match case-insensitive substrings; salary range, job type and experience level match exactly.
#[route(tag = tag::JOB)]
pub async fn get_jobs(
	State(database): State<Database>,
	Query(query): Query<model::JobQuery>,
) -> Result<Json<List<model::JobView<CompanySummary>>>, RouteError> {
	let (Ok(salary_range), Ok(job_type), Ok(experience_level)) = (
		filter_label(query.salary_range),
		filter_label(query.job_type),
		filter_label(query.experience_level),
	) else {
		return Ok(Json(List::new(Vec::new())));
	};

	let mut filter = JobFilter {
		location: filter_value(query.location),
		title: filter_value(query.title),
		salary_range,
		job_type,
		experience_level,
		..Default::default()
	};

	if let Some(name) = filter_value(query.category) {
		let Some(category) = database.search_category(&name).await? else {
			return Ok(Json(List::new(Vec::new())));
		};

		filter.category_id = Some(category.id);
	}

	if let Some(name) = filter_value(query.company_name) {
		let company_ids = database.search_company_ids(&name).await?;

		if company_ids.is_empty() {
			return Ok(Json(List::new(Vec::new())));
		}

		filter.company_ids = Some(company_ids);
	}

	let jobs = database.list_jobs(&filter).await?;

	Ok(Json(List::new(expand(&database, jobs).await?)))
}

/// Get job
/// Returns a single job with its company details and category.
#[route(tag = tag::JOB)]
pub async fn get_job(
	State(database): State<Database>,
	Path(input): Path<IdInput>,
) -> Result<Json<Data<model::JobView<CompanyDetails>>>, RouteError> {
	let job = database
		.find_job(input.id)
		.await?
		.ok_or(Error::UnknownJob(input.id))?;

	let view = expand(&database, vec![job])
		.await?
		.pop()
		.ok_or(Error::UnknownJob(input.id))?;

	Ok(Json(Data::new(view)))
}

/// Create job
/// Posts a job for the authenticated company. The company must have completed its profile,
/// and the job always belongs to it regardless of the input.
#[route(tag = tag::JOB, role = "company", response(status = 201, description = "Job created.", shape = "Json<Data<model::Job>>"))]
pub async fn create_job(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateJob>,
) -> Result<(StatusCode, Json<Data<model::Job>>), RouteError> {
	let company = own_company(&database, &session).await?;
	ensure_category(&database, input.category_id).await?;

	let job = model::Job::new(company.id, input);
	job.validate()?;
	database.insert_job(&job).await?;

	tracing::info!(job = %job.id, company = %company.id, "job created");

	Ok((StatusCode::CREATED, Json(Data::new(job))))
}

/// Update job
/// Updates the fields that are sent on a job owned by the authenticated company.
#[route(tag = tag::JOB, role = "company")]
pub async fn update_job(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
	Json(update): Json<model::UpdateJob>,
) -> Result<Json<Data<model::Job>>, RouteError> {
	let mut job = owned_job(&database, &session, input.id).await?;

	if let Some(category) = update.category_id {
		ensure_category(&database, category).await?;
	}

	job.apply(update);
	job.validate()?;
	database.update_job(&job).await?;

	tracing::info!(job = %job.id, "job updated");

	Ok(Json(Data::new(job)))
}

/// Delete job
/// Deletes a job owned by the authenticated company, along with its applications.
#[route(tag = tag::JOB, role = "company")]
pub async fn delete_job(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<Done>, RouteError> {
	let job = owned_job(&database, &session, input.id).await?;

	if !database.delete_job(job.id).await? {
		return Err(Error::UnknownJob(job.id).into());
	}

	tracing::info!(job = %job.id, "job deleted");

	Ok(Json(Done::new("job removed")))
}

/// Apply to job
/// Applies to a job with the resume currently on the applicant's profile.
/// An applicant can apply to each job once.
#[route(tag = tag::JOB, role = "applicant", response(status = 201, description = "Application submitted.", shape = "Json<Done>"))]
pub async fn apply(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<(StatusCode, Json<Done>), RouteError> {
	let job = database
		.find_job(input.id)
		.await?
		.ok_or(Error::UnknownJob(input.id))?;
	let user = session.authorize(&[Role::Applicant])?;

	let applications = database.list_applications(job.id).await?;

	if applications.iter().any(|application| application.user_id == user.id) {
		return Err(Error::AlreadyApplied.into());
	}

	let resume = database
		.find_applicant(user.id)
		.await?
		.and_then(|profile| profile.resume)
		.filter(|resume| !resume.is_empty())
		.ok_or(Error::MissingResume)?;

	let application = model::Application {
		job_id: job.id,
		user_id: user.id,
		resume: Some(resume),
		applied_at: Utc::now(),
	};

	match database.add_application(&application).await {
		Ok(()) => {}
		Err(StoreError::Conflict(..)) => return Err(Error::AlreadyApplied.into()),
		Err(error) => return Err(error.into()),
	}

	tracing::info!(job = %job.id, user = %user.id, "application submitted");

	Ok((StatusCode::CREATED, Json(Done::new("application submitted"))))
}

/// List own jobs
/// Returns the jobs posted by the authenticated company, newest first.
#[route(tag = tag::JOB, role = "company")]
pub async fn get_company_jobs(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<List<model::JobView<CompanySummary>>>, RouteError> {
	let company = own_company(&database, &session).await?;
	let jobs = database
		.list_jobs(&JobFilter {
			company_ids: Some(vec![company.id]),
			..Default::default()
		})
		.await?;

	Ok(Json(List::new(expand(&database, jobs).await?)))
}

/// List applicants
/// Returns the applicants of a job owned by the authenticated company, oldest application first.
/// Each entry holds the resume that was sent with the application.
#[route(tag = tag::JOB, role = "company")]
pub async fn get_applicants(
	State(database): State<Database>,
	session: Session,
	Path(input): Path<IdInput>,
) -> Result<Json<List<model::ApplicantDetails>>, RouteError> {
	let job = owned_job(&database, &session, input.id).await?;
	let applications = database.list_applications(job.id).await?;
	let user_ids = applications.iter().map(|a| a.user_id).collect::<Vec<_>>();

	let users = database
		.find_users(&user_ids)
		.await?
		.into_iter()
		.filter(|user| user.role == Role::Applicant)
		.map(|user| (user.id, user))
		.collect::<HashMap<Uuid, User>>();
	let profiles = database
		.find_applicants(&user_ids)
		.await?
		.into_iter()
		.map(|profile| (profile.user_id, profile))
		.collect::<HashMap<_, _>>();
	let categories = profile::categories(&database, profiles.values().map(|p| p.category_id).collect()).await?;

	let applicants = applications
		.into_iter()
		.filter_map(|application| {
			let user = users.get(&application.user_id)?;
			let profile = profiles.get(&application.user_id)?;

			Some(model::ApplicantDetails {
				id: user.id,
				email: user.email.clone(),
				role: user.role,
				first_name: profile.first_name.clone(),
				last_name: profile.last_name.clone(),
				category: categories
					.get(&profile.category_id)
					.map(|category| category.name.clone()),
				years_of_experience: profile.years_of_experience,
				phone: profile.phone.clone(),
				about: profile.about.clone(),
				education: profile.education.clone(),
				experience: profile.experience.clone(),
				skills: profile.skills.clone(),
				resume: application.resume,
				profile_picture: profile.profile_picture.clone(),
				applied_at: application.applied_at,
			})
		})
		.collect();

	Ok(Json(List::new(applicants)))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_empty_filters_are_ignored() {
		assert_eq!(filter_value(Some("  ".into())), None);
		assert_eq!(filter_value(Some(" Bakı ".into())), Some("Bakı".into()));
		assert_eq!(filter_label::<model::JobType>(Some(String::new())), Ok(None));
	}

	#[test]
	fn test_labels_parse_exactly() {
		assert_eq!(filter_label::<model::JobType>(Some("Remote".into())), Err(NoMatch));
		assert_eq!(
			filter_label::<model::SalaryRange>(Some("3000+ AZN".into())),
			Ok(Some(model::SalaryRange::Over3000))
		);
	}
}
