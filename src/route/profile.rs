//! Profile rules shared by the applicant, company, user and auth routes:
//! building a profile from its required fields, merging partial updates,
//! storing uploaded files, and expanding relations for responses.

use std::collections::HashMap;

use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
	error::{self, AppError, ErrorShape},
	route::{
		applicant::model::{ApplicantProfile, ApplicantView, UpdateApplicantProfile},
		auth::model::{Role, User},
		category::model::{Category, CategoryRef},
		company::model::{Company, CompanyView, UpdateCompany},
		user::model::{Owner, Profile},
	},
	store::StoreError,
	upload::{self, Kind, UploadedFile},
	Database,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} profile not found")]
	NotFound(&'static str),
	#[error("unknown category {0}")]
	UnknownCategory(Uuid),
	#[error("{0} is required")]
	Missing(&'static str),
	#[error("email already taken")]
	EmailTaken,
	#[error("password hashing failed")]
	Hashing(argon2::Error),
	#[error(transparent)]
	App(#[from] AppError),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl From<StoreError> for Error {
	fn from(error: StoreError) -> Self {
		Self::App(error.into())
	}
}

impl From<upload::Error> for Error {
	fn from(error: upload::Error) -> Self {
		Self::App(error.into())
	}
}

impl From<validator::ValidationErrors> for Error {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NotFound(..) => StatusCode::NOT_FOUND,
			Self::UnknownCategory(..) | Self::Missing(..) => StatusCode::BAD_REQUEST,
			Self::EmailTaken => StatusCode::CONFLICT,
			Self::Hashing(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::App(error) => error.status(),
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownCategory(category) => error::Message::new(self.to_string())
				.field("category")
				.detail("category", category.to_string())
				.into_vec(),
			Self::Missing(field) => error::Message::new(self.to_string())
				.field(*field)
				.into_vec(),
			Self::EmailTaken => error::Message::new(self.to_string())
				.field("email")
				.into_vec(),
			Self::App(error) => error.errors(),
			Self::NotFound(..) | Self::Hashing(..) => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

/// Trims text input, treating blank text as absent.
fn text(value: String) -> Option<String> {
	let value = value.trim();

	(!value.is_empty()).then(|| value.to_owned())
}

pub async fn find_category(database: &Database, id: Uuid) -> Result<Category, Error> {
	database
		.find_category(id)
		.await?
		.ok_or(Error::UnknownCategory(id))
}

/// Builds an applicant profile from the fields it cannot do without.
fn new_applicant(user_id: Uuid, update: &UpdateApplicantProfile) -> Result<ApplicantProfile, Error> {
	let required = |value: &Option<String>, field| value.clone().and_then(text).ok_or(Error::Missing(field));

	Ok(ApplicantProfile {
		id: Uuid::new_v4(),
		user_id,
		first_name: required(&update.first_name, "firstName")?,
		last_name: required(&update.last_name, "lastName")?,
		phone: None,
		category_id: update.category.ok_or(Error::Missing("category"))?,
		years_of_experience: 0,
		about: None,
		education: Vec::new(),
		experience: Vec::new(),
		skills: Vec::new(),
		resume: None,
		profile_picture: None,
		is_public: true,
		created_at: Utc::now(),
	})
}

/// Applies the fields that are set to the profile.
pub fn merge_applicant(profile: &mut ApplicantProfile, update: UpdateApplicantProfile) -> Result<(), AppError> {
	if let Some(first_name) = update.first_name {
		profile.first_name = first_name.trim().to_owned();
	}
	if let Some(last_name) = update.last_name {
		profile.last_name = last_name.trim().to_owned();
	}
	if let Some(phone) = update.phone {
		profile.phone = text(phone);
	}
	if let Some(category) = update.category {
		profile.category_id = category;
	}
	if let Some(years) = update.years_of_experience {
		profile.years_of_experience = years;
	}
	if let Some(about) = update.about {
		profile.about = text(about);
	}
	if let Some(education) = update.education {
		profile.education = education.decode("education")?;
	}
	if let Some(experience) = update.experience {
		profile.experience = experience.decode("experience")?;
	}
	if let Some(skills) = update.skills {
		profile.skills = skills.tags();
	}
	if let Some(is_public) = update.is_public {
		profile.is_public = is_public;
	}

	Ok(())
}

/// Builds a company profile from the fields it cannot do without.
fn new_company(user_id: Uuid, update: &UpdateCompany) -> Result<Company, Error> {
	let required = |value: &Option<String>, field| value.clone().and_then(text).ok_or(Error::Missing(field));
	let now = Utc::now();

	Ok(Company {
		id: Uuid::new_v4(),
		user_id,
		company_name: required(&update.company_name, "companyName")?,
		industry: None,
		description: None,
		address: required(&update.address, "address")?,
		website: None,
		phone: None,
		logo_url: upload::DEFAULT_LOGO_URL.to_owned(),
		established_year: None,
		created_at: now,
		updated_at: now,
	})
}

pub fn merge_company(company: &mut Company, update: UpdateCompany) {
	if let Some(company_name) = update.company_name {
		company.company_name = company_name.trim().to_owned();
	}
	if let Some(industry) = update.industry {
		company.industry = text(industry);
	}
	if let Some(description) = update.description {
		company.description = text(description);
	}
	if let Some(address) = update.address {
		company.address = address.trim().to_owned();
	}
	if let Some(website) = update.website {
		company.website = text(website);
	}
	if let Some(phone) = update.phone {
		company.phone = text(phone);
	}
	if let Some(year) = update.established_year {
		company.established_year = Some(year);
	}
}

/// Builds the applicant profile of a new account.
pub async fn create_applicant(
	database: &Database,
	user_id: Uuid,
	update: UpdateApplicantProfile,
) -> Result<ApplicantProfile, Error> {
	let mut profile = new_applicant(user_id, &update)?;
	find_category(database, profile.category_id).await?;

	merge_applicant(&mut profile, update)?;
	profile.validate()?;

	Ok(profile)
}

/// Builds the company profile of a new account.
pub fn create_company(user_id: Uuid, update: UpdateCompany) -> Result<Company, Error> {
	let mut company = new_company(user_id, &update)?;

	merge_company(&mut company, update);
	company.validate()?;

	Ok(company)
}

/// Saves every file, removing the ones already saved if one fails.
async fn store_files(
	uploads: &upload::Storage,
	files: &[(Kind, UploadedFile)],
) -> Result<Vec<(Kind, String)>, Error> {
	let mut saved = Vec::with_capacity(files.len());

	for (kind, file) in files {
		match uploads.save(*kind, file).await {
			Ok(path) => saved.push((*kind, path)),
			Err(error) => {
				discard(uploads, &saved).await;
				return Err(error.into());
			}
		}
	}

	Ok(saved)
}

async fn discard(uploads: &upload::Storage, saved: &[(Kind, String)]) {
	for (_, path) in saved {
		uploads.remove(path).await;
	}
}

/// Merges an update into the applicant's profile, creating it if the
/// account has none yet. New resume and profile picture files replace
/// the stored paths; the previous files stay on disk, since applications
/// keep pointing at the resume they were sent with.
pub async fn update_applicant(
	database: &Database,
	uploads: &upload::Storage,
	user_id: Uuid,
	update: UpdateApplicantProfile,
	files: Vec<UploadedFile>,
) -> Result<ApplicantProfile, Error> {
	let files = upload::classify(files, &[Kind::Resume, Kind::ProfilePicture])?;

	if let Some(category) = update.category {
		find_category(database, category).await?;
	}

	let mut profile = match database.find_applicant(user_id).await? {
		Some(profile) => profile,
		None => new_applicant(user_id, &update)?,
	};

	merge_applicant(&mut profile, update)?;
	profile.validate()?;

	let saved = store_files(uploads, &files).await?;

	for (kind, path) in &saved {
		match kind {
			Kind::Resume => profile.resume = Some(path.clone()),
			Kind::ProfilePicture => profile.profile_picture = Some(path.clone()),
			Kind::CompanyLogo => {}
		}
	}

	if let Err(error) = database.save_applicant(&profile).await {
		discard(uploads, &saved).await;
		return Err(error.into());
	}

	Ok(profile)
}

/// Merges an update into the company's profile, creating it if the account
/// has none yet. A new logo replaces the previous uploaded one, which is
/// removed from disk once the profile points at the new file.
pub async fn update_company(
	database: &Database,
	uploads: &upload::Storage,
	user_id: Uuid,
	update: UpdateCompany,
	files: Vec<UploadedFile>,
) -> Result<Company, Error> {
	let files = upload::classify(files, &[Kind::CompanyLogo])?;

	let mut company = match database.find_company_by_user(user_id).await? {
		Some(company) => company,
		None => new_company(user_id, &update)?,
	};

	merge_company(&mut company, update);
	company.validate()?;

	let saved = store_files(uploads, &files).await?;
	let previous_logo = saved
		.last()
		.map(|(_, path)| std::mem::replace(&mut company.logo_url, path.clone()));

	company.updated_at = Utc::now();

	if let Err(error) = database.save_company(&company).await {
		discard(uploads, &saved).await;
		return Err(error.into());
	}

	if let Some(previous) = previous_logo {
		if previous != upload::DEFAULT_LOGO_URL {
			uploads.remove(&previous).await;
		}
	}

	Ok(company)
}

async fn owners(database: &Database, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Owner>, StoreError> {
	Ok(database
		.find_users(&ids)
		.await?
		.iter()
		.map(|user| (user.id, Owner::from(user)))
		.collect())
}

/// Loads the categories with the given ids. Missing ones are left out.
pub async fn categories(database: &Database, ids: Vec<Uuid>) -> Result<HashMap<Uuid, CategoryRef>, StoreError> {
	Ok(database
		.find_categories(&ids)
		.await?
		.iter()
		.map(|category| (category.id, CategoryRef::from(category)))
		.collect())
}

/// Expands the category and owner of each profile.
pub async fn applicant_views(
	database: &Database,
	profiles: Vec<ApplicantProfile>,
) -> Result<Vec<ApplicantView>, StoreError> {
	let categories = categories(database, profiles.iter().map(|p| p.category_id).collect()).await?;
	let owners = owners(database, profiles.iter().map(|p| p.user_id).collect()).await?;

	Ok(profiles
		.into_iter()
		.map(|profile| ApplicantView {
			category: categories.get(&profile.category_id).cloned(),
			user: owners.get(&profile.user_id).cloned(),
			profile,
		})
		.collect())
}

pub async fn applicant_view(database: &Database, profile: ApplicantProfile) -> Result<ApplicantView, Error> {
	applicant_views(database, vec![profile])
		.await?
		.pop()
		.ok_or(Error::NotFound("applicant"))
}

/// Expands the owner of each company.
pub async fn company_views(database: &Database, companies: Vec<Company>) -> Result<Vec<CompanyView>, StoreError> {
	let owners = owners(database, companies.iter().map(|c| c.user_id).collect()).await?;

	Ok(companies
		.into_iter()
		.map(|company| CompanyView {
			user: owners.get(&company.user_id).cloned(),
			company,
		})
		.collect())
}

pub async fn company_view(database: &Database, company: Company) -> Result<CompanyView, Error> {
	company_views(database, vec![company])
		.await?
		.pop()
		.ok_or(Error::NotFound("company"))
}

/// Loads the expanded profile of an account, if its role has one.
pub async fn of_user(database: &Database, user: &User) -> Result<Option<Profile>, Error> {
	Ok(match user.role {
		Role::Applicant => match database.find_applicant(user.id).await? {
			Some(profile) => Some(Profile::Applicant(applicant_view(database, profile).await?)),
			None => None,
		},
		Role::Company => match database.find_company_by_user(user.id).await? {
			Some(company) => Some(Profile::Company(company_view(database, company).await?)),
			None => None,
		},
		Role::Admin => None,
	})
}

/// The name shown after logging in.
pub async fn display_name(database: &Database, user: &User) -> Result<String, StoreError> {
	let name = match user.role {
		Role::Applicant => database
			.find_applicant(user.id)
			.await?
			.map(|profile| format!("{} {}", profile.first_name, profile.last_name)),
		Role::Company => database
			.find_company_by_user(user.id)
			.await?
			.map(|company| company.company_name),
		Role::Admin => Some("Admin".to_owned()),
	};

	Ok(name.unwrap_or_else(|| user.email.clone()))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::route::model::ListInput;

	fn applicant() -> ApplicantProfile {
		new_applicant(
			Uuid::new_v4(),
			&UpdateApplicantProfile {
				first_name: Some(" Aysel ".into()),
				last_name: Some("Məmmədova".into()),
				category: Some(Uuid::new_v4()),
				..Default::default()
			},
		)
		.unwrap()
	}

	#[test]
	fn test_new_applicant_requires_fields() {
		let error = new_applicant(
			Uuid::new_v4(),
			&UpdateApplicantProfile {
				first_name: Some("Aysel".into()),
				last_name: Some("   ".into()),
				..Default::default()
			},
		)
		.unwrap_err();

		assert!(matches!(error, Error::Missing("lastName")));
	}

	#[test]
	fn test_new_applicant_defaults() {
		let profile = applicant();

		assert_eq!(profile.first_name, "Aysel");
		assert_eq!(profile.years_of_experience, 0);
		assert!(profile.is_public);
		assert!(profile.resume.is_none());
	}

	#[test]
	fn test_merge_leaves_unset_fields() {
		let mut profile = applicant();
		profile.about = Some("About me".into());
		profile.skills = vec!["rust".into()];

		merge_applicant(
			&mut profile,
			UpdateApplicantProfile {
				phone: Some("+994".into()),
				..Default::default()
			},
		)
		.unwrap();

		assert_eq!(profile.phone.as_deref(), Some("+994"));
		assert_eq!(profile.about.as_deref(), Some("About me"));
		assert_eq!(profile.skills, vec!["rust".to_owned()]);
	}

	#[test]
	fn test_merge_rejects_malformed_lists() {
		let mut profile = applicant();
		profile.education = vec![Default::default()];

		let result = merge_applicant(
			&mut profile,
			UpdateApplicantProfile {
				education: Some(ListInput::Encoded("[{".into())),
				..Default::default()
			},
		);

		assert!(matches!(result, Err(AppError::Input { field: "education", .. })));
		assert_eq!(profile.education.len(), 1);
	}

	#[test]
	fn test_new_company_uses_placeholder_logo() {
		let company = create_company(
			Uuid::new_v4(),
			UpdateCompany {
				company_name: Some("Acme".into()),
				address: Some("Bakı".into()),
				website: Some("".into()),
				..Default::default()
			},
		)
		.unwrap();

		assert_eq!(company.logo_url, upload::DEFAULT_LOGO_URL);
		assert!(company.website.is_none());
	}

	#[test]
	fn test_invalid_website_is_rejected() {
		let result = create_company(
			Uuid::new_v4(),
			UpdateCompany {
				company_name: Some("Acme".into()),
				address: Some("Bakı".into()),
				website: Some("not a url".into()),
				..Default::default()
			},
		);

		assert!(matches!(result, Err(Error::App(AppError::Validation(..)))));
	}
}
