//! Persistence for accounts, profiles, categories, jobs and applications.
//!
//! Handlers only see the [`Store`] trait. [`PgStore`] keeps data in
//! Postgres, while [`MemoryStore`] keeps it in process for development
//! and tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::route::{
	applicant::model::ApplicantProfile,
	auth::model::User,
	category::model::Category,
	company::model::Company,
	job::model::{Application, ExperienceLevel, Job, JobType, SalaryRange},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// A unique value is already taken. Holds the name of the field.
	#[error("{0} already in use")]
	Conflict(&'static str),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("corrupt record: {0}")]
	Corrupt(String),
}

/// The profile created together with a new account.
#[derive(Debug, Clone)]
pub enum NewProfile {
	Applicant(ApplicantProfile),
	Company(Company),
}

/// Filters for listing jobs. Every filter that is set must match.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
	pub category_id: Option<Uuid>,
	/// Jobs posted by any of these companies.
	pub company_ids: Option<Vec<Uuid>>,
	/// Case-insensitive substring of the location.
	pub location: Option<String>,
	/// Case-insensitive substring of the title.
	pub title: Option<String>,
	pub salary_range: Option<SalaryRange>,
	pub job_type: Option<JobType>,
	pub experience_level: Option<ExperienceLevel>,
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
	/// Inserts an account and its profile together. Either both are stored or neither is.
	async fn insert_account(&self, user: &User, profile: Option<&NewProfile>) -> Result<(), StoreError>;
	async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
	/// Looks up an account by its email, ignoring case.
	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
	/// Lists every account, oldest first.
	async fn list_users(&self) -> Result<Vec<User>, StoreError>;
	async fn update_user(&self, user: &User) -> Result<(), StoreError>;
	/// Deletes an account along with its profiles. Returns false if it did not exist.
	async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

	/// Stores the digest of a password reset token and when it expires.
	async fn set_reset_token(
		&self,
		user_id: Uuid,
		digest: Option<&str>,
		expires_at: Option<DateTime<Utc>>,
	) -> Result<(), StoreError>;
	/// Finds the account holding the unexpired reset token digest.
	async fn find_user_by_reset_token(
		&self,
		digest: &str,
		now: DateTime<Utc>,
	) -> Result<Option<User>, StoreError>;
	/// Replaces the password and clears the reset token, if the token is still
	/// held by the account and unexpired. Returns false otherwise.
	async fn consume_reset_token(
		&self,
		user_id: Uuid,
		digest: &str,
		now: DateTime<Utc>,
		password: &[u8],
	) -> Result<bool, StoreError>;

	async fn find_applicant(&self, user_id: Uuid) -> Result<Option<ApplicantProfile>, StoreError>;
	async fn find_applicants(&self, user_ids: &[Uuid]) -> Result<Vec<ApplicantProfile>, StoreError>;
	/// Lists applicant profiles, newest first.
	async fn list_applicants(&self, public_only: bool) -> Result<Vec<ApplicantProfile>, StoreError>;
	/// Inserts or replaces the profile owned by `profile.user_id`.
	async fn save_applicant(&self, profile: &ApplicantProfile) -> Result<(), StoreError>;
	async fn delete_applicant(&self, user_id: Uuid) -> Result<bool, StoreError>;

	async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError>;
	async fn find_company_by_user(&self, user_id: Uuid) -> Result<Option<Company>, StoreError>;
	async fn find_companies(&self, ids: &[Uuid]) -> Result<Vec<Company>, StoreError>;
	/// Lists company profiles, newest first.
	async fn list_companies(&self) -> Result<Vec<Company>, StoreError>;
	/// Returns the ids of companies whose name contains `name`, ignoring case.
	async fn search_company_ids(&self, name: &str) -> Result<Vec<Uuid>, StoreError>;
	/// Inserts or replaces the profile owned by `company.user_id`.
	async fn save_company(&self, company: &Company) -> Result<(), StoreError>;
	async fn delete_company(&self, user_id: Uuid) -> Result<bool, StoreError>;

	/// Lists categories by name.
	async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
	async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError>;
	async fn find_categories(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError>;
	/// Returns the first category, by name, whose name contains `name`, ignoring case.
	async fn search_category(&self, name: &str) -> Result<Option<Category>, StoreError>;
	async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;
	async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError>;

	/// Lists matching jobs, newest first.
	async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;
	async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError>;
	async fn insert_job(&self, job: &Job) -> Result<(), StoreError>;
	async fn update_job(&self, job: &Job) -> Result<(), StoreError>;
	async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError>;

	/// Records an application. Fails with [`StoreError::Conflict`] if the
	/// user already applied to the job.
	async fn add_application(&self, application: &Application) -> Result<(), StoreError>;
	/// Lists the applications to a job, oldest first.
	async fn list_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError>;
}

/// Escapes `LIKE` wildcards and wraps the pattern for a substring match.
pub(crate) fn contains_pattern(text: &str) -> String {
	let mut pattern = String::with_capacity(text.len() + 2);
	pattern.push('%');

	for c in text.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(c);
	}

	pattern.push('%');
	pattern
}

/// Case-insensitive substring match, as done by the database.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
	haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_contains_pattern_escapes_wildcards() {
		assert_eq!(contains_pattern("dev"), "%dev%");
		assert_eq!(contains_pattern("100%_a"), "%100\\%\\_a%");
	}

	#[test]
	fn test_contains_ignore_case() {
		assert!(contains_ignore_case("Bakı, Azərbaycan", "AZƏRBAYCAN"));
		assert!(!contains_ignore_case("Gəncə", "Bakı"));
	}
}
