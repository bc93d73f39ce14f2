use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{contains_ignore_case, JobFilter, NewProfile, Store, StoreError};
use crate::route::{
	applicant::model::ApplicantProfile,
	auth::model::User,
	category::model::Category,
	company::model::Company,
	job::model::{Application, Job},
};

#[derive(Default)]
struct Tables {
	users: Vec<User>,
	applicants: Vec<ApplicantProfile>,
	companies: Vec<Company>,
	categories: Vec<Category>,
	jobs: Vec<Job>,
	applications: Vec<Application>,
}

impl Tables {
	fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
		self.users
			.iter()
			.any(|user| Some(user.id) != except && user.email == email)
	}

	fn company_name_taken(&self, name: &str, owner: Uuid) -> bool {
		self.companies
			.iter()
			.any(|company| company.user_id != owner && company.company_name == name)
	}

	fn with_count(&self, job: &Job) -> Job {
		let mut job = job.clone();
		job.applicant_count = self
			.applications
			.iter()
			.filter(|application| application.job_id == job.id)
			.count() as i64;
		job
	}
}

/// Keeps every table in process memory behind a single lock.
///
/// Nothing survives a restart. Each operation holds the lock for its whole
/// duration, so multi-step writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
	let mut items = items.to_vec();
	items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
	items
}

#[async_trait::async_trait]
impl Store for MemoryStore {
	async fn insert_account(&self, user: &User, profile: Option<&NewProfile>) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables.email_taken(&user.email, None) {
			return Err(StoreError::Conflict("email"));
		}

		if let Some(NewProfile::Company(company)) = profile {
			if tables.company_name_taken(&company.company_name, company.user_id) {
				return Err(StoreError::Conflict("companyName"));
			}
		}

		tables.users.push(user.clone());

		match profile {
			Some(NewProfile::Applicant(applicant)) => tables.applicants.push(applicant.clone()),
			Some(NewProfile::Company(company)) => tables.companies.push(company.clone()),
			None => {}
		}

		Ok(())
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables.users.iter().find(|user| user.id == id).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.iter()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.iter()
			.filter(|user| ids.contains(&user.id))
			.cloned()
			.collect())
	}

	async fn list_users(&self) -> Result<Vec<User>, StoreError> {
		let tables = self.tables.read().await;
		let mut users = tables.users.clone();
		users.sort_by_key(|user| user.created_at);

		Ok(users)
	}

	async fn update_user(&self, user: &User) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables.email_taken(&user.email, Some(user.id)) {
			return Err(StoreError::Conflict("email"));
		}

		if let Some(existing) = tables.users.iter_mut().find(|existing| existing.id == user.id) {
			*existing = user.clone();
		}

		Ok(())
	}

	async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;
		let before = tables.users.len();

		tables.users.retain(|user| user.id != id);
		tables.applicants.retain(|profile| profile.user_id != id);
		tables.companies.retain(|company| company.user_id != id);

		Ok(tables.users.len() != before)
	}

	async fn set_reset_token(
		&self,
		user_id: Uuid,
		digest: Option<&str>,
		expires_at: Option<DateTime<Utc>>,
	) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if let Some(user) = tables.users.iter_mut().find(|user| user.id == user_id) {
			user.reset_token = digest.map(str::to_owned);
			user.reset_token_expiry = expires_at;
		}

		Ok(())
	}

	async fn find_user_by_reset_token(
		&self,
		digest: &str,
		now: DateTime<Utc>,
	) -> Result<Option<User>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.iter()
			.find(|user| {
				user.reset_token.as_deref() == Some(digest)
					&& user.reset_token_expiry.is_some_and(|expiry| expiry > now)
			})
			.cloned())
	}

	async fn consume_reset_token(
		&self,
		user_id: Uuid,
		digest: &str,
		now: DateTime<Utc>,
		password: &[u8],
	) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;

		let Some(user) = tables.users.iter_mut().find(|user| {
			user.id == user_id
				&& user.reset_token.as_deref() == Some(digest)
				&& user.reset_token_expiry.is_some_and(|expiry| expiry > now)
		}) else {
			return Ok(false);
		};

		user.password = password.to_vec();
		user.reset_token = None;
		user.reset_token_expiry = None;

		Ok(true)
	}

	async fn find_applicant(&self, user_id: Uuid) -> Result<Option<ApplicantProfile>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.applicants
			.iter()
			.find(|profile| profile.user_id == user_id)
			.cloned())
	}

	async fn find_applicants(&self, user_ids: &[Uuid]) -> Result<Vec<ApplicantProfile>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.applicants
			.iter()
			.filter(|profile| user_ids.contains(&profile.user_id))
			.cloned()
			.collect())
	}

	async fn list_applicants(&self, public_only: bool) -> Result<Vec<ApplicantProfile>, StoreError> {
		let tables = self.tables.read().await;
		let mut profiles = newest_first(&tables.applicants, |profile| profile.created_at);

		if public_only {
			profiles.retain(|profile| profile.is_public);
		}

		Ok(profiles)
	}

	async fn save_applicant(&self, profile: &ApplicantProfile) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		match tables
			.applicants
			.iter()
			.position(|existing| existing.user_id == profile.user_id)
		{
			Some(index) => tables.applicants[index] = profile.clone(),
			None => tables.applicants.push(profile.clone()),
		}

		Ok(())
	}

	async fn delete_applicant(&self, user_id: Uuid) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;
		let before = tables.applicants.len();

		tables.applicants.retain(|profile| profile.user_id != user_id);

		Ok(tables.applicants.len() != before)
	}

	async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables.companies.iter().find(|company| company.id == id).cloned())
	}

	async fn find_company_by_user(&self, user_id: Uuid) -> Result<Option<Company>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.companies
			.iter()
			.find(|company| company.user_id == user_id)
			.cloned())
	}

	async fn find_companies(&self, ids: &[Uuid]) -> Result<Vec<Company>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.companies
			.iter()
			.filter(|company| ids.contains(&company.id))
			.cloned()
			.collect())
	}

	async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
		let tables = self.tables.read().await;

		Ok(newest_first(&tables.companies, |company| company.created_at))
	}

	async fn search_company_ids(&self, name: &str) -> Result<Vec<Uuid>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.companies
			.iter()
			.filter(|company| contains_ignore_case(&company.company_name, name))
			.map(|company| company.id)
			.collect())
	}

	async fn save_company(&self, company: &Company) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables.company_name_taken(&company.company_name, company.user_id) {
			return Err(StoreError::Conflict("companyName"));
		}

		match tables
			.companies
			.iter()
			.position(|existing| existing.user_id == company.user_id)
		{
			Some(index) => tables.companies[index] = company.clone(),
			None => tables.companies.push(company.clone()),
		}

		Ok(())
	}

	async fn delete_company(&self, user_id: Uuid) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;
		let before = tables.companies.len();

		tables.companies.retain(|company| company.user_id != user_id);

		Ok(tables.companies.len() != before)
	}

	async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
		let tables = self.tables.read().await;
		let mut categories = tables.categories.clone();
		categories.sort_by(|a, b| a.name.cmp(&b.name));

		Ok(categories)
	}

	async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.categories
			.iter()
			.find(|category| category.id == id)
			.cloned())
	}

	async fn find_categories(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.categories
			.iter()
			.filter(|category| ids.contains(&category.id))
			.cloned()
			.collect())
	}

	async fn search_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.categories
			.iter()
			.filter(|category| contains_ignore_case(&category.name, name))
			.min_by(|a, b| a.name.cmp(&b.name))
			.cloned())
	}

	async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables
			.categories
			.iter()
			.any(|existing| existing.name == category.name)
		{
			return Err(StoreError::Conflict("name"));
		}

		tables.categories.push(category.clone());

		Ok(())
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;
		let before = tables.categories.len();

		tables.categories.retain(|category| category.id != id);

		Ok(tables.categories.len() != before)
	}

	async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
		let tables = self.tables.read().await;

		let jobs = tables
			.jobs
			.iter()
			.filter(|job| filter.category_id.map_or(true, |id| job.category_id == id))
			.filter(|job| {
				filter
					.company_ids
					.as_ref()
					.map_or(true, |ids| ids.contains(&job.company_id))
			})
			.filter(|job| {
				filter
					.location
					.as_deref()
					.map_or(true, |location| contains_ignore_case(&job.location, location))
			})
			.filter(|job| {
				filter
					.title
					.as_deref()
					.map_or(true, |title| contains_ignore_case(&job.title, title))
			})
			.filter(|job| filter.salary_range.map_or(true, |range| job.salary_range == range))
			.filter(|job| filter.job_type.map_or(true, |job_type| job.job_type == job_type))
			.filter(|job| {
				filter
					.experience_level
					.map_or(true, |level| job.experience_level == level)
			})
			.map(|job| tables.with_count(job))
			.collect::<Vec<_>>();

		Ok(newest_first(&jobs, |job| job.created_at))
	}

	async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
		let tables = self.tables.read().await;

		Ok(tables
			.jobs
			.iter()
			.find(|job| job.id == id)
			.map(|job| tables.with_count(job)))
	}

	async fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
		self.tables.write().await.jobs.push(job.clone());

		Ok(())
	}

	async fn update_job(&self, job: &Job) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if let Some(existing) = tables.jobs.iter_mut().find(|existing| existing.id == job.id) {
			*existing = job.clone();
		}

		Ok(())
	}

	async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError> {
		let mut tables = self.tables.write().await;
		let before = tables.jobs.len();

		tables.jobs.retain(|job| job.id != id);
		tables.applications.retain(|application| application.job_id != id);

		Ok(tables.jobs.len() != before)
	}

	async fn add_application(&self, application: &Application) -> Result<(), StoreError> {
		let mut tables = self.tables.write().await;

		if tables.applications.iter().any(|existing| {
			existing.job_id == application.job_id && existing.user_id == application.user_id
		}) {
			return Err(StoreError::Conflict("application"));
		}

		tables.applications.push(application.clone());

		Ok(())
	}

	async fn list_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
		let tables = self.tables.read().await;
		let mut applications = tables
			.applications
			.iter()
			.filter(|application| application.job_id == job_id)
			.cloned()
			.collect::<Vec<_>>();
		applications.sort_by_key(|application| application.applied_at);

		Ok(applications)
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;
	use crate::route::auth::model::Role;

	fn user(email: &str) -> User {
		User {
			id: Uuid::new_v4(),
			email: email.into(),
			password: Vec::new(),
			role: Role::Applicant,
			is_verified: false,
			reset_token: None,
			reset_token_expiry: None,
			created_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn test_email_is_unique_with_case() {
		let store = MemoryStore::new();

		store.insert_account(&user("a@b.com"), None).await.unwrap();
		store.insert_account(&user("A@B.com"), None).await.unwrap();

		assert!(matches!(
			store.insert_account(&user("a@b.com"), None).await,
			Err(StoreError::Conflict("email"))
		));
		assert_eq!(
			store.find_user_by_email("A@B.com").await.unwrap().unwrap().email,
			"A@B.com"
		);
		assert!(store.find_user_by_email("A@b.com").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_reset_token_is_single_use() {
		let store = MemoryStore::new();
		let user = user("a@b.com");
		let now = Utc::now();

		store.insert_account(&user, None).await.unwrap();
		store
			.set_reset_token(user.id, Some("digest"), Some(now + Duration::minutes(10)))
			.await
			.unwrap();

		assert!(store.consume_reset_token(user.id, "digest", now, b"new").await.unwrap());
		assert!(!store.consume_reset_token(user.id, "digest", now, b"newer").await.unwrap());
		assert_eq!(store.find_user(user.id).await.unwrap().unwrap().password, b"new");
	}

	#[tokio::test]
	async fn test_expired_reset_token_is_ignored() {
		let store = MemoryStore::new();
		let user = user("a@b.com");
		let now = Utc::now();

		store.insert_account(&user, None).await.unwrap();
		store
			.set_reset_token(user.id, Some("digest"), Some(now - Duration::seconds(1)))
			.await
			.unwrap();

		assert!(store.find_user_by_reset_token("digest", now).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_search_category_takes_first_by_name() {
		let store = MemoryStore::new();

		for name in ["Fullstack", "Backend", "Frontend"] {
			store.insert_category(&Category::new(name)).await.unwrap();
		}

		let found = store.search_category("END").await.unwrap().unwrap();
		assert_eq!(found.name, "Backend");

		assert!(store.search_category("design").await.unwrap().is_none());
	}
}
