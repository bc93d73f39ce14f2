use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{contains_pattern, JobFilter, NewProfile, Store, StoreError};
use crate::route::{
	applicant::model::{ApplicantProfile, Education, Experience},
	auth::model::User,
	category::model::Category,
	company::model::Company,
	job::model::{Application, Deadline, Job},
};

/// Maps unique constraint violations to [`StoreError::Conflict`].
fn conflict(error: sqlx::Error) -> StoreError {
	if let sqlx::Error::Database(ref database) = error {
		let field = match database.constraint() {
			Some("user_email_key") => Some("email"),
			Some("company_company_name_key") => Some("companyName"),
			Some("category_name_key") => Some("name"),
			Some("application_pkey") => Some("application"),
			Some("applicant_profile_user_id_key" | "company_user_id_key") => Some("profile"),
			_ => None,
		};

		if let Some(field) = field {
			return StoreError::Conflict(field);
		}
	}

	StoreError::Database(error)
}

fn parse<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, StoreError> {
	value.parse().map_err(StoreError::Corrupt)
}

#[derive(FromRow)]
struct UserRow {
	id: Uuid,
	email: String,
	password: Vec<u8>,
	role: String,
	is_verified: bool,
	reset_token: Option<String>,
	reset_token_expiry: Option<DateTime<Utc>>,
	created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
	type Error = StoreError;

	fn try_from(row: UserRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			email: row.email,
			password: row.password,
			role: parse(&row.role)?,
			is_verified: row.is_verified,
			reset_token: row.reset_token,
			reset_token_expiry: row.reset_token_expiry,
			created_at: row.created_at,
		})
	}
}

#[derive(FromRow)]
struct ApplicantRow {
	id: Uuid,
	user_id: Uuid,
	first_name: String,
	last_name: String,
	phone: Option<String>,
	category_id: Uuid,
	years_of_experience: i32,
	about: Option<String>,
	education: Json<Vec<Education>>,
	experience: Json<Vec<Experience>>,
	skills: Vec<String>,
	resume: Option<String>,
	profile_picture: Option<String>,
	is_public: bool,
	created_at: DateTime<Utc>,
}

impl From<ApplicantRow> for ApplicantProfile {
	fn from(row: ApplicantRow) -> Self {
		Self {
			id: row.id,
			user_id: row.user_id,
			first_name: row.first_name,
			last_name: row.last_name,
			phone: row.phone,
			category_id: row.category_id,
			years_of_experience: row.years_of_experience,
			about: row.about,
			education: row.education.0,
			experience: row.experience.0,
			skills: row.skills,
			resume: row.resume,
			profile_picture: row.profile_picture,
			is_public: row.is_public,
			created_at: row.created_at,
		}
	}
}

#[derive(FromRow)]
struct CompanyRow {
	id: Uuid,
	user_id: Uuid,
	company_name: String,
	industry: Option<String>,
	description: Option<String>,
	address: String,
	website: Option<String>,
	phone: Option<String>,
	logo_url: String,
	established_year: Option<i32>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
	fn from(row: CompanyRow) -> Self {
		Self {
			id: row.id,
			user_id: row.user_id,
			company_name: row.company_name,
			industry: row.industry,
			description: row.description,
			address: row.address,
			website: row.website,
			phone: row.phone,
			logo_url: row.logo_url,
			established_year: row.established_year,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

#[derive(FromRow)]
struct CategoryRow {
	id: Uuid,
	name: String,
	created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
	fn from(row: CategoryRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			created_at: row.created_at,
		}
	}
}

#[derive(FromRow)]
struct JobRow {
	id: Uuid,
	title: String,
	description: String,
	company_id: Uuid,
	category_id: Uuid,
	location: String,
	salary_range: String,
	job_type: String,
	experience_level: String,
	application_deadline: DateTime<Utc>,
	applicant_count: i64,
	created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
	type Error = StoreError;

	fn try_from(row: JobRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			title: row.title,
			description: row.description,
			company_id: row.company_id,
			category_id: row.category_id,
			location: row.location,
			salary_range: parse(&row.salary_range)?,
			job_type: parse(&row.job_type)?,
			experience_level: parse(&row.experience_level)?,
			application_deadline: Deadline(row.application_deadline),
			applicant_count: row.applicant_count,
			created_at: row.created_at,
		})
	}
}

#[derive(FromRow)]
struct ApplicationRow {
	job_id: Uuid,
	user_id: Uuid,
	resume: Option<String>,
	applied_at: DateTime<Utc>,
}

impl From<ApplicationRow> for Application {
	fn from(row: ApplicationRow) -> Self {
		Self {
			job_id: row.job_id,
			user_id: row.user_id,
			resume: row.resume,
			applied_at: row.applied_at,
		}
	}
}

const JOB_SELECT: &str = r#"
	SELECT j.*, (SELECT COUNT(*) FROM application a WHERE a.job_id = j.id) AS applicant_count
	FROM job j
"#;

const SAVE_APPLICANT: &str = r#"
	INSERT INTO applicant_profile (
		id, user_id, first_name, last_name, phone, category_id, years_of_experience,
		about, education, experience, skills, resume, profile_picture, is_public, created_at
	)
	VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
	ON CONFLICT (user_id) DO UPDATE SET
		first_name = EXCLUDED.first_name,
		last_name = EXCLUDED.last_name,
		phone = EXCLUDED.phone,
		category_id = EXCLUDED.category_id,
		years_of_experience = EXCLUDED.years_of_experience,
		about = EXCLUDED.about,
		education = EXCLUDED.education,
		experience = EXCLUDED.experience,
		skills = EXCLUDED.skills,
		resume = EXCLUDED.resume,
		profile_picture = EXCLUDED.profile_picture,
		is_public = EXCLUDED.is_public
"#;

const SAVE_COMPANY: &str = r#"
	INSERT INTO company (
		id, user_id, company_name, industry, description, address, website,
		phone, logo_url, established_year, created_at, updated_at
	)
	VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
	ON CONFLICT (user_id) DO UPDATE SET
		company_name = EXCLUDED.company_name,
		industry = EXCLUDED.industry,
		description = EXCLUDED.description,
		address = EXCLUDED.address,
		website = EXCLUDED.website,
		phone = EXCLUDED.phone,
		logo_url = EXCLUDED.logo_url,
		established_year = EXCLUDED.established_year,
		updated_at = EXCLUDED.updated_at
"#;

fn save_applicant_query(profile: &ApplicantProfile) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
	sqlx::query(SAVE_APPLICANT)
		.bind(profile.id)
		.bind(profile.user_id)
		.bind(&profile.first_name)
		.bind(&profile.last_name)
		.bind(&profile.phone)
		.bind(profile.category_id)
		.bind(profile.years_of_experience)
		.bind(&profile.about)
		.bind(Json(&profile.education))
		.bind(Json(&profile.experience))
		.bind(&profile.skills)
		.bind(&profile.resume)
		.bind(&profile.profile_picture)
		.bind(profile.is_public)
		.bind(profile.created_at)
}

fn save_company_query(company: &Company) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
	sqlx::query(SAVE_COMPANY)
		.bind(company.id)
		.bind(company.user_id)
		.bind(&company.company_name)
		.bind(&company.industry)
		.bind(&company.description)
		.bind(&company.address)
		.bind(&company.website)
		.bind(&company.phone)
		.bind(&company.logo_url)
		.bind(company.established_year)
		.bind(company.created_at)
		.bind(company.updated_at)
}

/// Keeps data in Postgres.
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and applies pending migrations.
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;

		sqlx::migrate!("./migrations").run(&pool).await?;

		Ok(Self { pool })
	}
}

#[async_trait::async_trait]
impl Store for PgStore {
	async fn insert_account(&self, user: &User, profile: Option<&NewProfile>) -> Result<(), StoreError> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
				INSERT INTO "user" (id, email, password, role, is_verified, created_at)
				VALUES ($1, $2, $3, $4, $5, $6)
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.password)
		.bind(user.role.as_str())
		.bind(user.is_verified)
		.bind(user.created_at)
		.execute(&mut *tx)
		.await
		.map_err(conflict)?;

		match profile {
			Some(NewProfile::Applicant(applicant)) => {
				save_applicant_query(applicant)
					.execute(&mut *tx)
					.await
					.map_err(conflict)?;
			}
			Some(NewProfile::Company(company)) => {
				save_company_query(company)
					.execute(&mut *tx)
					.await
					.map_err(conflict)?;
			}
			None => {}
		}

		tx.commit().await?;

		Ok(())
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
		sqlx::query_as::<_, UserRow>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.map(User::try_from)
			.transpose()
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		sqlx::query_as::<_, UserRow>(r#"SELECT * FROM "user" WHERE email = $1"#)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?
			.map(User::try_from)
			.transpose()
	}

	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
		sqlx::query_as::<_, UserRow>(r#"SELECT * FROM "user" WHERE id = ANY($1)"#)
			.bind(ids)
			.fetch_all(&self.pool)
			.await?
			.into_iter()
			.map(User::try_from)
			.collect()
	}

	async fn list_users(&self) -> Result<Vec<User>, StoreError> {
		sqlx::query_as::<_, UserRow>(r#"SELECT * FROM "user" ORDER BY created_at"#)
			.fetch_all(&self.pool)
			.await?
			.into_iter()
			.map(User::try_from)
			.collect()
	}

	async fn update_user(&self, user: &User) -> Result<(), StoreError> {
		sqlx::query(
			r#"
				UPDATE "user"
				SET email = $2, password = $3, role = $4, is_verified = $5
				WHERE id = $1
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.password)
		.bind(user.role.as_str())
		.bind(user.is_verified)
		.execute(&self.pool)
		.await
		.map_err(conflict)?;

		Ok(())
	}

	async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
		// Profiles are removed by their foreign key cascade.
		let status = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn set_reset_token(
		&self,
		user_id: Uuid,
		digest: Option<&str>,
		expires_at: Option<DateTime<Utc>>,
	) -> Result<(), StoreError> {
		sqlx::query(r#"UPDATE "user" SET reset_token = $2, reset_token_expiry = $3 WHERE id = $1"#)
			.bind(user_id)
			.bind(digest)
			.bind(expires_at)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn find_user_by_reset_token(
		&self,
		digest: &str,
		now: DateTime<Utc>,
	) -> Result<Option<User>, StoreError> {
		sqlx::query_as::<_, UserRow>(
			r#"SELECT * FROM "user" WHERE reset_token = $1 AND reset_token_expiry > $2"#,
		)
		.bind(digest)
		.bind(now)
		.fetch_optional(&self.pool)
		.await?
		.map(User::try_from)
		.transpose()
	}

	async fn consume_reset_token(
		&self,
		user_id: Uuid,
		digest: &str,
		now: DateTime<Utc>,
		password: &[u8],
	) -> Result<bool, StoreError> {
		let status = sqlx::query(
			r#"
				UPDATE "user"
				SET password = $4, reset_token = NULL, reset_token_expiry = NULL
				WHERE id = $1 AND reset_token = $2 AND reset_token_expiry > $3
			"#,
		)
		.bind(user_id)
		.bind(digest)
		.bind(now)
		.bind(password)
		.execute(&self.pool)
		.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn find_applicant(&self, user_id: Uuid) -> Result<Option<ApplicantProfile>, StoreError> {
		let row = sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicant_profile WHERE user_id = $1")
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(ApplicantProfile::from))
	}

	async fn find_applicants(&self, user_ids: &[Uuid]) -> Result<Vec<ApplicantProfile>, StoreError> {
		let rows = sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicant_profile WHERE user_id = ANY($1)")
			.bind(user_ids)
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(ApplicantProfile::from).collect())
	}

	async fn list_applicants(&self, public_only: bool) -> Result<Vec<ApplicantProfile>, StoreError> {
		let rows = sqlx::query_as::<_, ApplicantRow>(
			r#"
				SELECT * FROM applicant_profile
				WHERE is_public OR NOT $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(public_only)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(ApplicantProfile::from).collect())
	}

	async fn save_applicant(&self, profile: &ApplicantProfile) -> Result<(), StoreError> {
		save_applicant_query(profile)
			.execute(&self.pool)
			.await
			.map_err(conflict)?;

		Ok(())
	}

	async fn delete_applicant(&self, user_id: Uuid) -> Result<bool, StoreError> {
		let status = sqlx::query("DELETE FROM applicant_profile WHERE user_id = $1")
			.bind(user_id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
		let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM company WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(Company::from))
	}

	async fn find_company_by_user(&self, user_id: Uuid) -> Result<Option<Company>, StoreError> {
		let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM company WHERE user_id = $1")
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(Company::from))
	}

	async fn find_companies(&self, ids: &[Uuid]) -> Result<Vec<Company>, StoreError> {
		let rows = sqlx::query_as::<_, CompanyRow>("SELECT * FROM company WHERE id = ANY($1)")
			.bind(ids)
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(Company::from).collect())
	}

	async fn list_companies(&self) -> Result<Vec<Company>, StoreError> {
		let rows = sqlx::query_as::<_, CompanyRow>("SELECT * FROM company ORDER BY created_at DESC")
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(Company::from).collect())
	}

	async fn search_company_ids(&self, name: &str) -> Result<Vec<Uuid>, StoreError> {
		let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM company WHERE company_name ILIKE $1")
			.bind(contains_pattern(name))
			.fetch_all(&self.pool)
			.await?;

		Ok(ids)
	}

	async fn save_company(&self, company: &Company) -> Result<(), StoreError> {
		save_company_query(company)
			.execute(&self.pool)
			.await
			.map_err(conflict)?;

		Ok(())
	}

	async fn delete_company(&self, user_id: Uuid) -> Result<bool, StoreError> {
		let status = sqlx::query("DELETE FROM company WHERE user_id = $1")
			.bind(user_id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
		let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM category ORDER BY name")
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(Category::from).collect())
	}

	async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
		let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM category WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.map(Category::from))
	}

	async fn find_categories(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError> {
		let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM category WHERE id = ANY($1)")
			.bind(ids)
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.into_iter().map(Category::from).collect())
	}

	async fn search_category(&self, name: &str) -> Result<Option<Category>, StoreError> {
		let row = sqlx::query_as::<_, CategoryRow>(
			"SELECT * FROM category WHERE name ILIKE $1 ORDER BY name LIMIT 1",
		)
		.bind(contains_pattern(name))
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(Category::from))
	}

	async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
		sqlx::query("INSERT INTO category (id, name, created_at) VALUES ($1, $2, $3)")
			.bind(category.id)
			.bind(&category.name)
			.bind(category.created_at)
			.execute(&self.pool)
			.await
			.map_err(conflict)?;

		Ok(())
	}

	async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
		let status = sqlx::query("DELETE FROM category WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
		let mut query = QueryBuilder::<Postgres>::new(JOB_SELECT);
		query.push(" WHERE TRUE");

		if let Some(category_id) = filter.category_id {
			query.push(" AND j.category_id = ").push_bind(category_id);
		}
		if let Some(company_ids) = &filter.company_ids {
			query.push(" AND j.company_id = ANY(").push_bind(company_ids.clone()).push(")");
		}
		if let Some(location) = &filter.location {
			query.push(" AND j.location ILIKE ").push_bind(contains_pattern(location));
		}
		if let Some(title) = &filter.title {
			query.push(" AND j.title ILIKE ").push_bind(contains_pattern(title));
		}
		if let Some(range) = filter.salary_range {
			query.push(" AND j.salary_range = ").push_bind(range.as_str());
		}
		if let Some(job_type) = filter.job_type {
			query.push(" AND j.job_type = ").push_bind(job_type.as_str());
		}
		if let Some(level) = filter.experience_level {
			query.push(" AND j.experience_level = ").push_bind(level.as_str());
		}

		query.push(" ORDER BY j.created_at DESC");

		query
			.build_query_as::<JobRow>()
			.fetch_all(&self.pool)
			.await?
			.into_iter()
			.map(Job::try_from)
			.collect()
	}

	async fn find_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
		sqlx::query_as::<_, JobRow>(&format!("{JOB_SELECT} WHERE j.id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.map(Job::try_from)
			.transpose()
	}

	async fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
		sqlx::query(
			r#"
				INSERT INTO job (
					id, title, description, company_id, category_id, location,
					salary_range, job_type, experience_level, application_deadline, created_at
				)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
			"#,
		)
		.bind(job.id)
		.bind(&job.title)
		.bind(&job.description)
		.bind(job.company_id)
		.bind(job.category_id)
		.bind(&job.location)
		.bind(job.salary_range.as_str())
		.bind(job.job_type.as_str())
		.bind(job.experience_level.as_str())
		.bind(job.application_deadline.0)
		.bind(job.created_at)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	async fn update_job(&self, job: &Job) -> Result<(), StoreError> {
		sqlx::query(
			r#"
				UPDATE job
				SET title = $2, description = $3, category_id = $4, location = $5,
					salary_range = $6, job_type = $7, experience_level = $8, application_deadline = $9
				WHERE id = $1
			"#,
		)
		.bind(job.id)
		.bind(&job.title)
		.bind(&job.description)
		.bind(job.category_id)
		.bind(&job.location)
		.bind(job.salary_range.as_str())
		.bind(job.job_type.as_str())
		.bind(job.experience_level.as_str())
		.bind(job.application_deadline.0)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	async fn delete_job(&self, id: Uuid) -> Result<bool, StoreError> {
		let status = sqlx::query("DELETE FROM job WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn add_application(&self, application: &Application) -> Result<(), StoreError> {
		sqlx::query("INSERT INTO application (job_id, user_id, resume, applied_at) VALUES ($1, $2, $3, $4)")
			.bind(application.job_id)
			.bind(application.user_id)
			.bind(&application.resume)
			.bind(application.applied_at)
			.execute(&self.pool)
			.await
			.map_err(conflict)?;

		Ok(())
	}

	async fn list_applications(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
		let rows = sqlx::query_as::<_, ApplicationRow>(
			"SELECT * FROM application WHERE job_id = $1 ORDER BY applied_at",
		)
		.bind(job_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(Application::from).collect())
	}
}
