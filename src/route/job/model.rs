use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::{
	applicant::model::{Education, Experience},
	category::model::CategoryRef,
	auth::model::Role,
};

/// Implements the string conversions for an enum stored by its display label.
macro_rules! labelled {
	($name:ident { $($variant:ident => $label:literal),* $(,)? }) => {
		impl $name {
			pub const ALL: &'static [Self] = &[$(Self::$variant),*];

			pub fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label),*
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $name {
			type Err = String;

			fn from_str(value: &str) -> Result<Self, Self::Err> {
				match value {
					$($label => Ok(Self::$variant),)*
					_ => Err(format!("unknown {} `{value}`", stringify!($name))),
				}
			}
		}
	};
}

/// The salary band of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SalaryRange {
	#[serde(rename = "1-500 AZN")]
	UpTo500,
	#[serde(rename = "501-1000 AZN")]
	UpTo1000,
	#[serde(rename = "1001-2000 AZN")]
	UpTo2000,
	#[serde(rename = "2001-3000 AZN")]
	UpTo3000,
	#[serde(rename = "3000+ AZN")]
	Over3000,
	/// The salary is agreed with the candidate.
	#[default]
	#[serde(rename = "Müzakirə yolu ilə")]
	Negotiable,
}

labelled!(SalaryRange {
	UpTo500 => "1-500 AZN",
	UpTo1000 => "501-1000 AZN",
	UpTo2000 => "1001-2000 AZN",
	UpTo3000 => "2001-3000 AZN",
	Over3000 => "3000+ AZN",
	Negotiable => "Müzakirə yolu ilə",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum JobType {
	#[default]
	#[serde(rename = "Tam İş Günü")]
	FullTime,
	#[serde(rename = "Yarım İş Günü")]
	PartTime,
	#[serde(rename = "Freelance")]
	Freelance,
	#[serde(rename = "Müvəqqəti")]
	Temporary,
	#[serde(rename = "Praktika")]
	Internship,
}

labelled!(JobType {
	FullTime => "Tam İş Günü",
	PartTime => "Yarım İş Günü",
	Freelance => "Freelance",
	Temporary => "Müvəqqəti",
	Internship => "Praktika",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ExperienceLevel {
	#[default]
	#[serde(rename = "Təcrübəsiz")]
	Entry,
	#[serde(rename = "Junior")]
	Junior,
	#[serde(rename = "Mid-Level")]
	MidLevel,
	#[serde(rename = "Senior")]
	Senior,
	#[serde(rename = "Müdir")]
	Manager,
}

labelled!(ExperienceLevel {
	Entry => "Təcrübəsiz",
	Junior => "Junior",
	MidLevel => "Mid-Level",
	Senior => "Senior",
	Manager => "Müdir",
});

/// The last day to apply. Accepts a calendar date or an RFC 3339 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Deadline(pub DateTime<Utc>);

impl<'de> Deserialize<'de> for Deadline {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let text = String::deserialize(deserializer)?;
		let text = text.trim();

		DateTime::parse_from_rfc3339(text)
			.map(|time| time.with_timezone(&Utc))
			.or_else(|_| {
				NaiveDate::parse_from_str(text, "%Y-%m-%d")
					.map(|date| date.and_time(NaiveTime::MIN).and_utc())
			})
			.map(Self)
			.map_err(serde::de::Error::custom)
	}
}

/// A job posted by a company.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Job {
	/// The unique identifier of the job.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	#[validate(length(min = 1, max = 100, message = "title must be between 1 and 100 characters"))]
	pub title: String,
	#[validate(length(min = 50, message = "description must be at least 50 characters"))]
	pub description: String,
	/// The company that posted the job. Never taken from the request.
	#[serde(skip_deserializing)]
	pub company_id: Uuid,
	#[serde(alias = "category")]
	pub category_id: Uuid,
	#[validate(length(min = 1, message = "location is required"))]
	pub location: String,
	#[serde(default)]
	pub salary_range: SalaryRange,
	#[serde(default)]
	pub job_type: JobType,
	#[serde(default)]
	pub experience_level: ExperienceLevel,
	pub application_deadline: Deadline,
	/// The number of applications received.
	#[serde(skip_deserializing)]
	pub applicant_count: i64,
	/// The creation time of the job.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

impl Job {
	pub fn new(company_id: Uuid, input: CreateJob) -> Self {
		Self {
			id: Uuid::new_v4(),
			title: input.title.trim().to_owned(),
			description: input.description,
			company_id,
			category_id: input.category_id,
			location: input.location.trim().to_owned(),
			salary_range: input.salary_range,
			job_type: input.job_type,
			experience_level: input.experience_level,
			application_deadline: input.application_deadline,
			applicant_count: 0,
			created_at: Utc::now(),
		}
	}

	/// Applies the fields that are set. The owning company cannot change.
	pub fn apply(&mut self, update: UpdateJob) {
		if let Some(title) = update.title {
			self.title = title.trim().to_owned();
		}
		if let Some(description) = update.description {
			self.description = description;
		}
		if let Some(category_id) = update.category_id {
			self.category_id = category_id;
		}
		if let Some(location) = update.location {
			self.location = location.trim().to_owned();
		}
		if let Some(salary_range) = update.salary_range {
			self.salary_range = salary_range;
		}
		if let Some(job_type) = update.job_type {
			self.job_type = job_type;
		}
		if let Some(experience_level) = update.experience_level {
			self.experience_level = experience_level;
		}
		if let Some(deadline) = update.application_deadline {
			self.application_deadline = deadline;
		}
	}
}

/// A job along with its company and category.
///
/// Either relation is null when the referenced record no longer exists.
#[derive(Debug, Serialize, JsonSchema)]
pub struct JobView<C> {
	#[serde(flatten)]
	pub job: Job,
	pub company: Option<C>,
	pub category: Option<CategoryRef>,
}

/// Query string filters for listing jobs. Empty values are ignored.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
	/// Part of a category name.
	pub category: Option<String>,
	pub location: Option<String>,
	pub salary_range: Option<String>,
	pub job_type: Option<String>,
	pub experience_level: Option<String>,
	/// Part of a company name.
	pub company_name: Option<String>,
	pub title: Option<String>,
}

/// An application to a job, holding the resume as it was when applying.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
	pub job_id: Uuid,
	pub user_id: Uuid,
	pub resume: Option<String>,
	pub applied_at: DateTime<Utc>,
}

/// An application with the applicant's account and profile details.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantDetails {
	/// The applicant's account id.
	pub id: Uuid,
	pub email: String,
	pub role: Role,
	pub first_name: String,
	pub last_name: String,
	/// The name of the applicant's category.
	pub category: Option<String>,
	pub years_of_experience: i32,
	pub phone: Option<String>,
	pub about: Option<String>,
	pub education: Vec<Education>,
	pub experience: Vec<Experience>,
	pub skills: Vec<String>,
	/// The resume submitted with the application.
	pub resume: Option<String>,
	pub profile_picture: Option<String>,
	pub applied_at: DateTime<Utc>,
}
