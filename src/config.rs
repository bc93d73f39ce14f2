use std::{path::PathBuf, str::FromStr};

use chrono::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} is invalid: {value}")]
	Invalid { name: &'static str, value: String },
}

/// SMTP relay settings. Mail is only delivered when a host is set.
#[derive(Clone)]
pub struct Smtp {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
}

/// The sender shown on outgoing email.
#[derive(Clone)]
pub struct Sender {
	pub name: String,
	pub address: String,
}

/// An administrator account created at startup if it does not exist.
#[derive(Clone)]
pub struct Admin {
	pub email: String,
	pub password: String,
}

/// Runtime configuration, read from the environment.
#[derive(Clone)]
pub struct Config {
	pub host: String,
	pub port: u16,
	/// Without a database URL, data is kept in memory.
	pub database_url: Option<String>,
	pub jwt_secret: String,
	pub jwt_expiry: Duration,
	/// The front-end origin. Password reset links point here.
	pub client_url: String,
	pub upload_dir: PathBuf,
	pub smtp: Option<Smtp>,
	pub sender: Sender,
	pub admin: Option<Admin>,
	pub rate_limit: bool,
	pub otel_export: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from any key-value source.
	///
	/// Empty values are treated the same as missing ones.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

		let smtp = match get("EMAIL_HOST") {
			Some(host) => Some(Smtp {
				host,
				port: parse(&get, "EMAIL_PORT", 587)?,
				username: get("EMAIL_USER"),
				password: get("EMAIL_PASS"),
			}),
			None => None,
		};

		let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
			(Some(email), Some(password)) => Some(Admin { email, password }),
			_ => None,
		};

		Ok(Self {
			host: get("HOST").unwrap_or_else(|| "127.0.0.1".into()),
			port: parse(&get, "PORT", 5000)?,
			database_url: get("DATABASE_URL"),
			jwt_secret: get("JWT_SECRET").ok_or(Error::Missing("JWT_SECRET"))?,
			jwt_expiry: Duration::seconds(parse(&get, "JWT_EXPIRY_SECS", 3600)?),
			client_url: get("CLIENT_URL")
				.unwrap_or_else(|| "http://localhost:3000".into())
				.trim_end_matches('/')
				.to_owned(),
			upload_dir: get("UPLOAD_DIR").map_or_else(|| PathBuf::from("uploads"), PathBuf::from),
			sender: Sender {
				name: get("EMAIL_FROM_NAME").unwrap_or_else(|| "Job Board".into()),
				address: get("EMAIL_FROM")
					.unwrap_or_else(|| "noreply@localhost".into()),
			},
			smtp,
			admin,
			rate_limit: parse(&get, "RATE_LIMIT", true)?,
			otel_export: parse(&get, "OTEL_EXPORT", false)?,
		})
	}
}

fn parse<T: FromStr>(
	get: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	default: T,
) -> Result<T, Error> {
	match get(name) {
		None => Ok(default),
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| Error::Invalid { name, value }),
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(pairs: &[(&str, &str)]) -> Result<Config, Error> {
		let map = pairs
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|key| map.get(key).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[("JWT_SECRET", "secret")]).unwrap();

		assert_eq!(config.port, 5000);
		assert_eq!(config.jwt_expiry, Duration::hours(1));
		assert!(config.database_url.is_none());
		assert!(config.smtp.is_none());
		assert!(config.rate_limit);
	}

	#[test]
	fn test_secret_is_required() {
		assert!(matches!(config(&[]), Err(Error::Missing("JWT_SECRET"))));
		assert!(matches!(
			config(&[("JWT_SECRET", "  ")]),
			Err(Error::Missing("JWT_SECRET"))
		));
	}

	#[test]
	fn test_invalid_port() {
		assert!(matches!(
			config(&[("JWT_SECRET", "s"), ("PORT", "http")]),
			Err(Error::Invalid { name: "PORT", .. })
		));
	}

	#[test]
	fn test_smtp_needs_host() {
		let without = config(&[("JWT_SECRET", "s"), ("EMAIL_USER", "user")]).unwrap();
		assert!(without.smtp.is_none());

		let with = config(&[
			("JWT_SECRET", "s"),
			("EMAIL_HOST", "smtp.example.com"),
			("EMAIL_USER", "user"),
			("CLIENT_URL", "https://jobs.example.com/"),
		])
		.unwrap();

		let smtp = with.smtp.unwrap();
		assert_eq!(smtp.port, 587);
		assert_eq!(smtp.username.as_deref(), Some("user"));
		assert!(smtp.password.is_none());
		assert_eq!(with.client_url, "https://jobs.example.com");
	}
}
