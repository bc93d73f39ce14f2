//! Shared helpers for the router tests.

use std::{path::PathBuf, sync::Arc};

use axum_test::{TestResponse, TestServer};
use chrono::Duration;
use tempfile::TempDir;

pub use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
pub use serde_json::{json, Value};
pub use uuid::Uuid;

pub use crate::route::auth::route::digest;
use crate::{
	config::{self, Config},
	mail::Outbox,
	route::{auth, category::model::Category},
	session, upload, Database, State,
};

pub const PASSWORD: &str = "hunter22";

const BOUNDARY: &str = "job-board-test-boundary";

pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Pulls the raw reset token out of a password reset email.
pub fn reset_token(html: &str) -> String {
	let (_, rest) = html.split_once("/reset-password/").unwrap();

	rest.chars().take_while(char::is_ascii_hexdigit).collect()
}

pub struct TestApp {
	pub server: TestServer,
	pub database: Database,
	pub outbox: Arc<Outbox>,
	pub uploads: Arc<upload::Storage>,
	pub keys: Arc<session::Keys>,
	_dir: TempDir,
}

/// Builds the full router over an in-memory store, an outbox mailer and a
/// temporary upload directory. Rate limiting is off.
pub async fn app() -> TestApp {
	let dir = TempDir::new().unwrap();
	let config = Config::from_lookup(|key| match key {
		"JWT_SECRET" => Some("test-secret".into()),
		"UPLOAD_DIR" => Some(dir.path().display().to_string()),
		_ => None,
	})
	.unwrap();

	let database: Database = Arc::new(crate::store::MemoryStore::new());
	let outbox = Arc::new(Outbox::default());
	let uploads = Arc::new(upload::Storage::new(dir.path()));
	let keys = Arc::new(session::Keys::new(b"test-secret", Duration::hours(1)));

	uploads.prepare().await.unwrap();

	let state = State {
		database: database.clone(),
		hasher: argon2::Argon2::default(),
		keys: keys.clone(),
		mailer: outbox.clone(),
		uploads: uploads.clone(),
		config: Arc::new(config),
	};

	TestApp {
		server: TestServer::new(crate::router(state, None)).unwrap(),
		database,
		outbox,
		uploads,
		keys,
		_dir: dir,
	}
}

impl TestApp {
	pub async fn category(&self, name: &str) -> Uuid {
		let category = Category::new(name);
		self.database.insert_category(&category).await.unwrap();

		category.id
	}

	/// Registers an applicant named "Test Applicant", returning its token and id.
	pub async fn applicant(&self, email: &str, category: Uuid) -> (String, Uuid) {
		self.register(json!({
			"email": email,
			"password": PASSWORD,
			"role": "applicant",
			"firstName": "Test",
			"lastName": "Applicant",
			"category": category,
		}))
		.await
	}

	/// Registers a company, returning its token and the account id.
	pub async fn company(&self, email: &str, name: &str) -> (String, Uuid) {
		self.register(json!({
			"email": email,
			"password": PASSWORD,
			"role": "company",
			"companyName": name,
			"address": "Bakı",
		}))
		.await
	}

	pub async fn admin(&self, email: &str) -> (String, Uuid) {
		let admin = config::Admin {
			email: email.into(),
			password: PASSWORD.into(),
		};

		let id = auth::bootstrap_admin(&self.database, &argon2::Argon2::default(), &admin)
			.await
			.unwrap()
			.unwrap();

		(self.keys.issue(id).unwrap(), id)
	}

	async fn register(&self, body: Value) -> (String, Uuid) {
		let response = self.server.post("/auth/register").json(&body).await;

		assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());

		let body = response.json::<Value>();

		(
			body["token"].as_str().unwrap().to_owned(),
			body["id"].as_str().unwrap().parse().unwrap(),
		)
	}

	/// Sends a `multipart/form-data` PUT with text fields and
	/// `(field, file name, content type, bytes)` files.
	pub async fn upload(
		&self,
		path: &str,
		token: &str,
		fields: &[(&str, &str)],
		files: &[(&str, &str, &str, &[u8])],
	) -> TestResponse {
		let mut body = Vec::new();

		for (name, value) in fields {
			body.extend_from_slice(
				format!(
					"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
				)
				.as_bytes(),
			);
		}

		for (field, file_name, content_type, bytes) in files {
			body.extend_from_slice(
				format!(
					"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
				)
				.as_bytes(),
			);
			body.extend_from_slice(bytes);
			body.extend_from_slice(b"\r\n");
		}

		body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

		self.server
			.put(path)
			.add_header(AUTHORIZATION, bearer(token))
			.content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
			.bytes(body.into())
			.await
	}

	/// The location on disk of a stored upload's public path.
	pub fn stored(&self, public_path: &str) -> PathBuf {
		let relative = public_path
			.strip_prefix(upload::PUBLIC_PREFIX)
			.unwrap()
			.trim_start_matches('/');

		self.uploads.root().join(relative)
	}

	/// The number of files stored in one upload directory.
	pub fn stored_count(&self, directory: &str) -> usize {
		std::fs::read_dir(self.uploads.root().join(directory))
			.map(|entries| entries.count())
			.unwrap_or(0)
	}
}
