use std::path::{Component, Path, PathBuf};

use axum::{body::Bytes, http::StatusCode};
use uuid::Uuid;

use crate::error;

/// The URL prefix that stored files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// The logo every company starts with. It is never deleted from storage.
pub const DEFAULT_LOGO_URL: &str = "https://via.placeholder.com/150";

const MIB: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unexpected file field `{0}`")]
	UnexpectedField(String),
	#[error("only {allowed} files are allowed for {field}")]
	UnsupportedType {
		field: &'static str,
		allowed: &'static str,
	},
	#[error("{field} must not be larger than {limit} bytes")]
	TooLarge { field: &'static str, limit: usize },
	#[error("file storage failed: {0}")]
	Io(#[from] std::io::Error),
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnexpectedField(..) | Self::UnsupportedType { .. } | Self::TooLarge { .. } => {
				StatusCode::BAD_REQUEST
			}
			Self::Io(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnexpectedField(field) => error::Message::new(self.to_string())
				.field(field.as_str())
				.into_vec(),
			Self::UnsupportedType { field, .. } | Self::TooLarge { field, .. } => {
				error::Message::new(self.to_string()).field(*field).into_vec()
			}
			Self::Io(..) => error::Message::new("internal server error").into_vec(),
		}
	}
}

/// A file part received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
	/// The name of the form field the file was sent in.
	pub field: String,
	/// The client-side file name, used only for its extension.
	pub file_name: String,
	pub content_type: String,
	pub bytes: Bytes,
}

/// The kinds of files the service stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	Resume,
	ProfilePicture,
	CompanyLogo,
}

impl Kind {
	/// The form field the file is expected in.
	pub fn field(self) -> &'static str {
		match self {
			Self::Resume => "resume",
			Self::ProfilePicture => "profilePicture",
			Self::CompanyLogo => "logo",
		}
	}

	fn directory(self) -> &'static str {
		match self {
			Self::Resume => "resumes",
			Self::ProfilePicture => "profilePictures",
			Self::CompanyLogo => "companyLogos",
		}
	}

	fn max_size(self) -> usize {
		match self {
			Self::Resume | Self::ProfilePicture => 5 * MIB,
			Self::CompanyLogo => 2 * MIB,
		}
	}

	fn content_types(self) -> &'static [&'static str] {
		match self {
			Self::Resume => &[
				"application/pdf",
				"application/msword",
				"application/vnd.openxmlformats-officedocument.wordprocessingml.document",
			],
			Self::ProfilePicture | Self::CompanyLogo => &["image/jpeg", "image/png", "image/gif"],
		}
	}

	fn allowed(self) -> &'static str {
		match self {
			Self::Resume => "PDF, DOC and DOCX",
			Self::ProfilePicture | Self::CompanyLogo => "JPEG, PNG and GIF",
		}
	}

	/// Checks the content type and size of a file against this kind's rules.
	pub fn check(self, file: &UploadedFile) -> Result<(), Error> {
		if !self.content_types().contains(&file.content_type.as_str()) {
			return Err(Error::UnsupportedType {
				field: self.field(),
				allowed: self.allowed(),
			});
		}

		if file.bytes.len() > self.max_size() {
			return Err(Error::TooLarge {
				field: self.field(),
				limit: self.max_size(),
			});
		}

		Ok(())
	}
}

/// Matches uploaded files to the kinds an endpoint accepts.
///
/// Every file must be sent in the field of one of `kinds` and pass its checks.
/// When a field is repeated, the last file wins.
pub fn classify(files: Vec<UploadedFile>, kinds: &[Kind]) -> Result<Vec<(Kind, UploadedFile)>, Error> {
	let mut accepted: Vec<(Kind, UploadedFile)> = Vec::with_capacity(files.len());

	for file in files {
		let kind = kinds
			.iter()
			.copied()
			.find(|kind| kind.field() == file.field)
			.ok_or_else(|| Error::UnexpectedField(file.field.clone()))?;

		kind.check(&file)?;

		accepted.retain(|(existing, _)| *existing != kind);
		accepted.push((kind, file));
	}

	Ok(accepted)
}

/// Stores uploaded files on the local filesystem.
#[derive(Debug, Clone)]
pub struct Storage {
	root: PathBuf,
}

impl Storage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Creates the directory for every kind of file.
	pub async fn prepare(&self) -> std::io::Result<()> {
		for kind in [Kind::Resume, Kind::ProfilePicture, Kind::CompanyLogo] {
			tokio::fs::create_dir_all(self.root.join(kind.directory())).await?;
		}

		Ok(())
	}

	/// Writes the file under a collision-free name and returns its public path.
	///
	/// The stored name is a fresh UUID followed by the original extension.
	pub async fn save(&self, kind: Kind, file: &UploadedFile) -> Result<String, Error> {
		let extension = Path::new(&file.file_name)
			.extension()
			.and_then(|extension| extension.to_str())
			.map(|extension| format!(".{extension}"))
			.unwrap_or_default();
		let name = format!("{}{extension}", Uuid::new_v4());

		let directory = self.root.join(kind.directory());
		tokio::fs::create_dir_all(&directory).await?;
		tokio::fs::write(directory.join(&name), &file.bytes).await?;

		tracing::debug!(kind = kind.field(), %name, "stored upload");

		Ok(format!("{PUBLIC_PREFIX}/{}/{name}", kind.directory()))
	}

	/// Deletes a previously stored file.
	///
	/// Paths outside of the upload directory, such as the default logo,
	/// are left alone. Failures are logged and otherwise ignored.
	pub async fn remove(&self, public_path: &str) {
		let Some(path) = self.resolve(public_path) else {
			return;
		};

		if let Err(error) = tokio::fs::remove_file(&path).await {
			tracing::warn!(path = %path.display(), %error, "failed to delete stored file");
		}
	}

	fn resolve(&self, public_path: &str) -> Option<PathBuf> {
		let relative = Path::new(public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?);

		relative
			.components()
			.all(|component| matches!(component, Component::Normal(..)))
			.then(|| self.root.join(relative))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn file(field: &str, content_type: &str, size: usize) -> UploadedFile {
		UploadedFile {
			field: field.into(),
			file_name: "cv.pdf".into(),
			content_type: content_type.into(),
			bytes: Bytes::from(vec![0; size]),
		}
	}

	#[test]
	fn test_logo_limit_is_smaller() {
		let logo = file("logo", "image/png", 3 * MIB);

		assert!(Kind::ProfilePicture.check(&logo).is_ok());
		assert!(matches!(
			Kind::CompanyLogo.check(&logo),
			Err(Error::TooLarge { field: "logo", .. })
		));
	}

	#[test]
	fn test_resume_rejects_images() {
		assert!(matches!(
			Kind::Resume.check(&file("resume", "image/png", 10)),
			Err(Error::UnsupportedType { .. })
		));
	}

	#[test]
	fn test_classify_rejects_unknown_fields() {
		let files = vec![file("avatar", "image/png", 10)];

		assert!(matches!(
			classify(files, &[Kind::ProfilePicture]),
			Err(Error::UnexpectedField(field)) if field == "avatar"
		));
	}

	#[test]
	fn test_resolve_stays_inside_root() {
		let storage = Storage::new("/srv/uploads");

		assert_eq!(
			storage.resolve("/uploads/resumes/a.pdf"),
			Some(PathBuf::from("/srv/uploads/resumes/a.pdf"))
		);
		assert_eq!(storage.resolve("/uploads/../etc/passwd"), None);
		assert_eq!(storage.resolve(DEFAULT_LOGO_URL), None);
	}

	#[tokio::test]
	async fn test_save_and_remove() {
		let dir = tempfile::tempdir().unwrap();
		let storage = Storage::new(dir.path());

		let path = storage
			.save(Kind::Resume, &file("resume", "application/pdf", 4))
			.await
			.unwrap();

		assert!(path.starts_with("/uploads/resumes/"));
		assert!(path.ends_with(".pdf"));

		let on_disk = storage.resolve(&path).unwrap();
		assert!(on_disk.exists());

		storage.remove(&path).await;
		assert!(!on_disk.exists());
	}
}
